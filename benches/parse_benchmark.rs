//! Benchmarks for quizbank extraction performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks measure the pipeline on synthetic documents of
//! increasing question counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quizbank::{ParseOptions, RawParagraph, RawRun, SequentialIds};

/// Creates a synthetic document with plain questions and, every fifth
/// question, a two-child group.
fn create_test_document(question_count: usize) -> Vec<RawParagraph> {
    let mut paragraphs = Vec::with_capacity(question_count * 6);

    for i in 0..question_count {
        if i % 5 == 4 {
            paragraphs.push(RawParagraph::text(format!(
                "[<sg>] Đoạn văn {} (CLO2): hệ quản trị cơ sở dữ liệu quản lý dữ liệu. [<egc>]",
                i
            )));
            for child in 1..=2 {
                paragraphs.push(RawParagraph::text(format!("(<{}>) Câu hỏi con {}?", child, child)));
                paragraphs.push(RawParagraph::new(vec![
                    RawRun::new("A. "),
                    RawRun::new("Đúng").underlined(),
                ]));
                paragraphs.push(RawParagraph::text("B. Sai"));
            }
            paragraphs.push(RawParagraph::text("[</sg>]"));
        } else {
            paragraphs.push(RawParagraph::text(format!(
                "Câu {}: Giá trị của $x^2 + {}$ khi x = 1? (CLO1)",
                i, i
            )));
            paragraphs.push(RawParagraph::text(format!("A. {}", i)));
            paragraphs.push(RawParagraph::new(vec![
                RawRun::new("B. "),
                RawRun::new(format!("{}", i + 1)).underlined(),
            ]));
            paragraphs.push(RawParagraph::text(format!("C. {}", i + 2)));
            paragraphs.push(RawParagraph::text(format!("D. {}", i + 3)));
            paragraphs.push(RawParagraph::text("[<br>]"));
        }
    }

    paragraphs
}

/// Benchmark full extraction at various sizes.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let ids = SequentialIds::new();

    for question_count in [10, 100, 500, 1000].iter() {
        let document = create_test_document(*question_count);

        group.throughput(Throughput::Elements(*question_count as u64));
        group.bench_with_input(
            BenchmarkId::new("questions", question_count),
            &document,
            |b, doc| {
                b.iter(|| {
                    let _ = quizbank::parse_paragraphs_with_ids(
                        black_box(doc),
                        &ParseOptions::default(),
                        &ids,
                    );
                });
            },
        );
    }

    group.finish();
}

/// Benchmark extraction with math span recovery.
fn bench_math_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("math_extraction");
    let ids = SequentialIds::new();
    let options = ParseOptions::new().with_math();

    for question_count in [10, 100, 500].iter() {
        let document = create_test_document(*question_count);

        group.bench_with_input(
            BenchmarkId::new("questions", question_count),
            &document,
            |b, doc| {
                b.iter(|| {
                    let _ = quizbank::parse_paragraphs_with_ids(black_box(doc), &options, &ids);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark batch parsing, parallel against sequential.
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let ids = SequentialIds::new();
    let documents: Vec<Vec<RawParagraph>> = (0..16).map(|_| create_test_document(100)).collect();

    for (name, options) in [
        ("parallel", ParseOptions::default()),
        ("sequential", ParseOptions::new().sequential()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| quizbank::parse_documents(black_box(&documents), &options, &ids));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extraction, bench_math_extraction, bench_batch);
criterion_main!(benches);

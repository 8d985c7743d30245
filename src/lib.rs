//! # quizbank
//!
//! Extracts structured exam questions from the formatted paragraph stream of
//! a rich-text document: single-choice, multi-choice, shared-stem groups and
//! fill-in-the-blank blocks, with correct options recovered from inline
//! formatting (underline, bold, emphasis markup).
//!
//! ## Pipeline
//!
//! 1. [`normalize`]: raw runs to canonical [`model::Paragraph`]s, math spans recovered
//! 2. [`segment`]: paragraphs to question blocks
//! 3. [`parser`]: block classification and structural parsing
//! 4. [`resolve`]: option correctness from formatting signals
//! 5. [`assemble`]: final [`Question`] values with identifiers
//!
//! ## Quick Start
//!
//! ```
//! use quizbank::{parse_paragraphs, ParseOptions, QuestionType, RawParagraph, RawRun};
//!
//! let paragraphs = vec![
//!     RawParagraph::text("Câu 1: 2+2=? (CLO1)"),
//!     RawParagraph::text("A. 3"),
//!     RawParagraph::new(vec![RawRun::new("B. "), RawRun::new("4").underlined()]),
//!     RawParagraph::text("C. 5"),
//! ];
//!
//! let report = parse_paragraphs(&paragraphs, &ParseOptions::default())?;
//! let question = &report.questions[0];
//! assert_eq!(question.question_type, QuestionType::SingleChoice);
//! assert_eq!(question.clo.as_deref(), Some("CLO1"));
//! assert!(question.answers[1].is_correct);
//! # Ok::<(), quizbank::Error>(())
//! ```
//!
//! The library emits `tracing` events but never installs a subscriber.

pub mod assemble;
pub mod error;
pub mod grammar;
pub mod math;
pub mod model;
pub mod normalize;
pub mod parse_options;
pub mod parser;
pub mod resolve;
pub mod segment;

// Re-exports
pub use assemble::{Assembler, IdGenerator, RandomIds, SequentialIds};
pub use error::{Error, Result};
pub use model::{
    Answer, MediaKind, MediaRef, ParseReport, ParseStats, Question, QuestionType, RawParagraph,
    RawRun, Warning, WarningKind,
};
pub use parse_options::ParseOptions;

use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Parses one document's paragraphs with random identifiers.
///
/// Blank paragraphs are filtered out before segmentation. Recoverable
/// problems are reported in [`ParseReport::warnings`]; the only hard failure
/// is a document without any text.
pub fn parse_paragraphs(paragraphs: &[RawParagraph], options: &ParseOptions) -> Result<ParseReport> {
    parse_paragraphs_with_ids(paragraphs, options, &RandomIds)
}

/// Parses one document's paragraphs, drawing identifiers from `ids`.
pub fn parse_paragraphs_with_ids(
    paragraphs: &[RawParagraph],
    options: &ParseOptions,
    ids: &dyn IdGenerator,
) -> Result<ParseReport> {
    let mut warnings = Vec::new();

    let normalized = normalize::normalize_document(paragraphs, options, &mut warnings);
    if normalized.is_empty() {
        return Err(Error::EmptyDocument);
    }

    let segmentation = segment::segment(&normalized, options, &mut warnings);
    debug!(
        paragraphs = normalized.len(),
        blocks = segmentation.blocks.len(),
        mode = ?segmentation.mode,
        "segmentation complete"
    );

    let assembler = Assembler::new(ids, options);
    let mut questions = Vec::with_capacity(segmentation.blocks.len());
    for (index, block) in segmentation.blocks.iter().enumerate() {
        if let Some(parsed) = parser::parse_block(index, block, options, &mut warnings) {
            questions.push(assembler.assemble(index, parsed, &mut warnings));
        }
    }

    let report = ParseReport::new(questions, warnings);
    info!(
        questions = report.stats.total,
        groups = report.stats.group + report.stats.fill_in_blank,
        children = report.stats.children,
        warnings = report.stats.warnings,
        "document parsed"
    );
    Ok(report)
}

/// Parses a document given as a JSON array of paragraphs.
///
/// # Example
///
/// ```
/// let json = r#"[
///     { "runs": [{ "text": "Which is a DBMS?" }] },
///     { "runs": [{ "text": "A. PostgreSQL", "bold": { "inherited": true } }] },
///     { "runs": [{ "text": "B. HTTP" }] }
/// ]"#;
/// let report = quizbank::parse_json(json, &quizbank::ParseOptions::default())?;
/// assert!(report.questions[0].answers[0].is_correct);
/// # Ok::<(), quizbank::Error>(())
/// ```
pub fn parse_json(json: &str, options: &ParseOptions) -> Result<ParseReport> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(Error::InvalidData(
            "expected a JSON array of paragraphs".into(),
        ));
    }
    let paragraphs: Vec<RawParagraph> = serde_json::from_value(value)?;
    parse_paragraphs(&paragraphs, options)
}

/// Parses plain text, one paragraph per line.
///
/// Without run formatting, correct options can only be marked with inline
/// emphasis such as `<u>..</u>` or `__..__`.
pub fn parse_text(text: &str, options: &ParseOptions) -> Result<ParseReport> {
    let paragraphs: Vec<RawParagraph> = text.lines().map(RawParagraph::text).collect();
    parse_paragraphs(&paragraphs, options)
}

/// Parses many documents, in parallel unless `options.parallel` is off.
///
/// Each document gets its own report; results keep the input order.
pub fn parse_documents(
    documents: &[Vec<RawParagraph>],
    options: &ParseOptions,
    ids: &dyn IdGenerator,
) -> Vec<Result<ParseReport>> {
    if options.parallel {
        documents
            .par_iter()
            .map(|doc| parse_paragraphs_with_ids(doc, options, ids))
            .collect()
    } else {
        documents
            .iter()
            .map(|doc| parse_paragraphs_with_ids(doc, options, ids))
            .collect()
    }
}

/// Builder for configuring and running question extraction.
///
/// # Example
///
/// ```
/// use quizbank::{QuizBank, SequentialIds};
///
/// let report = QuizBank::new()
///     .with_math()
///     .with_ids(SequentialIds::new())
///     .parse_text("Solve $x + 1 = 2$\nA. <u>$x = 1$</u>\nB. $x = 2$")?;
/// assert!(report.questions[0].has_math);
/// # Ok::<(), quizbank::Error>(())
/// ```
#[derive(Clone)]
pub struct QuizBank {
    options: ParseOptions,
    ids: Arc<dyn IdGenerator>,
}

impl Default for QuizBank {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizBank {
    /// Creates a builder with default options and random identifiers.
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            ids: Arc::new(RandomIds),
        }
    }

    /// Replaces all options.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables math span recovery.
    pub fn with_math(mut self) -> Self {
        self.options = self.options.with_math();
        self
    }

    /// Disables fill-in-blank classification.
    pub fn without_fill_in_blank(mut self) -> Self {
        self.options = self.options.without_fill_in_blank();
        self
    }

    /// Requires explicit markers for segmentation.
    pub fn without_heuristics(mut self) -> Self {
        self.options = self.options.without_heuristics();
        self
    }

    /// Accepts questions with no correct option silently.
    pub fn allow_unmarked(mut self) -> Self {
        self.options = self.options.allow_unmarked();
        self
    }

    /// Disables parallel processing of batches.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Uses the given identifier source.
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Returns the configured options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses one document's paragraphs.
    pub fn parse(&self, paragraphs: &[RawParagraph]) -> Result<ParseReport> {
        parse_paragraphs_with_ids(paragraphs, &self.options, self.ids.as_ref())
    }

    /// Parses a JSON array of paragraphs.
    pub fn parse_json(&self, json: &str) -> Result<ParseReport> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_array() {
            return Err(Error::InvalidData(
                "expected a JSON array of paragraphs".into(),
            ));
        }
        let paragraphs: Vec<RawParagraph> = serde_json::from_value(value)?;
        self.parse(&paragraphs)
    }

    /// Parses plain text, one paragraph per line.
    pub fn parse_text(&self, text: &str) -> Result<ParseReport> {
        let paragraphs: Vec<RawParagraph> = text.lines().map(RawParagraph::text).collect();
        self.parse(&paragraphs)
    }

    /// Parses many documents.
    pub fn parse_batch(&self, documents: &[Vec<RawParagraph>]) -> Vec<Result<ParseReport>> {
        parse_documents(documents, &self.options, self.ids.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{scan_structure, MARKERS};
    use std::collections::HashSet;

    fn lines(text: &str) -> Vec<RawParagraph> {
        text.lines().map(RawParagraph::text).collect()
    }

    fn all_questions(report: &ParseReport) -> Vec<&Question> {
        let mut out = Vec::new();
        for question in &report.questions {
            out.push(question);
            out.extend(question.child_questions.iter());
        }
        out
    }

    fn assert_marker_free(text: &str) {
        for (_, literal) in MARKERS {
            assert!(!text.contains(literal), "{:?} contains {}", text, literal);
        }
        assert!(scan_structure(text).is_empty(), "{:?} contains a marker", text);
    }

    #[test]
    fn test_end_to_end_single_choice() {
        let paragraphs = vec![
            RawParagraph::text("Câu 1: 2+2=? (CLO1)"),
            RawParagraph::text("A. 3"),
            RawParagraph::new(vec![RawRun::new("B. "), RawRun::new("4").underlined()]),
            RawParagraph::text("C. 5"),
            RawParagraph::text("D. 6"),
        ];
        let report = parse_paragraphs(&paragraphs, &ParseOptions::default()).unwrap();

        assert_eq!(report.questions.len(), 1);
        let q = &report.questions[0];
        assert_eq!(q.clo.as_deref(), Some("CLO1"));
        assert_eq!(q.content, "Câu 1: 2+2=?");
        assert_eq!(q.answers.len(), 4);
        let marks: Vec<bool> = q.answers.iter().map(|a| a.is_correct).collect();
        assert_eq!(marks, vec![false, true, false, false]);
        assert_eq!(q.question_type, QuestionType::SingleChoice);
        assert!(report.is_clean());
    }

    #[test]
    fn test_type_inference() {
        let single = parse_text(
            "[<br>]\nQ?\nA. <u>a</u>\nB. b\nC. c\nD. d",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(single.questions[0].question_type, QuestionType::SingleChoice);

        let multi = parse_text(
            "Q?\nA. <u>a</u>\nB. __b__\nC. c\nD. d",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(multi.questions[0].question_type, QuestionType::MultiChoice);
        assert_eq!(multi.questions[0].correct_count(), 2);
        assert_eq!(multi.questions[0].answers[1].content, "b");
    }

    #[test]
    fn test_group_child_count() {
        for n in 1..=5u32 {
            let mut text = String::from("[<sg>] Read the passage. [<egc>]\n");
            for i in 1..=n {
                text.push_str(&format!("(<{}>) Question {}?\nA. <u>yes</u>\nB. no\n[<br>]\n", i, i));
            }
            text.push_str("[</sg>]\n");

            let report = parse_text(&text, &ParseOptions::default()).unwrap();
            assert_eq!(report.questions.len(), 1);
            let group = &report.questions[0];
            assert_eq!(group.question_type, QuestionType::Group);
            assert!(group.is_parent());
            assert_eq!(group.child_questions.len(), n as usize);
            assert!(group.answers.is_empty());
            assert_eq!(group.group_content.as_deref(), Some("Read the passage."));
            assert!(report.is_clean(), "{:?}", report.warnings);
        }
    }

    #[test]
    fn test_marker_stripping() {
        let text = "\
(DON) Câu 1: What is SQL? (CLO1)
A. <u>A query language</u>
B. A database
[<br>]
(NHOM)
Read the passage (CLO2)
[<sg>] SQL runs on [image: db.png] servers. [<egc>]
(<1>) Who runs SQL?
A. <b>Servers</b>
B. Clients [<br>]
(NHOM – 2) Where?
A. __Here__
B. There
[</sg>]
(DIENKHUYET)
[<sg>] A {<1>}_____ stores rows. [<egc>]
(DIENKHUYET – 1) A. <u>table</u>
B. view
(KETTHUCDIENKHUYET)
===
Last question?
A. <u>x</u>
B. y";
        let report = parse_text(text, &ParseOptions::default()).unwrap();
        assert_eq!(report.questions.len(), 4);

        for question in all_questions(&report) {
            assert_marker_free(&question.content);
            if let Some(stem) = &question.group_content {
                assert_marker_free(stem);
            }
            for answer in &question.answers {
                assert_marker_free(&answer.content);
            }
            assert!(!question.content.contains("CLO"));
        }

        let types: Vec<QuestionType> = report.questions.iter().map(|q| q.question_type).collect();
        assert_eq!(
            types,
            vec![
                QuestionType::SingleChoice,
                QuestionType::Group,
                QuestionType::FillInBlank,
                QuestionType::SingleChoice,
            ]
        );

        let group = &report.questions[1];
        assert_eq!(group.content, "Read the passage");
        assert_eq!(group.media.len(), 1);
        assert_eq!(group.child_questions[1].number, Some(2));
        assert_eq!(group.child_questions[1].clo.as_deref(), Some("CLO2"));
        assert!(group.child_questions[1].answers[0].is_correct);

        let fill = &report.questions[2];
        assert_eq!(fill.blanks, vec![1]);
        assert_eq!(report.stats.fill_in_blank, 1);
        assert_eq!(report.stats.children, 3);
    }

    #[test]
    fn test_math_round_trip_pipeline() {
        let paragraphs = vec![
            RawParagraph::new(vec![RawRun::new("f(x) = $x^2"), RawRun::new(" + 1$. f(1)?")]),
            RawParagraph::text("A. 1"),
            RawParagraph::new(vec![RawRun::new("B. "), RawRun::new("2").underlined()]),
        ];

        let report = parse_paragraphs(&paragraphs, &ParseOptions::new().with_math()).unwrap();
        let q = &report.questions[0];
        assert!(q.has_math);
        assert_eq!(q.content, "f(x) = $x^2 + 1$. f(1)?");
        assert!(q.answers[1].is_correct);

        let plain = parse_paragraphs(&paragraphs, &ParseOptions::default()).unwrap();
        assert!(!plain.questions[0].has_math);
        assert_eq!(plain.questions[0].content, q.content);
    }

    #[test]
    fn test_unterminated_group_recovers() {
        let text = "[<sg>] Stem [<egc>]\n(<1>) Q1?\nA. <u>x</u>\n(DON) Next?\nA. <u>y</u>";
        let report = parse_text(text, &ParseOptions::default()).unwrap();
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.warnings_of(WarningKind::UnterminatedGroup).count(), 1);
        assert_eq!(report.questions[1].content, "Next?");
    }

    #[test]
    fn test_group_of_empty_children_falls_back_clean() {
        let report = parse_text("[<sg>] Stem [<egc>]\n(<1>)\n(<2>)\n[</sg>]", &ParseOptions::default()).unwrap();
        assert_eq!(report.questions.len(), 1);
        let q = &report.questions[0];
        assert_eq!(q.question_type, QuestionType::SingleChoice);
        assert!(!q.is_parent());
        assert_eq!(q.content, "Stem");
        assert_marker_free(&q.content);
        assert_eq!(report.warnings_of(WarningKind::EmptyGroup).count(), 1);
    }

    #[test]
    fn test_heuristic_start_with_mark_split_across_runs() {
        let paragraphs = vec![
            RawParagraph::new(vec![RawRun::new("Ca"), RawRun::new("\u{0302}u 1: first?")]),
            RawParagraph::text("A. <u>x</u>"),
            RawParagraph::text("Câu 2: second?"),
            RawParagraph::text("A. <u>y</u>"),
        ];
        let report = parse_paragraphs(&paragraphs, &ParseOptions::default()).unwrap();
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.questions[0].content, "Câu 1: first?");
        assert_eq!(report.warnings_of(WarningKind::OrphanContent).count(), 0);
    }

    #[test]
    fn test_zero_correct_reported() {
        let report = parse_text("Q?\nA. a\nB. b", &ParseOptions::default()).unwrap();
        assert_eq!(report.questions[0].question_type, QuestionType::SingleChoice);
        assert_eq!(report.warnings_of(WarningKind::NoCorrectAnswer).count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_heuristic_legacy_document() {
        let text = "1. First?\nA. <u>a</u>\nB. b\n2. Second?\nA. a\nB. <u>b</u>";
        let report = parse_text(text, &ParseOptions::default()).unwrap();
        assert_eq!(report.questions.len(), 2);
        assert!(report.questions[1].answers[1].is_correct);
    }

    #[test]
    fn test_empty_document() {
        let result = parse_paragraphs(&lines("  \n\n"), &ParseOptions::default());
        assert!(matches!(result, Err(Error::EmptyDocument)));
        assert!(matches!(
            parse_paragraphs(&[], &ParseOptions::default()),
            Err(Error::EmptyDocument)
        ));
    }

    #[test]
    fn test_parse_json_input() {
        let json = r#"[
            { "runs": [{ "text": "Capital of Vietnam?" }] },
            { "runs": [{ "text": "A. " }, { "text": "Hà Nội", "underline": { "element": true } }] },
            { "runs": [{ "text": "B. Huế" }] },
            { "runs": [] }
        ]"#;
        let report = parse_json(json, &ParseOptions::default()).unwrap();
        assert_eq!(report.questions[0].answers.len(), 2);
        assert!(report.questions[0].answers[0].is_correct);

        assert!(matches!(
            parse_json(r#"{ "runs": [] }"#, &ParseOptions::default()),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            parse_json("not json", &ParseOptions::default()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_output_json_shape() {
        let report = QuizBank::new()
            .with_ids(SequentialIds::new())
            .parse_text("[<sg>] Stem [<egc>]\n(<1>) Q?\nA. <u>x</u>\nB. y\n[</sg>]")
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.questions_json().unwrap()).unwrap();

        let group = &json[0];
        assert_eq!(group["type"], "group");
        assert_eq!(group["groupContent"], "Stem");
        assert!(group["answers"].as_array().unwrap().is_empty());
        let child = &group["childQuestions"][0];
        assert_eq!(child["type"], "single-choice");
        assert!(child["childQuestions"].as_array().unwrap().is_empty());
        assert_eq!(child["answers"][0]["isCorrect"], true);
        assert_eq!(child["answers"][1]["order"], 1);
        assert!(child["groupContent"].is_null());

        let full: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(full["stats"]["group"], 1);
    }

    #[test]
    fn test_parse_documents_batch() {
        let documents: Vec<Vec<RawParagraph>> = (0..8)
            .map(|i| lines(&format!("Question {}?\nA. <u>yes</u>\nB. no", i)))
            .chain(std::iter::once(Vec::new()))
            .collect();
        let ids = SequentialIds::new();

        for options in [ParseOptions::default(), ParseOptions::new().sequential()] {
            let results = parse_documents(&documents, &options, &ids);
            assert_eq!(results.len(), 9);
            assert!(matches!(results[8], Err(Error::EmptyDocument)));

            let mut seen = HashSet::new();
            for (i, result) in results[..8].iter().enumerate() {
                let report = result.as_ref().unwrap();
                assert_eq!(report.questions[0].content, format!("Question {}?", i));
                assert!(seen.insert(report.questions[0].id));
                for answer in &report.questions[0].answers {
                    assert!(seen.insert(answer.id));
                }
            }
        }
    }

    #[test]
    fn test_builder_options() {
        let bank = QuizBank::new()
            .with_math()
            .without_fill_in_blank()
            .without_heuristics()
            .allow_unmarked()
            .sequential();
        let options = bank.options();
        assert!(options.preserve_math);
        assert!(!options.detect_fill_in_blank);
        assert!(!options.heuristic_fallback);
        assert!(!options.warn_on_no_correct);
        assert!(!options.parallel);

        let report = bank
            .parse_text("(DIENKHUYET)\n[<sg>] A {<1>}_____ b [<egc>]\n(<1>) A. x\nB. y\n(KETTHUCDIENKHUYET)")
            .unwrap();
        assert_eq!(report.questions[0].question_type, QuestionType::Group);
        assert!(report.questions[0].blanks.is_empty());
    }
}

//! Run normalization.
//!
//! Turns the raw runs of one source paragraph into a [`Paragraph`]:
//! formatting signals are OR'd into flat flags, run text is NFC-normalized
//! and stripped of invisible control characters, and (when enabled) math
//! spans split across runs are recovered as single [`crate::model::MathSpan`]s.

use crate::math::MathScanner;
use crate::model::{Paragraph, RawParagraph, RawRun, Run, Warning, WarningKind};
use crate::parse_options::ParseOptions;
use tracing::warn;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Paragraph normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunNormalizer {
    preserve_math: bool,
}

impl RunNormalizer {
    /// Creates a normalizer for the given options.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            preserve_math: options.preserve_math,
        }
    }

    /// Normalizes one paragraph.
    ///
    /// `index` is the paragraph's position in the source document and is only
    /// used to locate warnings.
    pub fn normalize(
        &self,
        index: usize,
        raw: &RawParagraph,
        warnings: &mut Vec<Warning>,
    ) -> Paragraph {
        let runs = attach_split_marks(
            raw.runs
                .iter()
                .map(normalize_run)
                .filter(|run| !run.is_empty())
                .collect(),
        );

        if !self.preserve_math {
            return Paragraph::from_runs(runs);
        }

        let mut scanner = MathScanner::new();
        for run in &runs {
            scanner.feed(&run.text);
        }
        let scan = scanner.finish();

        if scan.unterminated {
            let warning = Warning::in_paragraph(
                WarningKind::UnterminatedMath,
                index,
                "paragraph ended inside a math span; kept the partial span",
            );
            warn!("{}", warning);
            warnings.push(warning);
        }

        Paragraph::from_parts(runs, &scan.spans)
    }
}

/// Resolves a raw run's formatting signals and cleans its text.
pub fn normalize_run(raw: &RawRun) -> Run {
    Run {
        text: normalize_text(&raw.text),
        bold: raw.bold.is_set(),
        italic: raw.italic.is_set(),
        underline: raw.underline.is_set(),
        style_name: raw.style_name.clone(),
    }
}

/// NFC-normalizes text, removes invisible characters and folds line breaks,
/// tabs and non-breaking spaces into plain spaces.
pub fn normalize_text(input: &str) -> String {
    let mut result = String::with_capacity(input.len());

    for c in input.nfc() {
        if is_control_char(c) {
            continue;
        }
        if is_space_like(c) {
            result.push(' ');
            continue;
        }
        result.push(c);
    }

    result
}

/// Moves combining marks that open a run onto the end of the previous run
/// and recomposes it, so a base letter and its accent split across runs
/// still compose.
fn attach_split_marks(runs: Vec<Run>) -> Vec<Run> {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for mut run in runs {
        if let Some(previous) = merged.last_mut() {
            let split = run
                .text
                .find(|c: char| !is_combining_mark(c))
                .unwrap_or(run.text.len());
            if split > 0 {
                previous.text.push_str(&run.text[..split]);
                previous.text = previous.text.nfc().collect();
                run.text.replace_range(..split, "");
            }
        }
        if !run.is_empty() {
            merged.push(run);
        }
    }
    merged
}

/// Normalizes a whole document and drops blank paragraphs.
pub fn normalize_document(
    raws: &[RawParagraph],
    options: &ParseOptions,
    warnings: &mut Vec<Warning>,
) -> Vec<Paragraph> {
    let normalizer = RunNormalizer::new(options);
    raws.iter()
        .enumerate()
        .filter(|(_, raw)| !raw.is_blank())
        .map(|(index, raw)| normalizer.normalize(index, raw, warnings))
        .filter(|paragraph| !paragraph.is_blank())
        .collect()
}

fn is_control_char(c: char) -> bool {
    matches!(
        c,
        '\0'
        | '\u{FEFF}' // BOM
        | '\u{FFFD}' // Replacement character
        | '\u{00AD}' // Soft hyphen
        | '\u{200B}' // Zero width space
    )
}

fn is_space_like(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\x0B' | '\x0C' | '\u{00A0}' | '\u{2028}' | '\u{3000}'
    )
}

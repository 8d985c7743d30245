//! Paragraph and text run definitions.
//!
//! Two families live here: the *raw* types that mirror what a document-access
//! layer hands over ([`RawParagraph`], [`RawRun`], [`FormatSignals`]), and the
//! canonical types produced by the run normalizer ([`Paragraph`], [`Run`],
//! [`MathSpan`]).

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Redundant formatting indicators for one property of a run.
///
/// Document-access layers expose the same property through several channels
/// (direct run property, inherited style property, low-level formatting
/// element). A property is considered set if any channel says so.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatSignals {
    /// Property set directly on the run
    pub explicit: Option<bool>,
    /// Property inherited from the run's character style
    pub inherited: Option<bool>,
    /// Low-level formatting element present in the run properties
    pub element: bool,
}

impl FormatSignals {
    /// Signals with the direct property switched on.
    pub fn on() -> Self {
        Self {
            explicit: Some(true),
            ..Default::default()
        }
    }

    /// Returns true if any channel reports the property.
    pub fn is_set(&self) -> bool {
        self.explicit == Some(true) || self.inherited == Some(true) || self.element
    }
}

impl From<bool> for FormatSignals {
    fn from(value: bool) -> Self {
        Self {
            explicit: Some(value),
            ..Default::default()
        }
    }
}

/// A formatting run as exposed by the document-access layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRun {
    /// The run text
    pub text: String,
    /// Bold indicators
    pub bold: FormatSignals,
    /// Italic indicators
    pub italic: FormatSignals,
    /// Underline indicators
    pub underline: FormatSignals,
    /// Character style name, if any
    pub style_name: Option<String>,
}

impl RawRun {
    /// Creates an unformatted run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Marks the run bold through its direct property.
    pub fn bold(mut self) -> Self {
        self.bold = FormatSignals::on();
        self
    }

    /// Marks the run italic through its direct property.
    pub fn italic(mut self) -> Self {
        self.italic = FormatSignals::on();
        self
    }

    /// Marks the run underlined through its direct property.
    pub fn underlined(mut self) -> Self {
        self.underline = FormatSignals::on();
        self
    }

    /// Sets the character style name.
    pub fn with_style_name(mut self, name: impl Into<String>) -> Self {
        self.style_name = Some(name.into());
        self
    }
}

/// A source paragraph as exposed by the document-access layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParagraph {
    /// Runs in document order
    pub runs: Vec<RawRun>,
}

impl RawParagraph {
    /// Creates a paragraph from runs.
    pub fn new(runs: Vec<RawRun>) -> Self {
        Self { runs }
    }

    /// Creates a single-run, unformatted paragraph.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![RawRun::new(text)],
        }
    }

    /// Returns the concatenated run text.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Returns true if the paragraph has no visible text.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

/// A text run with resolved formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// The text content
    pub text: String,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underline
    pub underline: bool,
    /// Character style name
    pub style_name: Option<String>,
}

impl Run {
    /// Creates a new run with no formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Creates a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }

    /// Creates an underlined run.
    pub fn underlined(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            underline: true,
            ..Default::default()
        }
    }

    /// Returns true if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            style_name: self.style_name.clone(),
        }
    }
}

/// A recovered span of mathematical notation, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathSpan {
    /// Verbatim notation text
    pub text: String,
    /// Byte offset in the owning paragraph's `plain_text` where the span sits
    pub offset: usize,
}

/// A normalized paragraph.
///
/// `plain_text` holds the text with math spans removed; `math_spans` records
/// each removed span together with the position it was taken from, so
/// [`Paragraph::text`] can rebuild the literal text. The literal text always
/// equals the concatenation of the run texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    /// Text with math spans removed
    pub plain_text: String,
    /// Runs in original order
    pub runs: Vec<Run>,
    /// Recovered math spans in order of appearance
    pub math_spans: Vec<MathSpan>,
}

impl Paragraph {
    /// Creates a single-run paragraph with no math spans.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_runs(vec![Run::new(text)])
    }

    /// Creates a paragraph from runs with no math spans.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self::from_parts(runs, &[])
    }

    /// Builds a paragraph from runs and the byte ranges of math spans within
    /// the concatenated run text.
    ///
    /// Ranges must be sorted, non-overlapping and lie on char boundaries.
    pub fn from_parts(runs: Vec<Run>, math: &[Range<usize>]) -> Self {
        let literal: String = runs.iter().map(|r| r.text.as_str()).collect();
        let mut plain_text = String::with_capacity(literal.len());
        let mut math_spans = Vec::with_capacity(math.len());
        let mut cursor = 0;

        for range in math {
            let start = range.start.clamp(cursor, literal.len());
            let end = range.end.clamp(start, literal.len());
            plain_text.push_str(&literal[cursor..start]);
            if end > start {
                math_spans.push(MathSpan {
                    text: literal[start..end].to_string(),
                    offset: plain_text.len(),
                });
            }
            cursor = end;
        }
        plain_text.push_str(&literal[cursor..]);

        Self {
            plain_text,
            runs,
            math_spans,
        }
    }

    /// Returns the literal text, math spans re-inserted where they were found.
    pub fn text(&self) -> String {
        if self.math_spans.is_empty() {
            return self.plain_text.clone();
        }

        let mut result = String::with_capacity(
            self.plain_text.len() + self.math_spans.iter().map(|s| s.text.len()).sum::<usize>(),
        );
        let mut cursor = 0;
        for span in &self.math_spans {
            result.push_str(&self.plain_text[cursor..span.offset]);
            result.push_str(&span.text);
            cursor = span.offset;
        }
        result.push_str(&self.plain_text[cursor..]);
        result
    }

    /// Returns true if this paragraph carries math notation.
    pub fn has_math(&self) -> bool {
        !self.math_spans.is_empty()
    }

    /// Returns true if the paragraph has no visible text.
    pub fn is_blank(&self) -> bool {
        self.plain_text.trim().is_empty() && self.math_spans.is_empty()
    }

    /// Byte ranges of the math spans in literal-text coordinates.
    pub fn math_ranges(&self) -> Vec<Range<usize>> {
        let mut shift = 0;
        self.math_spans
            .iter()
            .map(|span| {
                let start = span.offset + shift;
                shift += span.text.len();
                start..start + span.text.len()
            })
            .collect()
    }

    /// Returns the sub-paragraph covering `range` of the literal text.
    ///
    /// Runs are cut at the range bounds and math spans are clipped, so the
    /// formatting of the kept text is preserved.
    pub fn slice(&self, range: Range<usize>) -> Paragraph {
        let mut runs = Vec::new();
        let mut offset = 0;
        for run in &self.runs {
            let run_start = offset;
            let run_end = offset + run.text.len();
            offset = run_end;

            let lo = range.start.max(run_start);
            let hi = range.end.min(run_end);
            if lo < hi {
                runs.push(run.with_text(&run.text[lo - run_start..hi - run_start]));
            }
        }

        let math: Vec<Range<usize>> = self
            .math_ranges()
            .into_iter()
            .filter_map(|m| {
                let lo = m.start.max(range.start);
                let hi = m.end.min(range.end);
                (lo < hi).then(|| lo - range.start..hi - range.start)
            })
            .collect();

        Paragraph::from_parts(runs, &math)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_signals_or() {
        assert!(!FormatSignals::default().is_set());
        assert!(FormatSignals::on().is_set());
        assert!(FormatSignals {
            inherited: Some(true),
            ..Default::default()
        }
        .is_set());
        assert!(FormatSignals {
            explicit: Some(false),
            element: true,
            ..Default::default()
        }
        .is_set());
        assert!(!FormatSignals::from(false).is_set());
    }

    #[test]
    fn test_raw_paragraph_blank() {
        assert!(RawParagraph::text("   ").is_blank());
        assert!(RawParagraph::default().is_blank());
        assert!(!RawParagraph::text("A. 3").is_blank());
    }

    #[test]
    fn test_from_parts_removes_math() {
        let para = Paragraph::from_parts(
            vec![Run::new("f(x) = $x^2"), Run::new(" + 1$ done")],
            &[7..16],
        );
        assert_eq!(para.plain_text, "f(x) =  done");
        assert_eq!(para.math_spans.len(), 1);
        assert_eq!(para.math_spans[0].text, "$x^2 + 1$");
        assert_eq!(para.math_spans[0].offset, 7);
        assert_eq!(para.text(), "f(x) = $x^2 + 1$ done");
    }

    #[test]
    fn test_math_ranges_literal_coordinates() {
        let para = Paragraph::from_parts(vec![Run::new("$a$ and $b$")], &[0..3, 8..11]);
        assert_eq!(para.plain_text, " and ");
        assert_eq!(para.math_ranges(), vec![0..3, 8..11]);
    }

    #[test]
    fn test_slice_cuts_runs() {
        let para = Paragraph::from_runs(vec![Run::new("B. "), Run::underlined("Hà Nội"), Run::new("!")]);
        let tail = para.slice(3..para.text().len());
        assert_eq!(tail.text(), "Hà Nội!");
        assert_eq!(tail.runs.len(), 2);
        assert!(tail.runs[0].underline);
        assert!(!tail.runs[1].underline);

        let mid = para.slice(1..4);
        assert_eq!(mid.text(), ". H");
        assert_eq!(mid.runs[1].text, "H");
    }

    #[test]
    fn test_slice_clips_math() {
        let para = Paragraph::from_parts(vec![Run::new("A. $x$ or $y$")], &[3..6, 10..13]);
        let tail = para.slice(3..13);
        assert_eq!(tail.math_spans.len(), 2);
        assert_eq!(tail.plain_text, " or ");
        assert_eq!(tail.text(), "$x$ or $y$");
    }

    #[test]
    fn test_paragraph_blank() {
        assert!(Paragraph::from_text("  ").is_blank());
        let math_only = Paragraph::from_parts(vec![Run::new("$x$")], &[0..3]);
        assert!(!math_only.is_blank());
    }
}

//! Parsing options for question extraction.

use serde::Deserialize;

/// Options for controlling question extraction.
///
/// Deserializes from camelCase keys with every field optional, so a service
/// can keep it in its own configuration file:
///
/// ```
/// let options: quizbank::ParseOptions =
///     serde_json::from_str(r#"{ "preserveMath": true }"#).unwrap();
/// assert!(options.preserve_math);
/// assert!(options.detect_fill_in_blank);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Recover math notation spans (`$...$`, `$$...$$`, `\begin{..}...\end{..}`).
    pub preserve_math: bool,

    /// Recognize fill-in-blank blocks (keyword or `{<n>}_____` blanks).
    /// When off, such blocks are parsed as ordinary groups.
    pub detect_fill_in_blank: bool,

    /// Fall back to enumeration-based segmentation when a document carries
    /// no explicit markers.
    pub heuristic_fallback: bool,

    /// Record a warning for plain questions with no option marked correct.
    pub warn_on_no_correct: bool,

    /// Whether to process documents of a batch in parallel.
    pub parallel: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            preserve_math: false,
            detect_fill_in_blank: true,
            heuristic_fallback: true,
            warn_on_no_correct: true,
            parallel: true,
        }
    }
}

impl ParseOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables math span recovery.
    pub fn with_math(mut self) -> Self {
        self.preserve_math = true;
        self
    }

    /// Disables fill-in-blank classification.
    pub fn without_fill_in_blank(mut self) -> Self {
        self.detect_fill_in_blank = false;
        self
    }

    /// Requires explicit markers; unmarked documents become a single block.
    pub fn without_heuristics(mut self) -> Self {
        self.heuristic_fallback = false;
        self
    }

    /// Accepts questions with no correct option silently.
    pub fn allow_unmarked(mut self) -> Self {
        self.warn_on_no_correct = false;
        self
    }

    /// Disables parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

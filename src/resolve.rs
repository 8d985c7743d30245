//! Answer correctness resolution.
//!
//! Source documents mark the correct option visually. The resolver checks a
//! fixed, ranked list of signals and the first one that fires decides:
//!
//! 1. any run of the option is underlined
//! 2. a bold run with more than two characters that is not a bare label
//! 3. an inline emphasis pair in the raw text (`<u>..</u>`, `__..__`, ...)
//!
//! An option matching none of them is not correct. The runs passed in must
//! already have the `A.`/`B.` prefix removed.

use crate::grammar;
use crate::model::Run;

/// Minimum trimmed length (in chars) above which a bold run counts.
const MIN_BOLD_CHARS: usize = 2;

/// A correctness signal, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Underline,
    BoldContent,
    InlineMarker,
}

impl Signal {
    /// Every signal, highest priority first.
    pub const RANKED: [Signal; 3] = [Signal::Underline, Signal::BoldContent, Signal::InlineMarker];

    /// Returns true if this signal fires for the option.
    pub fn detect(self, runs: &[Run], raw_text: &str) -> bool {
        match self {
            Signal::Underline => runs.iter().any(|run| run.underline),
            Signal::BoldContent => runs.iter().any(|run| {
                let trimmed = run.text.trim();
                run.bold
                    && trimmed.chars().count() > MIN_BOLD_CHARS
                    && !grammar::looks_like_option_label(trimmed)
            }),
            Signal::InlineMarker => grammar::has_emphasis_pair(raw_text),
        }
    }
}

/// Result of resolving one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectnessDecision {
    /// Marked correct by the given signal
    Marked(Signal),
    /// No signal fired
    Unmarked,
}

impl CorrectnessDecision {
    /// Check if the option is correct.
    pub fn is_correct(&self) -> bool {
        matches!(self, CorrectnessDecision::Marked(_))
    }

    /// The signal that decided, if any.
    pub fn signal(&self) -> Option<Signal> {
        match self {
            CorrectnessDecision::Marked(signal) => Some(*signal),
            CorrectnessDecision::Unmarked => None,
        }
    }
}

/// Resolves an option from its runs and its raw text.
pub fn resolve(runs: &[Run], raw_text: &str) -> CorrectnessDecision {
    Signal::RANKED
        .into_iter()
        .find(|signal| signal.detect(runs, raw_text))
        .map_or(CorrectnessDecision::Unmarked, CorrectnessDecision::Marked)
}

/// Resolves an option whose raw text is the concatenation of its runs.
pub fn is_correct(runs: &[Run]) -> bool {
    let raw_text: String = runs.iter().map(|run| run.text.as_str()).collect();
    resolve(runs, &raw_text).is_correct()
}

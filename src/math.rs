//! Math notation span recovery.
//!
//! Paragraph text arrives one run at a time and a formula may be split over
//! several runs, so the scanner keeps its state between [`MathScanner::feed`]
//! calls. Recognized delimiters:
//!
//! - `$ ... $` (inline toggle)
//! - `$$ ... $$` (display toggle)
//! - `\begin{env} ... \end{env}` (named environment, same-name nesting allowed)
//!
//! `\$` is a literal dollar sign. Spans are reported as byte ranges into the
//! concatenation of everything fed, delimiters included.

use std::ops::Range;
use tracing::trace;

const BEGIN: &str = "\\begin{";
const END: &str = "\\end{";

/// Delimiter that opened the current span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
    Dollar,
    DoubleDollar,
    Environment(String),
}

/// Scanner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathState {
    Outside,
    InsideMath {
        delimiter: Delimiter,
        /// Byte offset of the opening delimiter
        start: usize,
        /// Open environments of the same name
        depth: usize,
    },
}

/// Result of scanning one paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathScan {
    /// Span ranges in order of appearance
    pub spans: Vec<Range<usize>>,
    /// True if input ended inside a span; the last span was flushed as-is
    pub unterminated: bool,
}

enum Step {
    Advance(usize),
    /// Not enough input to decide; resume on the next feed
    Wait,
}

/// Incremental math span scanner.
#[derive(Debug)]
pub struct MathScanner {
    buffer: String,
    pos: usize,
    state: MathState,
    spans: Vec<Range<usize>>,
}

impl Default for MathScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MathScanner {
    /// Creates a scanner in the `Outside` state.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pos: 0,
            state: MathState::Outside,
            spans: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &MathState {
        &self.state
    }

    /// Feeds the next run of text.
    pub fn feed(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.scan(false);
    }

    /// Ends input. A span still open is flushed up to the end of the text.
    pub fn finish(mut self) -> MathScan {
        self.scan(true);

        let mut unterminated = false;
        if let MathState::InsideMath { start, .. } = self.state {
            trace!(start, "math span still open at end of paragraph");
            self.spans.push(start..self.buffer.len());
            unterminated = true;
        }

        MathScan {
            spans: self.spans,
            unterminated,
        }
    }

    fn scan(&mut self, at_end: bool) {
        while self.pos < self.buffer.len() {
            match self.step(at_end) {
                Step::Advance(n) => self.pos += n,
                Step::Wait => break,
            }
        }
    }

    fn step(&mut self, at_end: bool) -> Step {
        let pos = self.pos;
        let rest = &self.buffer[pos..];
        let Some(c) = rest.chars().next() else {
            return Step::Wait;
        };

        match c {
            '\\' => self.step_backslash(pos, at_end),
            '$' => {
                if rest.len() == 1 && !at_end {
                    return Step::Wait;
                }
                let double = rest.starts_with("$$");
                match &self.state {
                    MathState::Outside => {
                        let delimiter = if double {
                            Delimiter::DoubleDollar
                        } else {
                            Delimiter::Dollar
                        };
                        self.open(delimiter, pos);
                        Step::Advance(if double { 2 } else { 1 })
                    }
                    MathState::InsideMath {
                        delimiter: Delimiter::Dollar,
                        ..
                    } => {
                        self.close(pos + 1);
                        Step::Advance(1)
                    }
                    MathState::InsideMath {
                        delimiter: Delimiter::DoubleDollar,
                        ..
                    } if double => {
                        self.close(pos + 2);
                        Step::Advance(2)
                    }
                    MathState::InsideMath { .. } => Step::Advance(1),
                }
            }
            _ => Step::Advance(c.len_utf8()),
        }
    }

    fn step_backslash(&mut self, pos: usize, at_end: bool) -> Step {
        let rest = &self.buffer[pos..];

        if rest.starts_with("\\$") {
            return Step::Advance(2);
        }

        if let Some((name, len)) = environment_token(rest, BEGIN) {
            match &mut self.state {
                MathState::Outside => self.open(Delimiter::Environment(name), pos),
                MathState::InsideMath {
                    delimiter: Delimiter::Environment(open),
                    depth,
                    ..
                } if *open == name => *depth += 1,
                MathState::InsideMath { .. } => {}
            }
            return Step::Advance(len);
        }

        if let Some((name, len)) = environment_token(rest, END) {
            if let MathState::InsideMath {
                delimiter: Delimiter::Environment(open),
                depth,
                ..
            } = &mut self.state
            {
                if *open == name {
                    *depth -= 1;
                    if *depth == 0 {
                        self.close(pos + len);
                    }
                }
            }
            return Step::Advance(len);
        }

        if !at_end && is_partial_token(rest) {
            return Step::Wait;
        }

        Step::Advance(1)
    }

    fn open(&mut self, delimiter: Delimiter, start: usize) {
        trace!(?delimiter, start, "math span opened");
        self.state = MathState::InsideMath {
            delimiter,
            start,
            depth: 1,
        };
    }

    fn close(&mut self, end: usize) {
        if let MathState::InsideMath { start, .. } = self.state {
            trace!(start, end, "math span closed");
            self.spans.push(start..end);
        }
        self.state = MathState::Outside;
    }
}

/// Matches `\begin{name}` / `\end{name}` at the start of `text`.
fn environment_token(text: &str, head: &str) -> Option<(String, usize)> {
    let after = text.strip_prefix(head)?;
    let close = after.find('}')?;
    let name = &after[..close];
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some((name.to_string(), head.len() + close + 1))
}

/// True if `text` could still grow into an environment token or `\$`.
fn is_partial_token(text: &str) -> bool {
    if text == "\\" {
        return true;
    }
    for head in [BEGIN, END] {
        if head.starts_with(text) {
            return true;
        }
        if let Some(after) = text.strip_prefix(head) {
            if !after.contains('}') && !after.chars().any(char::is_whitespace) {
                return true;
            }
        }
    }
    false
}

/// Scans a complete string.
pub fn find_math_spans(text: &str) -> MathScan {
    let mut scanner = MathScanner::new();
    scanner.feed(text);
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(runs: &[&str]) -> (Vec<String>, bool) {
        let mut scanner = MathScanner::new();
        for run in runs {
            scanner.feed(run);
        }
        let joined: String = runs.concat();
        let scan = scanner.finish();
        (
            scan.spans.iter().map(|r| joined[r.clone()].to_string()).collect(),
            scan.unterminated,
        )
    }

    #[test]
    fn test_span_across_runs() {
        let (spans, open) = spans_of(&["f(x) = $x^2", " + 1$"]);
        assert_eq!(spans, vec!["$x^2 + 1$"]);
        assert!(!open);
    }

    #[test]
    fn test_inline_pairs() {
        let (spans, _) = spans_of(&["$a$ and $b$"]);
        assert_eq!(spans, vec!["$a$", "$b$"]);

        let (spans, _) = spans_of(&["$a$$b$"]);
        assert_eq!(spans, vec!["$a$", "$b$"]);
    }

    #[test]
    fn test_display_math_split_delimiter() {
        let (spans, _) = spans_of(&["see $", "$x = 1$$ here"]);
        assert_eq!(spans, vec!["$$x = 1$$"]);
    }

    #[test]
    fn test_environment_across_runs() {
        let (spans, open) =
            spans_of(&["M = \\be", "gin{matrix} 1 & 0 \\end{mat", "rix} end"]);
        assert_eq!(spans, vec!["\\begin{matrix} 1 & 0 \\end{matrix}"]);
        assert!(!open);
    }

    #[test]
    fn test_nested_environment() {
        let text = "\\begin{array} \\begin{array} x \\end{array} \\end{array} tail";
        let scan = find_math_spans(text);
        assert_eq!(scan.spans.len(), 1);
        assert_eq!(&text[scan.spans[0].clone()], &text[..text.len() - 5]);
    }

    #[test]
    fn test_dollar_inside_environment() {
        let (spans, _) = spans_of(&["\\begin{cases} $x$ \\end{cases}"]);
        assert_eq!(spans, vec!["\\begin{cases} $x$ \\end{cases}"]);
    }

    #[test]
    fn test_escaped_dollar() {
        let (spans, open) = spans_of(&["costs \\$5 or \\", "$6"]);
        assert!(spans.is_empty());
        assert!(!open);
    }

    #[test]
    fn test_unterminated_flushes() {
        let (spans, open) = spans_of(&["value $x + ", "1"]);
        assert_eq!(spans, vec!["$x + 1"]);
        assert!(open);
    }

    #[test]
    fn test_trailing_dollar_at_end() {
        let (spans, open) = spans_of(&["$x", "$"]);
        assert_eq!(spans, vec!["$x$"]);
        assert!(!open);
    }

    #[test]
    fn test_state_transitions() {
        let mut scanner = MathScanner::new();
        assert_eq!(scanner.state(), &MathState::Outside);
        scanner.feed("a $b");
        assert!(matches!(
            scanner.state(),
            MathState::InsideMath {
                delimiter: Delimiter::Dollar,
                start: 2,
                ..
            }
        ));
        scanner.feed("$");
        // Lone trailing '$' waits for more input
        scanner.feed(" c");
        assert_eq!(scanner.state(), &MathState::Outside);
    }

    #[test]
    fn test_no_math() {
        let scan = find_math_spans("2 + 2 = 4");
        assert!(scan.spans.is_empty());
        assert!(!scan.unterminated);
    }
}

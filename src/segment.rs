//! Block segmentation.
//!
//! Partitions a document's paragraph stream into [`QuestionBlock`]s, one per
//! logical question. Documents carrying explicit markers are cut on those
//! markers; unmarked documents fall back to enumeration heuristics.

use crate::grammar::{self, Marker, Structure};
use crate::model::{Paragraph, Warning, WarningKind};
use crate::parse_options::ParseOptions;
use std::ops::Range;
use tracing::{debug, warn};

/// An ordered, non-empty run of paragraphs forming one logical question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBlock {
    paragraphs: Vec<Paragraph>,
}

impl QuestionBlock {
    /// Creates a block; `None` when `paragraphs` is empty.
    pub fn new(paragraphs: Vec<Paragraph>) -> Option<Self> {
        (!paragraphs.is_empty()).then_some(Self { paragraphs })
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// The first paragraph.
    pub fn first(&self) -> &Paragraph {
        &self.paragraphs[0]
    }

    /// Literal text, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How the document was cut into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// Cut on explicit markers
    Explicit,
    /// Cut on leading enumerations and competency tags
    Heuristic,
    /// No cut points; the whole document is one block
    Whole,
}

/// Segmenter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Outside,
    /// Between a group start and its end; separators are ignored
    InGroup,
}

/// Result of segmenting one document.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub blocks: Vec<QuestionBlock>,
    pub mode: SegmentMode,
}

/// Segments a document's non-empty paragraphs into question blocks.
pub fn segment(
    paragraphs: &[Paragraph],
    options: &ParseOptions,
    warnings: &mut Vec<Warning>,
) -> Segmentation {
    let explicit = paragraphs
        .iter()
        .any(|p| grammar::has_any_marker(&p.text()));

    let mut segmenter = Segmenter::default();
    let mode = if explicit {
        for paragraph in paragraphs {
            segmenter.explicit(paragraph);
        }
        SegmentMode::Explicit
    } else if options.heuristic_fallback
        && paragraphs.iter().any(|p| starts_question(&p.text()))
    {
        for paragraph in paragraphs {
            segmenter.heuristic(paragraph, warnings);
        }
        SegmentMode::Heuristic
    } else {
        for paragraph in paragraphs {
            segmenter.push(paragraph.clone());
        }
        SegmentMode::Whole
    };
    segmenter.flush();

    debug!(?mode, blocks = segmenter.blocks.len(), "document segmented");
    Segmentation {
        blocks: segmenter.blocks,
        mode,
    }
}

fn starts_question(text: &str) -> bool {
    grammar::is_question_start(text) && !grammar::is_answer_line(text)
}

#[derive(Debug)]
struct Segmenter {
    state: SegmentState,
    buffer: Vec<Paragraph>,
    /// Buffer holds at least one answer line
    buffer_has_answers: bool,
    /// Heuristic mode has seen its first question start
    started: bool,
    blocks: Vec<QuestionBlock>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            state: SegmentState::Outside,
            buffer: Vec::new(),
            buffer_has_answers: false,
            started: false,
            blocks: Vec::new(),
        }
    }
}

impl Segmenter {
    fn explicit(&mut self, paragraph: &Paragraph) {
        let text = paragraph.text();

        if grammar::is_alt_separator(&text) {
            if self.state == SegmentState::Outside {
                self.flush();
            }
            return;
        }

        let mut cursor = 0;
        for hit in grammar::scan_structure(&text) {
            let Structure::Marker(marker) = hit.structure else {
                continue;
            };

            match (self.state, marker) {
                (SegmentState::Outside, Marker::Separator) => {
                    self.push_piece(paragraph, cursor..hit.range.start);
                    self.flush();
                    cursor = hit.range.end;
                }
                (SegmentState::InGroup, Marker::Separator) => {}

                (SegmentState::Outside, Marker::GroupStart) => {
                    // Text gathered without answer lines is the group's preamble
                    if self.buffer_has_answers {
                        self.push_piece(paragraph, cursor..hit.range.start);
                        self.flush();
                        cursor = hit.range.start;
                    }
                    self.state = SegmentState::InGroup;
                }
                (SegmentState::InGroup, Marker::GroupStart) => {
                    debug!("group start inside an open group");
                    self.push_piece(paragraph, cursor..hit.range.start);
                    self.flush();
                    cursor = hit.range.start;
                }

                (_, marker) if marker.closes_group() => {
                    self.push_piece(paragraph, cursor..hit.range.end);
                    self.flush();
                    self.state = SegmentState::Outside;
                    cursor = hit.range.end;
                }

                (_, marker) if marker.is_type_tag() => {
                    self.push_piece(paragraph, cursor..hit.range.start);
                    self.flush();
                    self.state = SegmentState::Outside;
                    cursor = hit.range.start;
                }

                _ => {}
            }
        }

        self.push_piece(paragraph, cursor..text.len());
    }

    fn heuristic(&mut self, paragraph: &Paragraph, warnings: &mut Vec<Warning>) {
        let text = paragraph.text();

        if starts_question(&text) {
            self.flush();
            self.started = true;
            self.push(paragraph.clone());
        } else if self.started {
            self.push(paragraph.clone());
        } else {
            let warning = Warning::new(
                WarningKind::OrphanContent,
                format!("dropped text before the first question: {}", preview(&text)),
            );
            warn!("{}", warning);
            warnings.push(warning);
        }
    }

    fn push(&mut self, paragraph: Paragraph) {
        if grammar::is_answer_line(&paragraph.text()) {
            self.buffer_has_answers = true;
        }
        self.buffer.push(paragraph);
    }

    /// Pushes the part of `paragraph` covered by `range`, if it has text.
    fn push_piece(&mut self, paragraph: &Paragraph, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let whole = range.start == 0 && range.end == paragraph.text().len();
        let piece = if whole {
            paragraph.clone()
        } else {
            paragraph.slice(range)
        };
        if !piece.text().trim().is_empty() {
            self.push(piece);
        }
    }

    fn flush(&mut self) {
        let paragraphs = std::mem::take(&mut self.buffer);
        self.buffer_has_answers = false;
        if let Some(block) = QuestionBlock::new(paragraphs) {
            debug!(
                block = self.blocks.len(),
                paragraphs = block.paragraphs().len(),
                "block closed"
            );
            self.blocks.push(block);
        }
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 40;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

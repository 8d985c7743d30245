//! Structural classification and parsing of question blocks.
//!
//! A block is classified first ([`classify`]), then parsed into a provisional
//! [`ParsedQuestion`] tree. Correctness of options and final typing happen
//! later in [`crate::assemble`].

mod group;
mod plain;

pub use group::GroupState;
pub use plain::PlainState;

use crate::grammar::{self, Marker, Structure};
use crate::model::{MediaRef, Paragraph, Run, Warning};
use crate::parse_options::ParseOptions;
use crate::segment::QuestionBlock;
use tracing::debug;

/// Structural shape of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    /// Stem plus lettered options (single or multi choice)
    Plain,
    /// Shared stem with child questions
    Group,
    /// Shared stem with numbered blanks
    FillInBlank,
}

impl BlockShape {
    /// Returns true for the shapes parsed by the group parser.
    pub fn is_parent(self) -> bool {
        matches!(self, BlockShape::Group | BlockShape::FillInBlank)
    }
}

/// An answer option before correctness is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnswer {
    /// Option letter as written
    pub letter: char,
    /// Runs of the option, letter prefix removed, continuation lines included
    pub runs: Vec<Run>,
    /// Option text before markup removal
    pub raw_text: String,
    /// Cleaned option text
    pub content: String,
    /// Option text carries math notation
    pub has_math: bool,
}

/// Provisional question tree produced from one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub shape: BlockShape,
    pub content: String,
    pub clo: Option<String>,
    pub answers: Vec<ParsedAnswer>,
    pub group_content: Option<String>,
    pub children: Vec<ParsedQuestion>,
    pub number: Option<u32>,
    pub blanks: Vec<u32>,
    pub media: Vec<MediaRef>,
    /// Stem or content carries math notation (answers and children excluded)
    pub has_math: bool,
}

impl ParsedQuestion {
    pub(crate) fn empty(shape: BlockShape) -> Self {
        Self {
            shape,
            content: String::new(),
            clo: None,
            answers: Vec::new(),
            group_content: None,
            children: Vec::new(),
            number: None,
            blanks: Vec::new(),
            media: Vec::new(),
            has_math: false,
        }
    }

    /// Returns true if nothing was recovered from the block.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.answers.is_empty()
            && self.children.is_empty()
            && self.group_content.as_deref().map_or(true, str::is_empty)
    }
}

/// Determines the shape of a block.
pub fn classify(block: &QuestionBlock, options: &ParseOptions) -> BlockShape {
    let leading = block.first().text();
    let has_group_start = block
        .paragraphs()
        .iter()
        .any(|p| Marker::GroupStart.is_in(&p.text()));
    let fill_tag = Marker::FillBlankType.is_in(&leading);
    let group_tag = Marker::GroupType.is_in(&leading);

    if options.detect_fill_in_blank
        && (fill_tag || (has_group_start && grammar::has_blank(&stem_text(block))))
    {
        BlockShape::FillInBlank
    } else if has_group_start || group_tag || fill_tag {
        BlockShape::Group
    } else {
        BlockShape::Plain
    }
}

/// Classifies and parses one block.
///
/// Returns `None` for blocks that carry no question text, such as a stray
/// closing marker.
pub fn parse_block(
    index: usize,
    block: &QuestionBlock,
    options: &ParseOptions,
    warnings: &mut Vec<Warning>,
) -> Option<ParsedQuestion> {
    let shape = classify(block, options);
    debug!(block = index, ?shape, "block classified");

    let parsed = match shape {
        BlockShape::Plain => plain::parse_plain(block.paragraphs()),
        BlockShape::Group | BlockShape::FillInBlank => {
            group::parse_group(index, shape, block.paragraphs(), warnings)
        }
    };

    if parsed.is_empty() {
        debug!(block = index, "block carries no question text");
        return None;
    }
    Some(parsed)
}

/// Text of the shared stem: everything before the first content-end or
/// child-index marker.
fn stem_text(block: &QuestionBlock) -> String {
    let mut stem = String::new();
    for paragraph in block.paragraphs() {
        let text = paragraph.text();
        let stop = grammar::scan_structure(&text).into_iter().find(|hit| {
            matches!(
                hit.structure,
                Structure::ChildIndex(_) | Structure::Marker(Marker::GroupContentEnd)
            )
        });
        match stop {
            Some(hit) => {
                stem.push_str(&text[..hit.range.start]);
                break;
            }
            None => {
                stem.push_str(&text);
                stem.push('\n');
            }
        }
    }
    stem
}

/// Joins the literal text of paragraphs with single spaces.
fn join_text(paragraphs: &[Paragraph]) -> String {
    paragraphs
        .iter()
        .map(Paragraph::text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans question text: strips the competency tag, media references and
/// markers, then collapses whitespace.
fn clean_question_text(text: &str) -> (String, Option<String>, Vec<MediaRef>) {
    let (clo, text) = grammar::extract_clo(text);
    let (media, text) = grammar::extract_media(&text);
    let text = grammar::strip_markers(&text);
    (grammar::clean_text(&text), clo, media)
}

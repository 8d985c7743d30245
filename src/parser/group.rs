//! Shared-stem group parsing (groups and fill-in-blank blocks).

use super::{clean_question_text, join_text, plain, BlockShape, ParsedQuestion};
use crate::grammar::{self, Marker, Structure};
use crate::model::{Paragraph, Warning, WarningKind};
use tracing::warn;

/// Group parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Before the group-start marker
    Preamble,
    /// Accumulating the shared stem
    Stem,
    /// Past the content-end marker, collecting child sub-blocks
    Children,
    /// After the group-end marker
    Closed,
}

/// One piece of a block once markers are cut out.
#[derive(Debug)]
enum Token {
    Text(Paragraph),
    Structure(Structure),
}

#[derive(Debug)]
struct ChildDraft {
    number: Option<u32>,
    paragraphs: Vec<Paragraph>,
}

struct GroupParser<'a> {
    block: usize,
    state: GroupState,
    preamble: Vec<Paragraph>,
    stem: Vec<Paragraph>,
    current: Option<ChildDraft>,
    children: Vec<ChildDraft>,
    warnings: &'a mut Vec<Warning>,
}

impl<'a> GroupParser<'a> {
    fn new(block: usize, initial: GroupState, warnings: &'a mut Vec<Warning>) -> Self {
        Self {
            block,
            state: initial,
            preamble: Vec::new(),
            stem: Vec::new(),
            current: None,
            children: Vec::new(),
            warnings,
        }
    }

    fn accept(&mut self, token: Token) {
        match (self.state, token) {
            (GroupState::Closed, Token::Text(paragraph)) => {
                self.warn(
                    WarningKind::OrphanContent,
                    format!("text after the group end dropped: {}", paragraph.text().trim()),
                );
            }
            (GroupState::Closed, Token::Structure(_)) => {}

            (_, Token::Structure(Structure::ChildIndex(number))) => {
                self.close_child();
                self.current = Some(ChildDraft {
                    number: Some(number),
                    paragraphs: Vec::new(),
                });
                self.state = GroupState::Children;
            }
            (_, Token::Structure(Structure::Marker(marker))) => self.on_marker(marker),

            (GroupState::Preamble, Token::Text(paragraph)) => self.preamble.push(paragraph),
            (GroupState::Stem, Token::Text(paragraph)) => self.stem.push(paragraph),
            (GroupState::Children, Token::Text(paragraph)) => {
                // Text between the content end and the first index is a child of its own
                self.current
                    .get_or_insert_with(|| ChildDraft {
                        number: None,
                        paragraphs: Vec::new(),
                    })
                    .paragraphs
                    .push(paragraph);
            }
        }
    }

    fn on_marker(&mut self, marker: Marker) {
        match marker {
            Marker::GroupStart if self.state == GroupState::Preamble => {
                self.state = GroupState::Stem;
            }
            Marker::GroupContentEnd
                if matches!(self.state, GroupState::Preamble | GroupState::Stem) =>
            {
                self.state = GroupState::Children;
            }
            Marker::GroupEnd | Marker::GroupClose => {
                self.close_child();
                self.state = GroupState::Closed;
            }
            _ => {}
        }
    }

    fn close_child(&mut self) {
        if let Some(child) = self.current.take() {
            self.children.push(child);
        }
    }

    fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        let warning = Warning::in_block(kind, self.block, message);
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn finish(mut self, shape: BlockShape) -> ParsedQuestion {
        if self.state != GroupState::Closed {
            self.warn(
                WarningKind::UnterminatedGroup,
                "block ended before the group end marker; open child flushed",
            );
            self.close_child();
        }

        let (content, preamble_clo, mut media) = clean_question_text(&join_text(&self.preamble));
        let stem_text = join_text(&self.stem);
        let (group_content, stem_clo, stem_media) = clean_question_text(&stem_text);
        media.extend(stem_media);
        let clo = preamble_clo.or(stem_clo);

        let mut children = Vec::with_capacity(self.children.len());
        for draft in std::mem::take(&mut self.children) {
            let label = child_label(draft.number);
            let mut child = plain::parse_plain(&draft.paragraphs);
            if child.content.is_empty() && child.answers.is_empty() {
                self.warn(WarningKind::EmptyChild, format!("{} has no content; skipped", label));
                continue;
            }
            child.number = draft.number;
            if child.clo.is_none() {
                child.clo = clo.clone();
            }
            children.push(child);
        }

        let mut question = ParsedQuestion::empty(shape);
        question.content = content;
        question.clo = clo;
        question.media = media;
        question.has_math = self
            .preamble
            .iter()
            .chain(&self.stem)
            .any(Paragraph::has_math);
        if shape == BlockShape::FillInBlank {
            question.blanks = unique(grammar::placeholders(&stem_text));
        }
        question.group_content = Some(group_content);
        question.children = children;
        question
    }
}

fn child_label(number: Option<u32>) -> String {
    match number {
        Some(n) => format!("child {}", n),
        None => "unnumbered child".to_string(),
    }
}

fn unique(values: Vec<u32>) -> Vec<u32> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Cuts paragraphs into text pieces and structural tokens.
///
/// Separator and type-tag literals are dropped here; the rest drive the
/// state machine.
fn tokenize(paragraphs: &[Paragraph]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for paragraph in paragraphs {
        let text = paragraph.text();
        let mut cursor = 0;
        for hit in grammar::scan_structure(&text) {
            push_text(&mut tokens, paragraph, cursor, hit.range.start);
            tokens.push(Token::Structure(hit.structure));
            cursor = hit.range.end;
        }
        push_text(&mut tokens, paragraph, cursor, text.len());
    }
    tokens
}

fn push_text(tokens: &mut Vec<Token>, paragraph: &Paragraph, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let piece = if start == 0 && end == paragraph.text().len() {
        paragraph.clone()
    } else {
        paragraph.slice(start..end)
    };
    if !piece.text().trim().is_empty() {
        tokens.push(Token::Text(piece));
    }
}

/// Parses a group or fill-in-blank block.
pub(crate) fn parse_group(
    block: usize,
    shape: BlockShape,
    paragraphs: &[Paragraph],
    warnings: &mut Vec<Warning>,
) -> ParsedQuestion {
    let has_start = paragraphs
        .iter()
        .any(|p| Marker::GroupStart.is_in(&p.text()));
    // Without a start marker the stem begins right away
    let initial = if has_start {
        GroupState::Preamble
    } else {
        GroupState::Stem
    };

    let mut parser = GroupParser::new(block, initial, warnings);
    for token in tokenize(paragraphs) {
        parser.accept(token);
    }
    let parsed = parser.finish(shape);

    if parsed.children.is_empty() {
        // A parent needs children; keep the text as a plain question instead
        let warning = Warning::in_block(
            WarningKind::EmptyGroup,
            block,
            "group has no child questions; parsed as a plain question",
        );
        warn!("{}", warning);
        warnings.push(warning);
        let text_only: Vec<Paragraph> = tokenize(paragraphs)
            .into_iter()
            .filter_map(|token| match token {
                Token::Text(paragraph) => Some(paragraph),
                Token::Structure(_) => None,
            })
            .collect();
        return plain::parse_plain(&text_only);
    }

    parsed
}

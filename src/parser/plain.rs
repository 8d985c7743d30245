//! Plain question parsing: a stem followed by lettered options.

use super::{clean_question_text, join_text, BlockShape, ParsedAnswer, ParsedQuestion};
use crate::grammar;
use crate::model::Paragraph;

/// Accumulator state of the plain parser.
///
/// The parser moves from `Content` to `Answers` on the first option line and
/// never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlainState {
    Content,
    Answers,
}

struct OptionDraft {
    letter: char,
    paragraphs: Vec<Paragraph>,
}

/// Parses a plain question from its paragraphs.
pub(crate) fn parse_plain(paragraphs: &[Paragraph]) -> ParsedQuestion {
    let mut state = PlainState::Content;
    let mut content_lines: Vec<Paragraph> = Vec::new();
    let mut options: Vec<OptionDraft> = Vec::new();

    for paragraph in paragraphs {
        let text = paragraph.text();

        if let Some((letter, prefix_len)) = grammar::answer_prefix(&text) {
            state = PlainState::Answers;
            options.push(OptionDraft {
                letter,
                paragraphs: vec![paragraph.slice(prefix_len..text.len())],
            });
            continue;
        }

        match (state, options.last_mut()) {
            (PlainState::Answers, Some(current)) => current.paragraphs.push(paragraph.clone()),
            _ => content_lines.push(paragraph.clone()),
        }
    }

    let (content, clo, media) = clean_question_text(&join_text(&content_lines));

    let mut question = ParsedQuestion::empty(BlockShape::Plain);
    question.content = content;
    question.clo = clo;
    question.media = media;
    question.has_math = content_lines.iter().any(Paragraph::has_math);
    question.answers = options.into_iter().map(finish_option).collect();
    question
}

fn finish_option(draft: OptionDraft) -> ParsedAnswer {
    let raw_text = join_text(&draft.paragraphs);
    let content = grammar::clean_text(&grammar::strip_emphasis(&grammar::strip_markers(
        &raw_text,
    )));

    ParsedAnswer {
        letter: draft.letter,
        runs: draft
            .paragraphs
            .iter()
            .flat_map(|p| p.runs.iter().cloned())
            .collect(),
        has_math: draft.paragraphs.iter().any(Paragraph::has_math),
        raw_text,
        content,
    }
}

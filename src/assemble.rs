//! Question assembly.
//!
//! Turns provisional [`ParsedQuestion`] trees into final [`Question`]s:
//! resolves option correctness, assigns identifiers and order, derives the
//! question type and the math flag, and records answer-level warnings.

use crate::grammar::ANSWER_LETTERS;
use crate::model::{Answer, Question, QuestionType, Warning, WarningKind};
use crate::parse_options::ParseOptions;
use crate::parser::{BlockShape, ParsedAnswer, ParsedQuestion};
use crate::resolve;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};
use uuid::Uuid;

/// Source of question and answer identifiers.
///
/// Shared across threads when documents are parsed in parallel; only
/// uniqueness is required, not ordering.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random (v4) identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic counter-based identifiers, for reproducible output.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Uuid::from_u128(u128::from(n) + 1)
    }
}

/// Builds final questions for one document.
pub struct Assembler<'a> {
    ids: &'a dyn IdGenerator,
    options: &'a ParseOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(ids: &'a dyn IdGenerator, options: &'a ParseOptions) -> Self {
        Self { ids, options }
    }

    /// Assembles the question parsed from block `block`.
    pub fn assemble(
        &self,
        block: usize,
        parsed: ParsedQuestion,
        warnings: &mut Vec<Warning>,
    ) -> Question {
        if parsed.shape.is_parent() {
            self.assemble_parent(block, parsed, warnings)
        } else {
            self.assemble_plain(block, parsed, warnings)
        }
    }

    fn assemble_parent(
        &self,
        block: usize,
        parsed: ParsedQuestion,
        warnings: &mut Vec<Warning>,
    ) -> Question {
        let question_type = match parsed.shape {
            BlockShape::FillInBlank => QuestionType::FillInBlank,
            _ => QuestionType::Group,
        };

        let children: Vec<Question> = parsed
            .children
            .into_iter()
            .map(|child| self.assemble_plain(block, child, warnings))
            .collect();
        let has_math = parsed.has_math || children.iter().any(|c| c.has_math);

        trace!(block, %question_type, children = children.len(), "parent assembled");
        Question {
            id: self.ids.next_id(),
            question_type,
            content: parsed.content,
            clo: parsed.clo,
            answers: Vec::new(),
            group_content: parsed.group_content,
            child_questions: children,
            has_math,
            number: parsed.number,
            blanks: parsed.blanks,
            media: parsed.media,
        }
    }

    fn assemble_plain(
        &self,
        block: usize,
        parsed: ParsedQuestion,
        warnings: &mut Vec<Warning>,
    ) -> Question {
        let label = question_label(&parsed);

        let letters: Vec<char> = parsed.answers.iter().map(|a| a.letter).collect();
        if !letters.is_empty() && !letters.iter().eq(ANSWER_LETTERS.iter().take(letters.len())) {
            let written: String = letters.iter().collect();
            push_warning(
                warnings,
                Warning::in_block(
                    WarningKind::OptionSequence,
                    block,
                    format!("{}: options {} renumbered from 0", label, written),
                ),
            );
        }

        let has_math = parsed.has_math || parsed.answers.iter().any(|a| a.has_math);
        let answers: Vec<Answer> = parsed
            .answers
            .into_iter()
            .enumerate()
            .map(|(order, answer)| self.answer(order, answer))
            .collect();
        let correct = answers.iter().filter(|a| a.is_correct).count();

        if answers.is_empty() {
            push_warning(
                warnings,
                Warning::in_block(WarningKind::NoAnswers, block, format!("{} has no options", label)),
            );
        } else if correct == 0 && self.options.warn_on_no_correct {
            push_warning(
                warnings,
                Warning::in_block(
                    WarningKind::NoCorrectAnswer,
                    block,
                    format!("{} has no option marked correct", label),
                ),
            );
        }

        let question_type = QuestionType::from_correct_count(correct);
        trace!(block, %question_type, answers = answers.len(), correct, "question assembled");

        Question {
            id: self.ids.next_id(),
            question_type,
            content: parsed.content,
            clo: parsed.clo,
            answers,
            group_content: None,
            child_questions: Vec::new(),
            has_math,
            number: parsed.number,
            blanks: Vec::new(),
            media: parsed.media,
        }
    }

    fn answer(&self, order: usize, parsed: ParsedAnswer) -> Answer {
        let decision = resolve::resolve(&parsed.runs, &parsed.raw_text);
        if let Some(signal) = decision.signal() {
            trace!(order, ?signal, "option marked correct");
        }
        Answer {
            id: self.ids.next_id(),
            order,
            content: parsed.content,
            is_correct: decision.is_correct(),
        }
    }
}

fn question_label(parsed: &ParsedQuestion) -> String {
    match parsed.number {
        Some(n) => format!("child question {}", n),
        None if parsed.content.is_empty() => "question".to_string(),
        None => {
            let preview: String = parsed.content.chars().take(30).collect();
            format!("question \"{}\"", preview)
        }
    }
}

fn push_warning(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!("{}", warning);
    warnings.push(warning);
}

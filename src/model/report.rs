//! Parse results and diagnostics.

use super::{Question, QuestionType};
use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// Category of a recoverable problem found while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// Group or fill-in-blank block ended without its end marker
    UnterminatedGroup,
    /// Paragraph ended inside a math span
    UnterminatedMath,
    /// Plain question with options but none marked correct
    NoCorrectAnswer,
    /// Plain question without any answer option
    NoAnswers,
    /// Child-index marker followed by no content
    EmptyChild,
    /// Group block that yielded no child question
    EmptyGroup,
    /// Text that belongs to no question and was dropped
    OrphanContent,
    /// Option letters out of sequence
    OptionSequence,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::UnterminatedGroup => "unterminated group",
            WarningKind::UnterminatedMath => "unterminated math span",
            WarningKind::NoCorrectAnswer => "no correct answer",
            WarningKind::NoAnswers => "no answers",
            WarningKind::EmptyChild => "empty child question",
            WarningKind::EmptyGroup => "group without child questions",
            WarningKind::OrphanContent => "orphan content",
            WarningKind::OptionSequence => "option letters out of sequence",
        };
        f.write_str(name)
    }
}

/// A recoverable problem, reported alongside the successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub kind: WarningKind,
    /// Index of the question block, when the problem is tied to one
    pub block: Option<usize>,
    /// Index of the source paragraph, when the problem is tied to one
    pub paragraph: Option<usize>,
    pub message: String,
}

impl Warning {
    /// Creates a warning with no location.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            block: None,
            paragraph: None,
            message: message.into(),
        }
    }

    /// Creates a warning tied to a question block.
    pub fn in_block(kind: WarningKind, block: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            block: Some(block),
            paragraph: None,
            message: message.into(),
        }
    }

    /// Creates a warning tied to a source paragraph.
    pub fn in_paragraph(kind: WarningKind, paragraph: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            block: None,
            paragraph: Some(paragraph),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.block, self.paragraph) {
            (Some(b), _) => write!(f, "block {}: {}: {}", b, self.kind, self.message),
            (None, Some(p)) => write!(f, "paragraph {}: {}: {}", p, self.kind, self.message),
            (None, None) => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Per-document counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    /// Top-level questions
    pub total: usize,
    pub single_choice: usize,
    pub multi_choice: usize,
    pub group: usize,
    pub fill_in_blank: usize,
    /// Child questions across all parents
    pub children: usize,
    /// Top-level questions flagged `has_math`
    pub with_math: usize,
    /// Top-level questions referencing media
    pub with_media: usize,
    pub warnings: usize,
}

impl ParseStats {
    /// Tallies the given questions.
    pub fn collect(questions: &[Question], warnings: usize) -> Self {
        let mut stats = ParseStats {
            total: questions.len(),
            warnings,
            ..Default::default()
        };

        for question in questions {
            match question.question_type {
                QuestionType::SingleChoice => stats.single_choice += 1,
                QuestionType::MultiChoice => stats.multi_choice += 1,
                QuestionType::Group => stats.group += 1,
                QuestionType::FillInBlank => stats.fill_in_blank += 1,
            }
            stats.children += question.child_questions.len();
            if question.has_math {
                stats.with_math += 1;
            }
            if !question.media.is_empty() {
                stats.with_media += 1;
            }
        }

        stats
    }
}

/// Result of parsing one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub questions: Vec<Question>,
    pub warnings: Vec<Warning>,
    pub stats: ParseStats,
}

impl ParseReport {
    /// Builds a report, computing statistics.
    pub fn new(questions: Vec<Question>, warnings: Vec<Warning>) -> Self {
        let stats = ParseStats::collect(&questions, warnings.len());
        Self {
            questions,
            warnings,
            stats,
        }
    }

    /// Returns true if nothing needs manual review.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Returns warnings of the given kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    /// Serializes the question list (the downstream contract) as JSON.
    pub fn questions_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.questions)?)
    }

    /// Serializes the whole report as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

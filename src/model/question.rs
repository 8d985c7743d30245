//! Question bank entities.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Structural kind of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// At most one option marked correct
    SingleChoice,
    /// Two or more options marked correct
    MultiChoice,
    /// Shared stem with child questions
    Group,
    /// Shared stem with numbered blanks, one child question per blank
    FillInBlank,
}

impl QuestionType {
    /// Returns true for the two shapes that own child questions.
    pub fn is_parent(&self) -> bool {
        matches!(self, QuestionType::Group | QuestionType::FillInBlank)
    }

    /// Types a plain question by its number of correct options.
    pub fn from_correct_count(count: usize) -> Self {
        if count >= 2 {
            QuestionType::MultiChoice
        } else {
            QuestionType::SingleChoice
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultiChoice => "multi-choice",
            QuestionType::Group => "group",
            QuestionType::FillInBlank => "fill-in-blank",
        };
        f.write_str(name)
    }
}

/// An answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Unique identifier
    pub id: Uuid,
    /// Position in the option list (A = 0, B = 1, ...)
    pub order: usize,
    /// Option text with the letter prefix removed
    pub content: String,
    /// Whether the option is marked correct
    pub is_correct: bool,
}

/// Kind of an inline media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
}

/// An inline `[audio: ...]` / `[image: ...]` reference found in question text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub path: String,
}

/// A parsed question.
///
/// `answers`, `child_questions`, `blanks` and `media` always serialize as
/// arrays, empty when not applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier
    pub id: Uuid,
    /// Question shape
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Stem text (for parents, any text preceding the shared stem)
    pub content: String,
    /// Competency tag, e.g. `CLO1`
    pub clo: Option<String>,
    /// Answer options (empty for parents)
    pub answers: Vec<Answer>,
    /// Shared stem (parents only)
    pub group_content: Option<String>,
    /// Child questions (parents only)
    pub child_questions: Vec<Question>,
    /// Whether math notation appears in this question
    pub has_math: bool,
    /// Number taken from the child-index marker (children only)
    pub number: Option<u32>,
    /// Blank placeholder indices in display order (fill-in-blank only)
    pub blanks: Vec<u32>,
    /// Media referenced from the question text
    pub media: Vec<MediaRef>,
}

impl Question {
    /// Returns the options marked correct.
    pub fn correct_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|a| a.is_correct)
    }

    /// Returns the number of options marked correct.
    pub fn correct_count(&self) -> usize {
        self.correct_answers().count()
    }

    /// Returns true if this question owns child questions.
    pub fn is_parent(&self) -> bool {
        self.question_type.is_parent()
    }
}

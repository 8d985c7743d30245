//! Error types for quizbank library.
//!
//! Only unrecoverable problems surface here. Malformed blocks, dangling math
//! spans and unmarked answers are reported as [`crate::model::Warning`]s in
//! the parse report instead.

use thiserror::Error;

/// Result type alias for quizbank operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for quizbank library.
#[derive(Error, Debug)]
pub enum Error {
    /// The document yielded no non-empty paragraphs.
    #[error("Document contains no paragraphs")]
    EmptyDocument,

    /// Caller input could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

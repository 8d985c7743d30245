//! Data model.
//!
//! Raw input as handed over by a document-access layer, the normalized
//! paragraph form consumed by the segmenter and parser, and the question
//! entities returned to callers.

mod paragraph;
mod question;
mod report;

pub use paragraph::*;
pub use question::*;
pub use report::*;

//! Query-context extraction from the conversation log.
//!
//! Keyword matching only: no language model is involved, and a false
//! positive (an unrelated 7-digit number, a synonym inside another word)
//! is an accepted cost of keeping the rules simple.

pub mod extractor;
pub mod keywords;

pub use extractor::{extract, ContextExtractor, DEFAULT_WINDOW_SIZE};

//! Filter module — ordered line rules and the capped relevance filter.

pub mod vocab;
pub mod rules;
pub mod engine;

pub use engine::{Excerpt, FilterOutcome, FilterPass, RelevanceFilter, RelevantLine};
pub use rules::{LineRecord, LineRule, MatchRule, Provenance, RuleSet};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid vocabulary pattern: {0}")]
    InvalidVocabulary(String),
    #[error("Vocabulary must not be empty: {0}")]
    EmptyVocabulary(&'static str),
}

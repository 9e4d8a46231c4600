//! Error types for the linking engine.
//!
//! None of these ever escape [`crate::AutolinkProcessor::process`]. They exist
//! so that each failing candidate can be logged with a precise reason and then
//! skipped.
use thiserror::Error;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum AutolinkError {
  #[error("Pattern error for literal '{literal}': {source}")]
  Pattern {
    literal: String,
    #[source]
    source:  Box<fancy_regex::Error>,
  },

  #[error("Could not resolve link for {kind} {id}: {reason}")]
  Resolve {
    kind:   &'static str,
    id:     u64,
    reason: String,
  },

  #[error("Invalid protected tag name: '{0}'")]
  InvalidTag(String),

  #[error("Candidate data error: {0}")]
  Candidates(#[from] serde_json::Error),
}

impl AutolinkError {
  pub(crate) fn pattern(literal: &str, source: fancy_regex::Error) -> Self {
    Self::Pattern {
      literal: literal.to_string(),
      source:  Box::new(source),
    }
  }
}

/// Result type for engine operations.
pub type AutolinkResult<T> = Result<T, AutolinkError>;

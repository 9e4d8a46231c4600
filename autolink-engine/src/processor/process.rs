//! High-level processing functions with error recovery.
use std::any::Any;

use log::error;

use super::types::{
  AutolinkProcessor,
  LinkResult,
  ProcessingContext,
  RunConfig,
};
use crate::candidates::CandidateSource;

/// Process content, falling back to the unmodified text if anything panics.
///
/// Content linking sits on a rendering path, so losing the links is always
/// preferable to losing the page.
///
/// # Arguments
///
/// * `processor` - The configured linking processor
/// * `text` - The HTML content to process
/// * `source` - Candidate keywords, posts and terms
/// * `context` - The document being processed
///
/// # Returns
///
/// A `LinkResult` with the processed HTML and the links that were inserted
#[must_use]
pub fn process_with_recovery<S: CandidateSource + ?Sized>(
  processor: &AutolinkProcessor,
  text: &str,
  source: &S,
  context: &ProcessingContext,
) -> LinkResult {
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    processor.render(text, source, context)
  })) {
    Ok(result) => result,
    Err(payload) => {
      error!(
        "Link processing panicked, keeping the original content: {}",
        panic_message(payload.as_ref())
      );
      LinkResult {
        html: text.to_string(),
        ..LinkResult::default()
      }
    },
  }
}

/// Text of a panic payload raised with `panic!("...")`.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
  payload
    .downcast_ref::<String>()
    .map(String::as_str)
    .or_else(|| payload.downcast_ref::<&str>().copied())
    .unwrap_or("unknown panic payload")
}

/// Link one piece of content in a single call.
///
/// Convenience wrapper that builds a processor for `config` and runs it with
/// recovery.
#[must_use]
pub fn process<S: CandidateSource + ?Sized>(
  text: &str,
  config: RunConfig,
  source: &S,
  context: &ProcessingContext,
) -> String {
  let processor = AutolinkProcessor::new(config);
  process_with_recovery(&processor, text, source, context).html
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use super::*;
  use crate::candidates::{CandidateSet, LinkRule};

  fn rust_rule() -> CandidateSet {
    CandidateSet {
      keywords: vec![LinkRule::new("Rust", "/rust", false)],
      ..CandidateSet::default()
    }
  }

  #[test]
  fn test_process_convenience() {
    let html = process(
      "Rust is fun",
      RunConfig::default(),
      &rust_rule(),
      &ProcessingContext::default(),
    );
    assert_eq!(html, "<a href=\"/rust\">Rust</a> is fun");
  }

  #[test]
  #[allow(clippy::panic)]
  fn test_panic_message() {
    let owned = std::panic::catch_unwind(|| panic!("bad {}", 1)).unwrap_err();
    assert_eq!(panic_message(owned.as_ref()), "bad 1");
    let literal = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
    assert_eq!(panic_message(literal.as_ref()), "static");
  }
}

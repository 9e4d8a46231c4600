//! Core implementation of the linking processor.
//!
//! Pipeline: shield protected regions, run the keyword, post and term stages
//! against one shared budget, restore, then rewrite external anchors.
use log::{debug, trace};

use super::{
  passes::Run,
  types::{AutolinkProcessor, LinkResult, ProcessingContext, RunConfig},
};
use crate::{
  candidates::CandidateSource,
  postprocess::add_external_link_attributes,
  shield::{ProtectedTags, shield},
  utils::{host_of, same_target},
};

impl Default for AutolinkProcessor {
  fn default() -> Self {
    Self::new(RunConfig::default())
  }
}

impl AutolinkProcessor {
  /// Create a new `AutolinkProcessor` with the given configuration.
  #[must_use]
  pub fn new(config: RunConfig) -> Self {
    let tags = config.protected_tags();
    Self { config, tags }
  }

  /// Access the run configuration.
  #[must_use]
  pub const fn config(&self) -> &RunConfig {
    &self.config
  }

  /// The protected tag set derived from the configuration.
  #[must_use]
  pub const fn protected_tags(&self) -> &ProtectedTags {
    &self.tags
  }

  /// Whether the document described by `context` is excluded from linking.
  #[must_use]
  pub fn is_ignored_document(&self, context: &ProcessingContext) -> bool {
    self.config.ignore_documents.iter().any(|entry| {
      let entry = entry.trim();
      context
        .document_id
        .is_some_and(|id| entry == id.to_string())
        || context
          .own_url
          .as_deref()
          .is_some_and(|url| same_target(url, entry))
    })
  }

  /// Insert links into `text` and return the new content.
  ///
  /// Never fails: in the worst case the input comes back unchanged.
  #[must_use]
  pub fn process<S: CandidateSource + ?Sized>(
    &self,
    text: &str,
    source: &S,
    context: &ProcessingContext,
  ) -> String {
    self.render(text, source, context).html
  }

  /// Insert links into `text` and report what was linked.
  #[must_use]
  pub fn render<S: CandidateSource + ?Sized>(
    &self,
    text: &str,
    source: &S,
    context: &ProcessingContext,
  ) -> LinkResult {
    if text.trim().is_empty() {
      return LinkResult {
        html: text.to_string(),
        ..LinkResult::default()
      };
    }

    if self.is_ignored_document(context) {
      debug!(
        "Document {:?} is on the ignore list, leaving it untouched",
        context.own_url
      );
      return LinkResult {
        html: text.to_string(),
        ..LinkResult::default()
      };
    }

    let mut run = Run::new(&self.config, context, shield(text, &self.tags));

    if self.config.link_keywords {
      run.keyword_stage(source);
    }
    if self.config.link_posts {
      run.post_stage(source);
    }
    if self.config.link_terms {
      run.term_stage(source);
    }

    let (mut html, links, total_inserted) = run.finish();
    trace!("Inserted {total_inserted} link(s)");

    if self.config.open_in_new_tab || self.config.nofollow {
      let own_host = context.own_url.as_deref().and_then(host_of);
      html =
        add_external_link_attributes(&html, own_host.as_deref(), &self.config);
    }

    LinkResult {
      html,
      links,
      total_inserted,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    candidates::{CandidateSet, LinkRule},
    processor::types::RunConfigBuilder,
  };

  fn keywords(rules: &[(&str, &str)]) -> CandidateSet {
    CandidateSet {
      keywords: rules
        .iter()
        .map(|(name, target)| LinkRule::new(*name, *target, false))
        .collect(),
      ..CandidateSet::default()
    }
  }

  #[test]
  fn test_empty_text_untouched() {
    let processor = AutolinkProcessor::default();
    let result = processor.render(
      "   ",
      &keywords(&[("x", "/x")]),
      &ProcessingContext::default(),
    );
    assert_eq!(result.html, "   ");
    assert_eq!(result.total_inserted, 0);
  }

  #[test]
  fn test_ignored_document_by_url_and_id() {
    let processor = AutolinkProcessor::new(
      RunConfigBuilder::new()
        .ignore_documents(["https://site.test/skip/", "42"])
        .build(),
    );
    let set = keywords(&[("Rust", "/rust")]);

    let by_url = ProcessingContext::for_url("https://site.test/skip");
    assert_eq!(processor.process("Rust", &set, &by_url), "Rust");

    let by_id = ProcessingContext::default().with_id(42);
    assert_eq!(processor.process("Rust", &set, &by_id), "Rust");

    let other = ProcessingContext::for_url("https://site.test/other");
    assert_eq!(
      processor.process("Rust", &set, &other),
      "<a href=\"/rust\">Rust</a>"
    );
  }

  #[test]
  fn test_stage_toggles() {
    let processor = AutolinkProcessor::new(
      RunConfigBuilder::new().stages(false, true, true).build(),
    );
    let set = keywords(&[("Rust", "/rust")]);
    assert_eq!(
      processor.process("Rust", &set, &ProcessingContext::default()),
      "Rust"
    );
  }

  #[test]
  fn test_processor_default_protects_headings() {
    let processor = AutolinkProcessor::default();
    assert!(processor.protected_tags().contains("h3"));
    assert!(processor.protected_tags().contains("figcaption"));
  }
}

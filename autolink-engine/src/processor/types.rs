//! Type definitions for the linking processor.
//!
//! Contains the run configuration (`RunConfig` and its builder), the
//! per-document `ProcessingContext`, and the result types returned by
//! [`AutolinkProcessor::render`].
//!
//! # Examples
//!
//! ```
//! use autolink_engine::{AutolinkProcessor, RunConfig};
//!
//! let config = RunConfig {
//!   max_total_links: 5,
//!   nofollow: true,
//!   ..Default::default()
//! };
//!
//! let processor = AutolinkProcessor::new(config);
//! ```

use serde::{Deserialize, Serialize};

use crate::shield::ProtectedTags;

/// Map a possibly negative limit from user configuration to an engine limit.
///
/// Negative values become `0`, which every limit treats as unlimited.
#[must_use]
pub fn clamp_limit(value: i64) -> usize {
  usize::try_from(value).unwrap_or(0)
}

/// Options for one linking run. Read-only once processing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct RunConfig {
  /// Maximum links inserted per document, `0` for unlimited.
  pub max_total_links: usize,

  /// Maximum substitutions made by one rule, `0` for unlimited.
  pub max_links_per_rule: usize,

  /// Maximum links pointing at the same URL, `0` for unlimited.
  pub max_links_per_target: usize,

  /// Match literals with exact case.
  pub case_sensitive: bool,

  /// Link each destination at most once, and each rule at most once.
  pub prevent_duplicate_links: bool,

  /// Add `target="_blank"` to external links.
  pub open_in_new_tab: bool,

  /// Add `rel="nofollow"` to external links.
  pub nofollow: bool,

  /// Never link inside `h1`..`h6`.
  pub protect_headings: bool,

  /// Never link inside `figcaption`.
  pub protect_captions: bool,

  /// Additional element names to protect, e.g. `code` or `pre`.
  pub extra_protected_tags: Vec<String>,

  /// Literals that are never linked.
  pub ignore_list: Vec<String>,

  /// Unicode-aware word boundaries.
  pub utf8: bool,

  /// Run the custom keyword stage.
  pub link_keywords: bool,

  /// Run the post-title stage.
  pub link_posts: bool,

  /// Run the taxonomy-term stage.
  pub link_terms: bool,

  /// Emit a `title` attribute carrying the linked text on inserted anchors.
  pub title_attribute: bool,

  /// URLs or ids of documents that are returned untouched.
  pub ignore_documents: Vec<String>,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      max_total_links:         3,
      max_links_per_rule:      1,
      max_links_per_target:    0,
      case_sensitive:          false,
      prevent_duplicate_links: false,
      open_in_new_tab:         false,
      nofollow:                false,
      protect_headings:        true,
      protect_captions:        true,
      extra_protected_tags:    Vec::new(),
      ignore_list:             Vec::new(),
      utf8:                    true,
      link_keywords:           true,
      link_posts:              true,
      link_terms:              true,
      title_attribute:         false,
      ignore_documents:        Vec::new(),
    }
  }
}

impl RunConfig {
  /// The protected tag set described by this configuration.
  #[must_use]
  pub fn protected_tags(&self) -> ProtectedTags {
    ProtectedTags::new(self.protect_headings, self.protect_captions)
      .with_extra(&self.extra_protected_tags)
  }

  /// Per-rule substitution cap, `None` when unlimited.
  #[must_use]
  pub const fn per_rule_cap(&self) -> Option<usize> {
    if self.prevent_duplicate_links {
      Some(1)
    } else if self.max_links_per_rule == 0 {
      None
    } else {
      Some(self.max_links_per_rule)
    }
  }

  /// Whether `literal` is on the ignore list. The comparison honours
  /// `case_sensitive` (or the rule's own flag passed in).
  #[must_use]
  pub fn is_ignored(&self, literal: &str, case_sensitive: bool) -> bool {
    let literal = literal.trim();
    self.ignore_list.iter().any(|ignored| {
      let ignored = ignored.trim();
      if case_sensitive {
        ignored == literal
      } else {
        ignored.to_lowercase() == literal.to_lowercase()
      }
    })
  }
}

/// The document being processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingContext {
  /// Id of the document in the candidate source, if it is one of the posts.
  pub document_id: Option<u64>,

  /// Canonical URL of the document.
  pub own_url: Option<String>,

  /// Title of the document.
  pub own_title: Option<String>,

  /// Targets already linked, in the order they were consumed.
  pub consumed_targets: Vec<String>,
}

impl ProcessingContext {
  /// Context for a document at `url`.
  #[must_use]
  pub fn for_url(url: impl Into<String>) -> Self {
    Self {
      own_url: Some(url.into()),
      ..Self::default()
    }
  }

  /// Set the document id.
  #[must_use]
  pub const fn with_id(mut self, id: u64) -> Self {
    self.document_id = Some(id);
    self
  }

  /// Set the document title.
  #[must_use]
  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.own_title = Some(title.into());
    self
  }

  /// Seed the consumed targets.
  #[must_use]
  pub fn with_consumed<I, S>(mut self, targets: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.consumed_targets.extend(targets.into_iter().map(Into::into));
    self
  }
}

/// Pipeline stage that produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStage {
  Keyword,
  Post,
  Term,
}

/// One literal linked during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedLink {
  pub stage:   LinkStage,
  pub literal: String,
  pub target:  String,
  /// Number of occurrences that were linked.
  pub count:   usize,
}

/// Result of a linking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
  /// The processed content.
  pub html: String,

  /// Links inserted, in insertion order.
  pub links: Vec<InsertedLink>,

  /// Total number of anchors inserted.
  pub total_inserted: usize,
}

/// Builder for constructing `RunConfig` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
  config: RunConfig,
}

impl RunConfigBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the global link ceiling. Negative values mean unlimited.
  #[must_use]
  pub fn max_total_links(mut self, limit: i64) -> Self {
    self.config.max_total_links = clamp_limit(limit);
    self
  }

  /// Set the per-rule cap. Negative values mean unlimited.
  #[must_use]
  pub fn max_links_per_rule(mut self, limit: i64) -> Self {
    self.config.max_links_per_rule = clamp_limit(limit);
    self
  }

  /// Set the per-target ceiling. Negative values mean unlimited.
  #[must_use]
  pub fn max_links_per_target(mut self, limit: i64) -> Self {
    self.config.max_links_per_target = clamp_limit(limit);
    self
  }

  #[must_use]
  pub const fn case_sensitive(mut self, enabled: bool) -> Self {
    self.config.case_sensitive = enabled;
    self
  }

  #[must_use]
  pub const fn prevent_duplicate_links(mut self, enabled: bool) -> Self {
    self.config.prevent_duplicate_links = enabled;
    self
  }

  #[must_use]
  pub const fn open_in_new_tab(mut self, enabled: bool) -> Self {
    self.config.open_in_new_tab = enabled;
    self
  }

  #[must_use]
  pub const fn nofollow(mut self, enabled: bool) -> Self {
    self.config.nofollow = enabled;
    self
  }

  #[must_use]
  pub const fn protect_headings(mut self, enabled: bool) -> Self {
    self.config.protect_headings = enabled;
    self
  }

  #[must_use]
  pub const fn protect_captions(mut self, enabled: bool) -> Self {
    self.config.protect_captions = enabled;
    self
  }

  /// Protect additional element names.
  #[must_use]
  pub fn extra_protected_tags<I, S>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.config.extra_protected_tags = tags.into_iter().map(Into::into).collect();
    self
  }

  /// Set the literals that are never linked.
  #[must_use]
  pub fn ignore_list<I, S>(mut self, literals: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.config.ignore_list = literals.into_iter().map(Into::into).collect();
    self
  }

  #[must_use]
  pub const fn utf8(mut self, enabled: bool) -> Self {
    self.config.utf8 = enabled;
    self
  }

  /// Enable or disable the keyword, post and term stages.
  #[must_use]
  pub const fn stages(mut self, keywords: bool, posts: bool, terms: bool) -> Self {
    self.config.link_keywords = keywords;
    self.config.link_posts = posts;
    self.config.link_terms = terms;
    self
  }

  #[must_use]
  pub const fn title_attribute(mut self, enabled: bool) -> Self {
    self.config.title_attribute = enabled;
    self
  }

  /// Set the documents that are never processed.
  #[must_use]
  pub fn ignore_documents<I, S>(mut self, documents: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.config.ignore_documents = documents.into_iter().map(Into::into).collect();
    self
  }

  /// Build the final `RunConfig`.
  #[must_use]
  pub fn build(self) -> RunConfig {
    self.config
  }
}

/// The linking processor. Holds only the read-only configuration, so one
/// instance can serve any number of documents, including from several threads
/// at once.
#[derive(Debug, Clone)]
pub struct AutolinkProcessor {
  pub(crate) config: RunConfig,
  pub(crate) tags:   ProtectedTags,
}

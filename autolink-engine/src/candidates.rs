//! Candidate literals supplied to the linking passes.
//!
//! Retrieving and caching candidates is the caller's business. The engine
//! only consumes the ordered lists through [`CandidateSource`], and treats a
//! failed link resolution as "skip this candidate".
use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AutolinkError, AutolinkResult};

/// One literal phrase mapped to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRule {
  pub name:           String,
  pub target:         String,
  #[serde(default)]
  pub case_sensitive: bool,
}

impl LinkRule {
  pub fn new(
    name: impl Into<String>,
    target: impl Into<String>,
    case_sensitive: bool,
  ) -> Self {
    Self {
      name: name.into(),
      target: target.into(),
      case_sensitive,
    }
  }
}

/// A post whose title may be linked to its permalink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCandidate {
  pub id:        u64,
  pub title:     String,
  #[serde(default = "default_post_type")]
  pub post_type: String,
  #[serde(default)]
  pub permalink: Option<String>,
}

fn default_post_type() -> String {
  "post".to_string()
}

/// A taxonomy term whose name may be linked to its archive page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCandidate {
  pub id:       u64,
  pub name:     String,
  #[serde(default)]
  pub taxonomy: String,
  #[serde(default)]
  pub link:     Option<String>,
}

/// Supplies ranked candidates and resolves their destinations.
pub trait CandidateSource {
  /// Explicit keyword mappings, highest priority first.
  fn keyword_rules(&self) -> &[LinkRule];

  /// Linkable posts, in the order they should be tried.
  fn posts(&self) -> &[PostCandidate];

  /// Linkable taxonomy terms, in the order they should be tried.
  fn terms(&self) -> &[TermCandidate];

  /// Resolve the permalink of a post.
  ///
  /// # Errors
  ///
  /// Returns [`AutolinkError::Resolve`] when the post has no usable link.
  fn permalink(&self, post: &PostCandidate) -> AutolinkResult<String>;

  /// Resolve the archive link of a term.
  ///
  /// # Errors
  ///
  /// Returns [`AutolinkError::Resolve`] when the term has no usable link.
  fn term_link(&self, term: &TermCandidate) -> AutolinkResult<String>;
}

/// Plain in-memory candidate lists, typically loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateSet {
  pub keywords: Vec<LinkRule>,
  pub posts:    Vec<PostCandidate>,
  pub terms:    Vec<TermCandidate>,
}

impl CandidateSet {
  /// Parse a candidate set from JSON.
  ///
  /// # Errors
  ///
  /// Returns an error if the JSON does not describe a candidate set.
  pub fn from_json_str(json: &str) -> AutolinkResult<Self> {
    Ok(serde_json::from_str(json)?)
  }

  /// Apply the conventional candidate filtering and ordering.
  ///
  /// Posts whose type is not in `post_types` (when non-empty) and titles
  /// shorter than `min_title_length` characters are dropped. Posts and terms
  /// are then ordered longest literal first so specific phrases are linked
  /// before shorter phrases they contain. Keyword order is left as entered.
  #[must_use]
  pub fn prepare(mut self, min_title_length: usize, post_types: &[String]) -> Self {
    let enabled: HashSet<&str> = post_types.iter().map(String::as_str).collect();

    self.posts.retain(|post| {
      (enabled.is_empty() || enabled.contains(post.post_type.as_str()))
        && post.title.trim().chars().count() >= min_title_length
    });
    self
      .terms
      .retain(|term| term.name.trim().chars().count() >= min_title_length);

    self
      .posts
      .sort_by_key(|post| std::cmp::Reverse(post.title.trim().chars().count()));
    self
      .terms
      .sort_by_key(|term| std::cmp::Reverse(term.name.trim().chars().count()));
    self
  }

  /// Append keyword rules, e.g. from [`parse_keyword_lines`].
  pub fn extend_keywords<I: IntoIterator<Item = LinkRule>>(&mut self, rules: I) {
    self.keywords.extend(rules);
  }
}

fn resolved(
  link: Option<&String>,
  kind: &'static str,
  id: u64,
) -> AutolinkResult<String> {
  match link.map(|l| l.trim()) {
    Some(link) if !link.is_empty() => Ok(link.to_string()),
    _ => {
      Err(AutolinkError::Resolve {
        kind,
        id,
        reason: "missing link".to_string(),
      })
    },
  }
}

impl CandidateSource for CandidateSet {
  fn keyword_rules(&self) -> &[LinkRule] {
    &self.keywords
  }

  fn posts(&self) -> &[PostCandidate] {
    &self.posts
  }

  fn terms(&self) -> &[TermCandidate] {
    &self.terms
  }

  fn permalink(&self, post: &PostCandidate) -> AutolinkResult<String> {
    resolved(post.permalink.as_ref(), "post", post.id)
  }

  fn term_link(&self, term: &TermCandidate) -> AutolinkResult<String> {
    resolved(term.link.as_ref(), "term", term.id)
  }
}

/// Parse keyword mappings written one per line as `kw1, kw2, ..., url`.
///
/// Every keyword on a line maps to the URL in the last position. Blank lines
/// and lines starting with `#` are ignored; lines that do not contain at
/// least one keyword and a URL are skipped with a warning.
#[must_use]
pub fn parse_keyword_lines(text: &str, case_sensitive: bool) -> Vec<LinkRule> {
  let mut rules = Vec::new();

  for (index, line) in text.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let parts: Vec<&str> = line
      .split(',')
      .map(str::trim)
      .filter(|part| !part.is_empty())
      .collect();

    let Some((target, keywords)) = parts.split_last() else {
      continue;
    };
    if keywords.is_empty() {
      warn!("Skipping keyword line {}: no keywords before URL", index + 1);
      continue;
    }

    rules.extend(
      keywords
        .iter()
        .map(|keyword| LinkRule::new(*keyword, *target, case_sensitive)),
    );
  }

  rules
}

//! Protection of HTML regions that must never receive new links.
//!
//! Anchors, scripts and styles (and optionally headings, captions and any
//! extra tags) are swapped out for opaque comment tokens before the linking
//! passes run, then swapped back in verbatim afterwards.
//!
//! ```
//! use autolink_engine::shield::{ProtectedTags, restore, shield};
//!
//! let html = r#"<a href="/x">WordPress</a> and WordPress"#;
//! let shielded = shield(html, &ProtectedTags::default());
//! assert!(!shielded.as_str().contains("<a href"));
//!
//! let (text, map) = shielded.into_parts();
//! assert_eq!(restore(&text, &map), html);
//! ```
use std::collections::HashSet;

use log::{trace, warn};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::AutolinkError;

/// Tags that are always protected.
const BASE_TAGS: [&str; 3] = ["a", "script", "style"];

/// Heading tags, protected when headings are excluded from linking.
const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

const TOKEN_PREFIX: &str = "<!--autolink:";
const TOKEN_SUFFIX: &str = "-->";

/// The set of element names whose full extent is shielded, along with the
/// scan pattern compiled from it.
#[derive(Debug, Clone)]
pub struct ProtectedTags {
  tags:    Vec<String>,
  pattern: Option<Regex>,
}

impl PartialEq for ProtectedTags {
  fn eq(&self, other: &Self) -> bool {
    self.tags == other.tags
  }
}

impl Eq for ProtectedTags {}

impl Default for ProtectedTags {
  fn default() -> Self {
    Self::new(false, false)
  }
}

impl ProtectedTags {
  /// Build the tag set from the heading and caption toggles.
  #[must_use]
  pub fn new(protect_headings: bool, protect_captions: bool) -> Self {
    let mut tags: Vec<String> =
      BASE_TAGS.iter().map(|t| (*t).to_string()).collect();
    if protect_headings {
      tags.extend(HEADING_TAGS.iter().map(|t| (*t).to_string()));
    }
    if protect_captions {
      tags.push("figcaption".to_string());
    }
    let pattern = compile(&tags);
    Self { tags, pattern }
  }

  /// Add extra tag names. Names that are not plain ASCII alphanumerics are
  /// dropped with a warning, duplicates are ignored.
  #[must_use]
  pub fn with_extra<I, S>(mut self, extra: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let before = self.tags.len();
    for tag in extra {
      match validate_tag(tag.as_ref()) {
        Ok(tag) => {
          if !self.tags.contains(&tag) {
            self.tags.push(tag);
          }
        },
        Err(e) => warn!("Ignoring protected tag: {e}"),
      }
    }
    if self.tags.len() != before {
      self.pattern = compile(&self.tags);
    }
    self
  }

  /// Protected tag names, lower-cased.
  #[must_use]
  pub fn tags(&self) -> &[String] {
    &self.tags
  }

  /// Whether the given tag name is protected.
  #[must_use]
  pub fn contains(&self, tag: &str) -> bool {
    self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
  }

  /// The compiled scan for every protected element.
  #[must_use]
  pub const fn pattern(&self) -> Option<&Regex> {
    self.pattern.as_ref()
  }
}

/// Non-greedy, dot-matches-newline scan for every protected element
/// including its content up to the matching closing tag.
fn compile(tags: &[String]) -> Option<Regex> {
  if tags.is_empty() {
    return None;
  }
  let alternatives = tags
    .iter()
    .map(|tag| format!(r"<{tag}(?:\s[^>]*)?>.*?</{tag}\s*>"))
    .collect::<Vec<_>>()
    .join("|");

  Regex::new(&format!("(?is){alternatives}"))
    .map_err(|e| warn!("Failed to compile shield pattern: {e}"))
    .ok()
}

fn validate_tag(tag: &str) -> Result<String, AutolinkError> {
  let tag = tag.trim();
  if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
    return Err(AutolinkError::InvalidTag(tag.to_string()));
  }
  Ok(tag.to_ascii_lowercase())
}

/// A shielded region: the placeholder that replaced it and its original
/// markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedFragment {
  pub token:    String,
  pub original: String,
}

/// Fragments registered during one shielding, in registration order.
pub type RestoreMap = Vec<ProtectedFragment>;

/// Placeholder token for a fragment, keyed by its content hash.
#[must_use]
pub fn placeholder_token(fragment: &str) -> String {
  let digest = Sha256::digest(fragment.as_bytes());
  format!(
    "{TOKEN_PREFIX}{}{TOKEN_SUFFIX}",
    hex::encode(&digest[..16])
  )
}

/// Text with its protected regions replaced by placeholder tokens.
#[derive(Debug, Clone, Default)]
pub struct ShieldedText {
  text:      String,
  fragments: RestoreMap,
  known:     HashSet<String>,
}

impl ShieldedText {
  /// The current shielded text.
  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.text
  }

  /// Replace the shielded text, keeping the registered fragments.
  pub fn set_text(&mut self, text: String) {
    self.text = text;
  }

  /// Registered fragments.
  #[must_use]
  pub fn fragments(&self) -> &[ProtectedFragment] {
    &self.fragments
  }

  /// Register a fragment and return the token that stands in for it.
  ///
  /// Identical fragments share one token.
  pub fn protect(&mut self, fragment: &str) -> String {
    let token = placeholder_token(fragment);
    if self.known.insert(token.clone()) {
      self.fragments.push(ProtectedFragment {
        token:    token.clone(),
        original: fragment.to_string(),
      });
    }
    token
  }

  /// Split into the shielded text and its restore map.
  #[must_use]
  pub fn into_parts(self) -> (String, RestoreMap) {
    (self.text, self.fragments)
  }

  /// Put every protected fragment back.
  #[must_use]
  pub fn restore(self) -> String {
    restore(&self.text, &self.fragments)
  }
}

/// Replace every protected element in `text` with a placeholder token.
#[must_use]
pub fn shield(text: &str, tags: &ProtectedTags) -> ShieldedText {
  let mut shielded = ShieldedText::default();

  let Some(pattern) = tags.pattern() else {
    shielded.text = text.to_string();
    return shielded;
  };

  let mut output = String::with_capacity(text.len());
  let mut last = 0;
  for found in pattern.find_iter(text) {
    output.push_str(&text[last..found.start()]);
    let token = shielded.protect(found.as_str());
    output.push_str(&token);
    last = found.end();
  }
  output.push_str(&text[last..]);

  trace!("Shielded {} protected fragment(s)", shielded.fragments.len());
  shielded.text = output;
  shielded
}

/// Substitute every placeholder in `text` back to its original fragment.
#[must_use]
pub fn restore(text: &str, fragments: &[ProtectedFragment]) -> String {
  let mut restored = text.to_string();
  for fragment in fragments.iter().rev() {
    if restored.contains(&fragment.token) {
      restored = restored.replace(&fragment.token, &fragment.original);
    }
  }
  restored
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_tags() {
    let tags = ProtectedTags::default();
    assert_eq!(tags.tags(), ["a", "script", "style"]);
    assert!(!tags.contains("h1"));
  }

  #[test]
  fn test_optional_tags() {
    let tags = ProtectedTags::new(true, true);
    assert!(tags.contains("h1"));
    assert!(tags.contains("H6"));
    assert!(tags.contains("figcaption"));
  }

  #[test]
  fn test_extra_tags_are_validated() {
    let tags =
      ProtectedTags::default().with_extra(["code", "PRE", "bad tag", "", "a"]);
    assert!(tags.contains("code"));
    assert!(tags.contains("pre"));
    assert!(!tags.contains("bad tag"));
    assert_eq!(tags.tags().iter().filter(|t| *t == "a").count(), 1);
  }

  #[test]
  fn test_extra_tags_are_shielded() {
    let tags = ProtectedTags::default().with_extra(["code"]);
    let html = "<p>Use <code>Rust</code> daily</p>";
    let shielded = shield(html, &tags);
    assert!(!shielded.as_str().contains("Rust"));
    assert_eq!(shielded.restore(), html);
  }

  #[test]
  fn test_pattern_is_compiled_once() {
    let tags = ProtectedTags::new(true, false);
    let first = tags.pattern().map(std::ptr::from_ref);
    let second = tags.pattern().map(std::ptr::from_ref);
    assert!(first.is_some());
    assert_eq!(first, second);

    // Equality only looks at the tag names
    assert_eq!(tags.clone().with_extra(["h1"]), tags);
  }

  #[test]
  fn test_shield_anchor_and_script() {
    let html = "<p>Before <a href=\"/x\">link</a> mid \
                <script>var a = 'WordPress';</script> after</p>";
    let shielded = shield(html, &ProtectedTags::default());

    assert!(!shielded.as_str().contains("<a href"));
    assert!(!shielded.as_str().contains("WordPress"));
    assert_eq!(shielded.fragments().len(), 2);
    assert_eq!(shielded.restore(), html);
  }

  #[test]
  fn test_shield_multiline_and_case() {
    let html = "x <A HREF=\"/y\">\nmulti\nline\n</A> y <STYLE>p{}</STYLE>";
    let shielded = shield(html, &ProtectedTags::default());
    assert!(!shielded.as_str().contains("multi"));
    assert!(!shielded.as_str().contains("p{}"));
    assert_eq!(shielded.restore(), html);
  }

  #[test]
  fn test_shield_does_not_swallow_similar_tags() {
    // <abbr> and <article> start with "a" but are not anchors
    let html = "<abbr title=\"x\">WP</abbr> <article>text</article>";
    let shielded = shield(html, &ProtectedTags::default());
    assert_eq!(shielded.as_str(), html);
    assert!(shielded.fragments().is_empty());
  }

  #[test]
  fn test_identical_fragments_share_token() {
    let html = "<a href=\"/x\">x</a> and <a href=\"/x\">x</a>";
    let shielded = shield(html, &ProtectedTags::default());
    assert_eq!(shielded.fragments().len(), 1);
    assert_eq!(shielded.restore(), html);
  }

  #[test]
  fn test_headings_only_when_enabled() {
    let html = "<h2>Heading</h2><p>Body</p>";
    let open = shield(html, &ProtectedTags::default());
    assert!(open.as_str().contains("Heading"));

    let closed = shield(html, &ProtectedTags::new(true, false));
    assert!(!closed.as_str().contains("Heading"));
    assert!(closed.as_str().contains("Body"));
  }

  #[test]
  fn test_protect_registers_new_fragment() {
    let mut shielded = shield("plain text", &ProtectedTags::default());
    let token = shielded.protect("<a href=\"/new\">plain</a>");
    assert!(token.starts_with(TOKEN_PREFIX));
    shielded.set_text(format!("{token} text"));
    assert_eq!(shielded.restore(), "<a href=\"/new\">plain</a> text");
  }

  #[test]
  fn test_placeholder_token_is_stable() {
    assert_eq!(placeholder_token("abc"), placeholder_token("abc"));
    assert_ne!(placeholder_token("abc"), placeholder_token("abd"));
  }
}

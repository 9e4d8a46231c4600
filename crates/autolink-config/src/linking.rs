use autolink_engine::{RunConfig, clamp_limit};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
  error::ConfigError,
  parse::{parse_bool, parse_i64, parse_list},
};

/// Linking behaviour, the `[linking]` table of the config file.
///
/// Limits are signed here because configuration files written for older
/// tools routinely use `-1` for "no limit". They are clamped into the
/// engine's [`RunConfig`], where `0` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct LinkingConfig {
  /// Maximum links inserted per document.
  pub max_total_links: i64,

  /// Maximum substitutions made by one keyword, title or term.
  pub max_links_per_rule: i64,

  /// Maximum links pointing at the same URL.
  pub max_links_per_target: i64,

  pub case_sensitive: bool,

  /// Link each destination at most once per document.
  pub prevent_duplicate_links: bool,

  /// Add `target="_blank"` to external links.
  pub open_in_new_tab: bool,

  /// Add `rel="nofollow"` to external links.
  pub nofollow: bool,

  pub protect_headings: bool,

  pub protect_captions: bool,

  /// Additional element names whose content is never linked.
  pub extra_protected_tags: Vec<String>,

  /// Keywords, titles and term names that are never linked.
  pub ignore_list: Vec<String>,

  /// Unicode-aware word boundaries.
  pub utf8: bool,

  pub link_keywords: bool,

  pub link_posts: bool,

  pub link_terms: bool,

  /// Add a `title` attribute to inserted anchors.
  pub title_attribute: bool,

  /// URLs or ids of documents that are copied through untouched.
  pub ignore_documents: Vec<String>,
}

impl Default for LinkingConfig {
  fn default() -> Self {
    let run = RunConfig::default();
    Self {
      max_total_links:         limit_to_i64(run.max_total_links),
      max_links_per_rule:      limit_to_i64(run.max_links_per_rule),
      max_links_per_target:    limit_to_i64(run.max_links_per_target),
      case_sensitive:          run.case_sensitive,
      prevent_duplicate_links: run.prevent_duplicate_links,
      open_in_new_tab:         run.open_in_new_tab,
      nofollow:                run.nofollow,
      protect_headings:        run.protect_headings,
      protect_captions:        run.protect_captions,
      extra_protected_tags:    run.extra_protected_tags,
      ignore_list:             run.ignore_list,
      utf8:                    run.utf8,
      link_keywords:           run.link_keywords,
      link_posts:              run.link_posts,
      link_terms:              run.link_terms,
      title_attribute:         run.title_attribute,
      ignore_documents:        run.ignore_documents,
    }
  }
}

fn limit_to_i64(limit: usize) -> i64 {
  i64::try_from(limit).unwrap_or(i64::MAX)
}

fn clamp_logged(name: &str, value: i64) -> usize {
  if value < 0 {
    warn!("linking.{name} = {value} is negative, treating it as unlimited");
  }
  clamp_limit(value)
}

impl LinkingConfig {
  /// Build the engine configuration, clamping negative limits to `0`.
  #[must_use]
  pub fn to_run_config(&self) -> RunConfig {
    let max_total_links = clamp_logged("max_total_links", self.max_total_links);
    let max_links_per_rule =
      clamp_logged("max_links_per_rule", self.max_links_per_rule);
    let max_links_per_target =
      clamp_logged("max_links_per_target", self.max_links_per_target);

    RunConfig {
      max_total_links,
      max_links_per_rule,
      max_links_per_target,
      case_sensitive:          self.case_sensitive,
      prevent_duplicate_links: self.prevent_duplicate_links,
      open_in_new_tab:         self.open_in_new_tab,
      nofollow:                self.nofollow,
      protect_headings:        self.protect_headings,
      protect_captions:        self.protect_captions,
      extra_protected_tags:    self.extra_protected_tags.clone(),
      ignore_list:             self.ignore_list.clone(),
      utf8:                    self.utf8,
      link_keywords:           self.link_keywords,
      link_posts:              self.link_posts,
      link_terms:              self.link_terms,
      title_attribute:         self.title_attribute,
      ignore_documents:        self.ignore_documents.clone(),
    }
  }

  /// Apply one `linking.<key>` override. `key` has the prefix removed.
  ///
  /// # Errors
  ///
  /// Returns an error for unknown keys and unparsable values.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    let full_key = format!("linking.{key}");
    match key {
      "max_total_links" => self.max_total_links = parse_i64(&full_key, value)?,
      "max_links_per_rule" => {
        self.max_links_per_rule = parse_i64(&full_key, value)?;
      },
      "max_links_per_target" => {
        self.max_links_per_target = parse_i64(&full_key, value)?;
      },
      "case_sensitive" => self.case_sensitive = parse_bool(&full_key, value)?,
      "prevent_duplicate_links" => {
        self.prevent_duplicate_links = parse_bool(&full_key, value)?;
      },
      "open_in_new_tab" => self.open_in_new_tab = parse_bool(&full_key, value)?,
      "nofollow" => self.nofollow = parse_bool(&full_key, value)?,
      "protect_headings" => {
        self.protect_headings = parse_bool(&full_key, value)?;
      },
      "protect_captions" => {
        self.protect_captions = parse_bool(&full_key, value)?;
      },
      "extra_protected_tags" => self.extra_protected_tags = parse_list(value),
      "ignore_list" => self.ignore_list = parse_list(value),
      "utf8" => self.utf8 = parse_bool(&full_key, value)?,
      "link_keywords" => self.link_keywords = parse_bool(&full_key, value)?,
      "link_posts" => self.link_posts = parse_bool(&full_key, value)?,
      "link_terms" => self.link_terms = parse_bool(&full_key, value)?,
      "title_attribute" => self.title_attribute = parse_bool(&full_key, value)?,
      "ignore_documents" => self.ignore_documents = parse_list(value),
      _ => return Err(ConfigError::UnknownKey(full_key)),
    }
    Ok(())
  }
}

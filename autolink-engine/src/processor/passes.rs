//! The three ordered linking stages and the state they share.
//!
//! A [`Run`] owns everything scoped to one document: the shielded text, the
//! link budget, the consumed targets and the log of inserted links. Each
//! stage walks its candidates in source order and funnels every eligible
//! literal through [`Run::apply`].
use log::{debug, trace, warn};

use super::types::{
  InsertedLink,
  LinkStage,
  ProcessingContext,
  RunConfig,
};
use crate::{
  budget::LinkBudget,
  candidates::CandidateSource,
  pattern::{self, PatternFlags},
  shield::{ShieldedText, placeholder_token},
  utils::{normalize_target, same_target},
};

/// State of one processing run.
pub(crate) struct Run<'a> {
  config:   &'a RunConfig,
  context:  &'a ProcessingContext,
  text:     ShieldedText,
  budget:   LinkBudget,
  consumed: Vec<String>,
  links:    Vec<InsertedLink>,
}

impl<'a> Run<'a> {
  pub(crate) fn new(
    config: &'a RunConfig,
    context: &'a ProcessingContext,
    text: ShieldedText,
  ) -> Self {
    Self {
      config,
      context,
      text,
      budget: LinkBudget::new(
        config.max_total_links,
        config.max_links_per_target,
      ),
      consumed: context
        .consumed_targets
        .iter()
        .map(|t| normalize_target(t))
        .collect(),
      links: Vec::new(),
    }
  }

  /// Restore the shielded text and hand back the inserted links.
  pub(crate) fn finish(self) -> (String, Vec<InsertedLink>, usize) {
    let total = self.budget.total_inserted();
    (self.text.restore(), self.links, total)
  }

  #[cfg(test)]
  pub(crate) const fn budget(&self) -> &LinkBudget {
    &self.budget
  }

  fn is_own_url(&self, target: &str) -> bool {
    self
      .context
      .own_url
      .as_deref()
      .is_some_and(|own| same_target(own, target))
  }

  fn is_own_title(&self, title: &str) -> bool {
    self.context.own_title.as_deref().is_some_and(|own| {
      let (own, title) = (own.trim(), title.trim());
      if self.config.case_sensitive {
        own == title
      } else {
        own.to_lowercase() == title.to_lowercase()
      }
    })
  }

  /// Custom keyword stage: explicit mappings, evaluated first.
  pub(crate) fn keyword_stage<S: CandidateSource + ?Sized>(&mut self, source: &S) {
    for rule in source.keyword_rules() {
      if self.budget.is_exhausted() {
        debug!("Link budget exhausted, ending keyword stage");
        break;
      }
      let case_sensitive = rule.case_sensitive || self.config.case_sensitive;
      if rule.name.trim().is_empty() || rule.target.trim().is_empty() {
        warn!("Skipping malformed keyword rule: {rule:?}");
        continue;
      }
      if self.is_own_url(&rule.target) {
        debug!("Skipping keyword '{}': links to this document", rule.name);
        continue;
      }
      if self.config.is_ignored(&rule.name, case_sensitive) {
        debug!("Skipping keyword '{}': on ignore list", rule.name);
        continue;
      }
      self.apply(
        LinkStage::Keyword,
        rule.name.trim(),
        &rule.target,
        case_sensitive,
      );
    }
  }

  /// Post-title stage: link post titles to their permalinks.
  pub(crate) fn post_stage<S: CandidateSource + ?Sized>(&mut self, source: &S) {
    for post in source.posts() {
      if self.budget.is_exhausted() {
        debug!("Link budget exhausted, ending post stage");
        break;
      }
      let title = post.title.trim();
      if title.is_empty() {
        debug!("Skipping post {}: empty title", post.id);
        continue;
      }
      if self.context.document_id == Some(post.id) {
        debug!("Skipping post {}: is this document", post.id);
        continue;
      }
      if self.is_own_title(title) {
        debug!("Skipping post '{title}': same title as this document");
        continue;
      }
      if self.config.is_ignored(title, self.config.case_sensitive) {
        debug!("Skipping post '{title}': on ignore list");
        continue;
      }
      let permalink = match source.permalink(post) {
        Ok(link) => link,
        Err(e) => {
          warn!("Skipping post '{title}': {e}");
          continue;
        },
      };
      if self.is_own_url(&permalink) {
        debug!("Skipping post '{title}': links to this document");
        continue;
      }
      self.apply(
        LinkStage::Post,
        title,
        &permalink,
        self.config.case_sensitive,
      );
    }
  }

  /// Taxonomy-term stage: link term names to their archive pages.
  pub(crate) fn term_stage<S: CandidateSource + ?Sized>(&mut self, source: &S) {
    for term in source.terms() {
      if self.budget.is_exhausted() {
        debug!("Link budget exhausted, ending term stage");
        break;
      }
      let name = term.name.trim();
      if name.is_empty() {
        debug!("Skipping term {}: empty name", term.id);
        continue;
      }
      if self.config.is_ignored(name, self.config.case_sensitive) {
        debug!("Skipping term '{name}': on ignore list");
        continue;
      }
      let link = match source.term_link(term) {
        Ok(link) => link,
        Err(e) => {
          warn!("Skipping term '{name}' ({}): {e}", term.taxonomy);
          continue;
        },
      };
      if self.is_own_url(&link) {
        debug!("Skipping term '{name}': links to this document");
        continue;
      }
      self.apply(LinkStage::Term, name, &link, self.config.case_sensitive);
    }
  }

  /// Link up to the allowed number of occurrences of `literal` to `target`.
  ///
  /// Returns the number of anchors inserted.
  pub(crate) fn apply(
    &mut self,
    stage: LinkStage,
    literal: &str,
    target: &str,
    case_sensitive: bool,
  ) -> usize {
    let normalized = normalize_target(target);
    if self.config.prevent_duplicate_links && self.consumed.contains(&normalized)
    {
      debug!("Skipping '{literal}': {target} is already linked");
      return 0;
    }

    let cap = match self.budget.cap_for(target, self.config.per_rule_cap()) {
      Some(0) => {
        debug!("Skipping '{literal}': no budget left for {target}");
        return 0;
      },
      Some(cap) => cap,
      None => usize::MAX,
    };

    let flags = PatternFlags {
      case_sensitive,
      utf8: self.config.utf8,
    };
    let pattern = match pattern::build(literal, flags) {
      Ok(pattern) => pattern,
      Err(e) => {
        warn!("{e}");
        return 0;
      },
    };

    let title_attribute = self.config.title_attribute;
    let mut anchors = Vec::new();
    let (replaced, count) = {
      let (output, count) =
        pattern.replace_bounded(self.text.as_str(), cap, |matched| {
          let anchor = build_anchor(matched, target, title_attribute);
          let token = placeholder_token(&anchor);
          anchors.push(anchor);
          token
        });
      (output.into_owned(), count)
    };

    if count == 0 {
      return 0;
    }

    // New anchors stay shielded so later candidates never nest inside them
    for anchor in &anchors {
      self.text.protect(anchor);
    }
    self.text.set_text(replaced);
    self.budget.record(target, count);
    if !self.consumed.contains(&normalized) {
      self.consumed.push(normalized);
    }

    trace!("Linked {count} occurrence(s) of '{literal}' to {target}");
    self.links.push(InsertedLink {
      stage,
      literal: literal.to_string(),
      target: target.to_string(),
      count,
    });
    count
  }
}

/// Anchor markup for a matched literal. `matched` is already markup, so it is
/// emitted as-is; the attribute values are escaped.
fn build_anchor(matched: &str, target: &str, title_attribute: bool) -> String {
  let href = html_escape::encode_double_quoted_attribute(target);
  if title_attribute {
    let text = html_escape::decode_html_entities(matched);
    let title = html_escape::encode_double_quoted_attribute(&text);
    format!("<a href=\"{href}\" title=\"{title}\">{matched}</a>")
  } else {
    format!("<a href=\"{href}\">{matched}</a>")
  }
}

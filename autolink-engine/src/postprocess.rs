//! Attribute rewriting for anchors that leave the own site.
//!
//! Runs once per pipeline invocation, on fully restored text, and touches
//! every anchor in the document: the ones the passes inserted and the ones
//! the author wrote.
use std::sync::LazyLock;

use log::{error, trace};
use regex::{Captures, Regex};

use crate::{processor::RunConfig, utils::host_of};

static ANCHOR_OPEN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?i)<a(\s[^>]*)>")
    .map_err(|e| error!("Failed to compile ANCHOR_OPEN_RE regex: {e}"))
    .ok()
});

static ATTR_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(
    r#"(?i)\s([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
  )
  .map_err(|e| error!("Failed to compile ATTR_RE regex: {e}"))
  .ok()
});

/// Whether `href` points away from `own_host`.
///
/// Only absolute `http(s)` and protocol-relative URLs can be external;
/// relative links, fragments, `mailto:` and friends are left alone. Without
/// an own host every absolute web link counts as external.
#[must_use]
pub fn is_external(href: &str, own_host: Option<&str>) -> bool {
  let href = href.trim();
  let lower = href.to_ascii_lowercase();
  if !(lower.starts_with("http://")
    || lower.starts_with("https://")
    || lower.starts_with("//"))
  {
    return false;
  }

  match (host_of(href), own_host) {
    (Some(host), Some(own)) => !host.eq_ignore_ascii_case(own.trim()),
    (Some(_), None) => true,
    (None, _) => false,
  }
}

/// One attribute of an opening tag.
struct Attribute<'a> {
  name:  String,
  value: &'a str,
  start: usize,
  end:   usize,
}

fn attributes(tag_body: &str) -> Vec<Attribute<'_>> {
  let Some(attr_re) = ATTR_RE.as_ref() else {
    return Vec::new();
  };
  attr_re
    .captures_iter(tag_body)
    .filter_map(|caps| {
      let whole = caps.get(0)?;
      let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4));
      Some(Attribute {
        name:  caps.get(1)?.as_str().to_ascii_lowercase(),
        value: value.map_or("", |v| v.as_str()),
        start: whole.start(),
        end:   whole.end(),
      })
    })
    .collect()
}

fn rewrite_anchor(
  caps: &Captures,
  own_host: Option<&str>,
  config: &RunConfig,
) -> String {
  let whole = &caps[0];
  let body = &caps[1];
  let attrs = attributes(body);

  let Some(href) = attrs.iter().find(|a| a.name == "href") else {
    return whole.to_string();
  };
  if !is_external(href.value, own_host) {
    return whole.to_string();
  }

  let mut body = body.to_string();

  if config.nofollow {
    match attrs.iter().find(|a| a.name == "rel") {
      Some(rel) => {
        let has_nofollow = rel
          .value
          .split_whitespace()
          .any(|token| token.eq_ignore_ascii_case("nofollow"));
        if !has_nofollow {
          let merged = if rel.value.trim().is_empty() {
            "nofollow".to_string()
          } else {
            format!("{} nofollow", rel.value.trim())
          };
          body.replace_range(rel.start..rel.end, &format!(" rel=\"{merged}\""));
        }
      },
      None => body.push_str(" rel=\"nofollow\""),
    }
  }

  if config.open_in_new_tab && !attrs.iter().any(|a| a.name == "target") {
    let trimmed = body.trim_end_matches('/').trim_end().len();
    body.insert_str(trimmed, " target=\"_blank\"");
  }

  trace!("Rewrote external anchor {}", href.value);
  format!("<a{body}>")
}

/// Add `target="_blank"` and/or `rel="nofollow"` to every anchor whose
/// `href` is external to `own_host`, according to `config`.
#[must_use]
pub fn add_external_link_attributes(
  text: &str,
  own_host: Option<&str>,
  config: &RunConfig,
) -> String {
  if !config.open_in_new_tab && !config.nofollow {
    return text.to_string();
  }
  let Some(anchor_re) = ANCHOR_OPEN_RE.as_ref() else {
    return text.to_string();
  };

  anchor_re
    .replace_all(text, |caps: &Captures| rewrite_anchor(caps, own_host, config))
    .into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(open_in_new_tab: bool, nofollow: bool) -> RunConfig {
    RunConfig {
      open_in_new_tab,
      nofollow,
      ..RunConfig::default()
    }
  }

  #[test]
  fn test_is_external() {
    let own = Some("own-site.com");
    assert!(is_external("https://other.com", own));
    assert!(is_external("//cdn.other.com/x", own));
    assert!(!is_external("https://own-site.com/y", own));
    assert!(!is_external("HTTPS://OWN-SITE.COM/y", own));
    assert!(!is_external("/relative", own));
    assert!(!is_external("#frag", own));
    assert!(!is_external("mailto:me@other.com", own));
    assert!(is_external("https://other.com", None));
  }

  #[test]
  fn test_nofollow_only_external() {
    let html = r#"<a href="https://other.com">x</a> <a href="https://own-site.com/y">z</a>"#;
    let result =
      add_external_link_attributes(html, Some("own-site.com"), &config(false, true));
    assert_eq!(
      result,
      r#"<a href="https://other.com" rel="nofollow">x</a> <a href="https://own-site.com/y">z</a>"#
    );
  }

  #[test]
  fn test_new_tab_and_nofollow() {
    let html = r#"<a href='https://other.com/page' class="ext">x</a>"#;
    let result =
      add_external_link_attributes(html, Some("own-site.com"), &config(true, true));
    assert_eq!(
      result,
      r#"<a href='https://other.com/page' class="ext" rel="nofollow" target="_blank">x</a>"#
    );
  }

  #[test]
  fn test_existing_rel_is_extended() {
    let html = r#"<a rel="noopener" href="https://other.com">x</a>"#;
    let result =
      add_external_link_attributes(html, Some("own-site.com"), &config(false, true));
    assert_eq!(
      result,
      r#"<a rel="noopener nofollow" href="https://other.com">x</a>"#
    );
  }

  #[test]
  fn test_existing_attributes_not_duplicated() {
    let html =
      r#"<a href="https://other.com" target="_self" rel="nofollow">x</a>"#;
    let result =
      add_external_link_attributes(html, Some("own-site.com"), &config(true, true));
    assert_eq!(result, html);
  }

  #[test]
  fn test_disabled_is_noop() {
    let html = r#"<a href="https://other.com">x</a>"#;
    let result =
      add_external_link_attributes(html, Some("own-site.com"), &config(false, false));
    assert_eq!(result, html);
  }

  #[test]
  fn test_anchor_without_href_untouched() {
    let html = r#"<a name="top">top</a> <abbr title="x">y</abbr>"#;
    let result =
      add_external_link_attributes(html, Some("own-site.com"), &config(true, true));
    assert_eq!(result, html);
  }
}

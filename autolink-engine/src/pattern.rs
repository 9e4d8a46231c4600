//! Word-boundary safe patterns for literal phrases, matched only in text.
//!
//! The shielded document is split into markup (tags, comments, placeholders
//! and `[shortcodes]`) and the text between it. Literals are searched for in
//! text segments only, so a search is linear in the document length no matter
//! how long a tag-free run of text gets.
//!
//! The standard `regex` crate has no lookaround, and the word boundaries here
//! are lookarounds, so literal patterns are compiled with `fancy-regex`.
use std::{borrow::Cow, ops::Range, sync::LazyLock};

use fancy_regex::Regex;
use log::{error, warn};

use crate::error::{AutolinkError, AutolinkResult};

/// Tags, comments and placeholders, plus bracketed shortcodes. A `<` that
/// does not start a tag (`a < b`) is text.
static MARKUP_RE: LazyLock<Option<regex::Regex>> = LazyLock::new(|| {
  regex::Regex::new(r"<[A-Za-z/!?][^>]*>|\[[^\[\]]*\]")
    .map_err(|e| error!("Failed to compile MARKUP_RE regex: {e}"))
    .ok()
});

const UNICODE_WORD: &str = r"[\p{L}\p{N}_]";
const ASCII_WORD: &str = "[A-Za-z0-9_]";

/// Name of the tag `markup` opens or closes, and whether it closes.
fn tag_name(markup: &str) -> Option<(&str, bool)> {
  let inner = markup.strip_prefix('<')?;
  let (inner, closing) = match inner.strip_prefix('/') {
    Some(rest) => (rest, true),
    None => (inner, false),
  };
  let end = inner
    .find(|c: char| !c.is_ascii_alphanumeric())
    .unwrap_or(inner.len());
  Some((&inner[..end], closing))
}

/// Byte ranges of `text` that may receive links: everything outside markup,
/// except text inside an anchor whose element was not shielded (for instance
/// one missing its closing tag).
#[must_use]
pub fn linkable_ranges(text: &str) -> Vec<Range<usize>> {
  let Some(markup_re) = MARKUP_RE.as_ref() else {
    return Vec::new();
  };

  let mut ranges = Vec::new();
  let mut last = 0;
  let mut in_anchor = false;
  for markup in markup_re.find_iter(text) {
    if !in_anchor && markup.start() > last {
      ranges.push(last..markup.start());
    }
    if let Some((name, closing)) = tag_name(markup.as_str())
      && name.eq_ignore_ascii_case("a")
    {
      in_anchor = !closing;
    }
    last = markup.end();
  }
  if !in_anchor && last < text.len() {
    ranges.push(last..text.len());
  }
  ranges
}

/// Flags controlling how a literal is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternFlags {
  pub case_sensitive: bool,
  pub utf8:           bool,
}

/// A compiled pattern for one literal.
#[derive(Debug, Clone)]
pub struct LinkPattern {
  literal: String,
  regex:   Regex,
}

/// Build the pattern for `literal`.
///
/// The literal is HTML-encoded (so `Q&A` matches `Q&amp;A` in markup), then
/// fully escaped. It must not be preceded or followed by a word character,
/// which is Unicode-aware when `flags.utf8` is set.
///
/// # Errors
///
/// Returns [`AutolinkError::Pattern`] if the pattern fails to compile.
pub fn build(literal: &str, flags: PatternFlags) -> AutolinkResult<LinkPattern> {
  let encoded = html_escape::encode_text(literal);
  let escaped = fancy_regex::escape(&encoded);
  let word = if flags.utf8 { UNICODE_WORD } else { ASCII_WORD };
  let case = if flags.case_sensitive { "" } else { "(?i)" };

  let source = format!("{case}(?<!{word}){escaped}(?!{word})");
  let regex = Regex::new(&source)
    .map_err(|e| AutolinkError::pattern(literal, e))?;

  Ok(LinkPattern {
    literal: literal.to_string(),
    regex,
  })
}

impl LinkPattern {
  /// The literal this pattern was built from.
  #[must_use]
  pub fn literal(&self) -> &str {
    &self.literal
  }

  /// The compiled regex source.
  #[must_use]
  pub fn as_str(&self) -> &str {
    self.regex.as_str()
  }

  /// Whether the literal occurs at a linkable position in `text`.
  #[must_use]
  pub fn is_match(&self, text: &str) -> bool {
    linkable_ranges(text).into_iter().any(|range| {
      self
        .regex
        .find_from_pos(&text[..range.end], range.start)
        .unwrap_or_else(|e| {
          warn!("Matching '{}' failed: {e}", self.literal);
          None
        })
        .is_some()
    })
  }

  /// Replace at most `cap` matches with the output of `replacement`, which
  /// receives the matched text.
  ///
  /// Returns the new text and the number of substitutions actually made,
  /// which is lower than `cap` when the literal occurs fewer times. A runtime
  /// matching failure (backtrack limit) stops the scan; substitutions made so
  /// far are kept.
  pub fn replace_bounded<'t, F>(
    &self,
    text: &'t str,
    cap: usize,
    mut replacement: F,
  ) -> (Cow<'t, str>, usize)
  where
    F: FnMut(&str) -> String,
  {
    let mut output = String::new();
    let mut last = 0;
    let mut count = 0;

    'segments: for range in linkable_ranges(text) {
      // Searching up to the segment end keeps matches inside the segment,
      // while the boundary lookbehind still sees the preceding character
      let haystack = &text[..range.end];
      let mut pos = range.start;

      while count < cap {
        let found = match self.regex.find_from_pos(haystack, pos) {
          Ok(Some(found)) => found,
          Ok(None) => break,
          Err(e) => {
            warn!("Matching '{}' aborted: {e}", self.literal);
            break 'segments;
          },
        };
        if found.start() == found.end() {
          break;
        }

        output.push_str(&text[last..found.start()]);
        output.push_str(&replacement(found.as_str()));
        last = found.end();
        pos = found.end();
        count += 1;
      }

      if count >= cap {
        break;
      }
    }

    if count == 0 {
      return (Cow::Borrowed(text), 0);
    }

    output.push_str(&text[last..]);
    (Cow::Owned(output), count)
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]

  use super::*;

  const INSENSITIVE: PatternFlags = PatternFlags {
    case_sensitive: false,
    utf8:           true,
  };
  const SENSITIVE: PatternFlags = PatternFlags {
    case_sensitive: true,
    utf8:           true,
  };

  fn link(text: &str, literal: &str, flags: PatternFlags, cap: usize) -> String {
    let pattern = build(literal, flags).unwrap();
    let (out, _) = pattern
      .replace_bounded(text, cap, |m| format!("<a href=\"/x\">{m}</a>"));
    out.into_owned()
  }

  #[test]
  fn test_case_insensitive_matches_both() {
    let pattern = build("WordPress", INSENSITIVE).unwrap();
    assert!(pattern.is_match("I like wordpress"));
    assert!(pattern.is_match("I like WORDPRESS"));
  }

  #[test]
  fn test_case_sensitive_exact_only() {
    let pattern = build("WordPress", SENSITIVE).unwrap();
    assert!(pattern.is_match("I like WordPress"));
    assert!(!pattern.is_match("I like wordpress"));
  }

  #[test]
  fn test_no_substring_matches() {
    let pattern = build("press", INSENSITIVE).unwrap();
    assert!(!pattern.is_match("WordPress"));
    assert!(!pattern.is_match("pressing"));
    assert!(pattern.is_match("the press."));
    assert!(pattern.is_match("press"));
  }

  #[test]
  fn test_metacharacters_are_literal() {
    let pattern = build("C++ (lang)", INSENSITIVE).unwrap();
    assert!(pattern.is_match("I write C++ (lang) daily"));
    assert!(!pattern.is_match("I write C (lang) daily"));

    let dotted = build("a.b", INSENSITIVE).unwrap();
    assert!(!dotted.is_match("axb"));
  }

  #[test]
  fn test_not_inside_tag_attributes() {
    let pattern = build("hello", INSENSITIVE).unwrap();
    assert!(!pattern.is_match(r#"<img alt="hello world" src="x.png">"#));
    assert!(pattern.is_match(r#"<img alt="x" src="x.png"> hello"#));
  }

  #[test]
  fn test_not_inside_unshielded_anchor() {
    let pattern = build("hello", INSENSITIVE).unwrap();
    assert!(!pattern.is_match(r#"<a href="/x">say hello</a>"#));
  }

  #[test]
  fn test_not_inside_shortcode_brackets() {
    let pattern = build("gallery", INSENSITIVE).unwrap();
    assert!(!pattern.is_match("[gallery ids=\"1,2\"]"));
  }

  #[test]
  fn test_inside_inline_markup_is_linkable() {
    assert_eq!(
      link("<strong>Rust</strong> rocks", "Rust", INSENSITIVE, 1),
      "<strong><a href=\"/x\">Rust</a></strong> rocks"
    );
  }

  #[test]
  fn test_unicode_word_boundary() {
    // "é" is a letter only in UTF-8 mode
    let utf8 = build("caf", INSENSITIVE).unwrap();
    assert!(!utf8.is_match("café"));

    let ascii = build("caf", PatternFlags {
      case_sensitive: false,
      utf8:           false,
    })
    .unwrap();
    assert!(ascii.is_match("café"));
  }

  #[test]
  fn test_multibyte_literal() {
    let pattern = build("東京", INSENSITIVE).unwrap();
    assert!(pattern.is_match("行き先: 東京 です"));
  }

  #[test]
  fn test_html_encoded_literal() {
    let pattern = build("Q&A", INSENSITIVE).unwrap();
    assert!(pattern.is_match("See our Q&amp;A page"));
  }

  #[test]
  fn test_replace_bounded_counts_actual() {
    let pattern = build("rust", INSENSITIVE).unwrap();
    let (out, count) =
      pattern.replace_bounded("rust and Rust", 5, |m| format!("[{m}]"));
    assert_eq!(count, 2);
    assert_eq!(out, "[rust] and [Rust]");
  }

  #[test]
  fn test_replace_bounded_respects_cap() {
    let pattern = build("x", INSENSITIVE).unwrap();
    let (out, count) = pattern.replace_bounded("x x x", 2, |_| "y".into());
    assert_eq!(count, 2);
    assert_eq!(out, "y y x");
  }

  #[test]
  fn test_raw_greater_than_in_text() {
    assert_eq!(
      link("<p>Rust -> speed</p>", "Rust", INSENSITIVE, 1),
      "<p><a href=\"/x\">Rust</a> -> speed</p>"
    );
    let pattern = build("b", INSENSITIVE).unwrap();
    assert!(pattern.is_match("a < b"));
  }

  #[test]
  fn test_linkable_ranges() {
    let text = "one <em>two</em> [sc x] <a href=\"/y\">three <!--c--> four";
    let segments: Vec<&str> = linkable_ranges(text)
      .into_iter()
      .map(|range| &text[range])
      .collect();
    assert_eq!(segments, vec!["one ", "two", " ", " "]);
  }

  #[test]
  fn test_long_tag_free_text() {
    let mut text = "word ".repeat(40_000);
    text.push_str("Rust");
    let (out, count) =
      build("Rust", INSENSITIVE)
        .unwrap()
        .replace_bounded(&text, 1, |m| format!("[{m}]"));
    assert_eq!(count, 1);
    assert!(out.ends_with("word [Rust]"));
  }

  #[test]
  fn test_replace_bounded_across_segments() {
    let (out, count) = build("x", INSENSITIVE)
      .unwrap()
      .replace_bounded("x <b>x</b> <a href=\"/q\">x</a> x", 3, |_| {
        "y".into()
      });
    assert_eq!(count, 3);
    assert_eq!(out, "y <b>y</b> <a href=\"/q\">x</a> y");
  }

  #[test]
  fn test_replace_bounded_zero_cap_borrows() {
    let pattern = build("x", INSENSITIVE).unwrap();
    let (out, count) = pattern.replace_bounded("x", 0, |_| "y".into());
    assert_eq!(count, 0);
    assert!(matches!(out, Cow::Borrowed("x")));
  }
}

//! Per-document facts the linking engine needs: own URL, own title and,
//! when the document is one of the candidate posts, its id.
use std::{path::Path, sync::LazyLock};

use autolink_engine::{
  CandidateSource,
  ProcessingContext,
  utils::same_target,
};
use log::{error, warn};
use regex::Regex;
use url::Url;

static TITLE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?is)<title(?:\s[^>]*)?>(.*?)</title\s*>")
    .map_err(|e| error!("Failed to compile TITLE_RE regex: {e}"))
    .ok()
});

static H1_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?is)<h1(?:\s[^>]*)?>(.*?)</h1\s*>")
    .map_err(|e| error!("Failed to compile H1_RE regex: {e}"))
    .ok()
});

static BODY_OPEN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?i)<body(?:\s[^>]*)?>")
    .map_err(|e| error!("Failed to compile BODY_OPEN_RE regex: {e}"))
    .ok()
});

static BODY_CLOSE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?i)</body\s*>")
    .map_err(|e| error!("Failed to compile BODY_CLOSE_RE regex: {e}"))
    .ok()
});

static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"(?s)<[^>]*>")
    .map_err(|e| error!("Failed to compile TAG_RE regex: {e}"))
    .ok()
});

/// URL path of a document relative to the site root.
///
/// Path separators become `/`, and a trailing `index.html` (or `index.htm`)
/// is dropped so that `blog/post/index.html` maps to `blog/post/`.
#[must_use]
pub fn relative_url_path(rel_path: &Path) -> String {
  let joined = rel_path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/");

  for index in ["index.html", "index.htm"] {
    if joined == index {
      return String::new();
    }
    if let Some(dir) = joined.strip_suffix(index)
      && dir.ends_with('/')
    {
      return dir.to_string();
    }
  }
  joined
}

/// Public URL of the document at `rel_path`.
///
/// Without a site URL (or with one that does not parse) the URL is
/// root-relative, which still lets relative candidate links be recognised
/// as self links.
#[must_use]
pub fn document_url(site_url: Option<&str>, rel_path: &Path) -> String {
  let path = relative_url_path(rel_path);

  if let Some(site_url) = site_url {
    let base = if site_url.ends_with('/') {
      site_url.to_string()
    } else {
      format!("{site_url}/")
    };
    match Url::parse(&base).and_then(|base| base.join(&path)) {
      Ok(url) => return url.to_string(),
      Err(e) => warn!("Ignoring site URL '{site_url}': {e}"),
    }
  }

  format!("/{path}")
}

/// Split a document into the markup before the body content, the body
/// content, and the markup after it.
///
/// Fragments without a `<body>` element are all body.
#[must_use]
pub fn split_body(html: &str) -> (&str, &str, &str) {
  let (Some(open_re), Some(close_re)) =
    (BODY_OPEN_RE.as_ref(), BODY_CLOSE_RE.as_ref())
  else {
    return ("", html, "");
  };
  let Some(open) = open_re.find(html) else {
    return ("", html, "");
  };
  let end = close_re
    .find_iter(&html[open.end()..])
    .last()
    .map_or(html.len(), |close| open.end() + close.start());

  (&html[..open.end()], &html[open.end()..end], &html[end..])
}

fn text_of(markup: &str) -> Option<String> {
  let stripped = TAG_RE
    .as_ref()
    .map_or_else(|| markup.to_string(), |re| re.replace_all(markup, "").into_owned());
  let decoded = html_escape::decode_html_entities(&stripped);
  let text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
  if text.is_empty() { None } else { Some(text) }
}

/// Title of an HTML document: the `<title>` text, or the first `<h1>`.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
  [&TITLE_RE, &H1_RE].into_iter().find_map(|re| {
    let re = re.as_ref()?;
    let caps = re.captures(html)?;
    text_of(caps.get(1)?.as_str())
  })
}

/// Build the processing context for one document.
#[must_use]
pub fn context_for<S: CandidateSource + ?Sized>(
  source: &S,
  site_url: Option<&str>,
  rel_path: &Path,
  html: &str,
) -> ProcessingContext {
  let own_url = document_url(site_url, rel_path);

  let document_id = source.posts().iter().find_map(|post| {
    source
      .permalink(post)
      .ok()
      .filter(|link| same_target(link, &own_url))
      .map(|_| post.id)
  });

  let mut context = ProcessingContext::for_url(own_url);
  context.document_id = document_id;
  context.own_title = extract_title(html);
  context
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use autolink_engine::{CandidateSet, PostCandidate};

  use super::*;

  #[test]
  fn test_relative_url_path() {
    assert_eq!(relative_url_path(Path::new("index.html")), "");
    assert_eq!(relative_url_path(Path::new("blog/post/index.html")), "blog/post/");
    assert_eq!(relative_url_path(Path::new("blog/about.html")), "blog/about.html");
    assert_eq!(relative_url_path(Path::new("myindex.html")), "myindex.html");
  }

  #[test]
  fn test_document_url() {
    let rel = PathBuf::from("blog/hello/index.html");
    assert_eq!(
      document_url(Some("https://example.com"), &rel),
      "https://example.com/blog/hello/"
    );
    assert_eq!(
      document_url(Some("https://example.com/sub/"), &rel),
      "https://example.com/sub/blog/hello/"
    );
    assert_eq!(document_url(None, &rel), "/blog/hello/");
    assert_eq!(document_url(Some("not a url"), &rel), "/blog/hello/");
  }

  #[test]
  fn test_split_body() {
    let html = "<html><head><title>T</title></head><BODY class=\"x\"><p>b</p></body></html>";
    assert_eq!(
      split_body(html),
      (
        "<html><head><title>T</title></head><BODY class=\"x\">",
        "<p>b</p>",
        "</body></html>"
      )
    );
    assert_eq!(split_body("<p>fragment</p>"), ("", "<p>fragment</p>", ""));
    assert_eq!(split_body("<body>open"), ("<body>", "open", ""));
  }

  #[test]
  fn test_extract_title() {
    assert_eq!(
      extract_title("<head><title>\n  Q&amp;A  </title></head><h1>Other</h1>"),
      Some("Q&A".to_string())
    );
    assert_eq!(
      extract_title("<h1 class=\"t\">Hello <em>World</em></h1>"),
      Some("Hello World".to_string())
    );
    assert_eq!(extract_title("<title> </title><p>none</p>"), None);
  }

  #[test]
  fn test_context_for_matches_post() {
    let source = CandidateSet {
      posts: vec![PostCandidate {
        id:        42,
        title:     "Hello".to_string(),
        post_type: "post".to_string(),
        permalink: Some("https://example.com/blog/hello".to_string()),
      }],
      ..CandidateSet::default()
    };
    let context = context_for(
      &source,
      Some("https://example.com"),
      Path::new("blog/hello/index.html"),
      "<title>Hello</title>",
    );
    assert_eq!(context.document_id, Some(42));
    assert_eq!(context.own_title.as_deref(), Some("Hello"));
    assert_eq!(context.own_url.as_deref(), Some("https://example.com/blog/hello/"));
  }
}

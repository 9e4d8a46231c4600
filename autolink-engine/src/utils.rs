//! URL helpers shared by the linking passes and post-processing.
use url::Url;

/// Normalize a link target so that trivially different spellings of the same
/// destination compare equal.
///
/// Absolute URLs are parsed (which lower-cases scheme and host), then any
/// trailing `/` is dropped. Relative targets only lose the trailing `/`.
#[must_use]
pub fn normalize_target(target: &str) -> String {
  let target = target.trim();
  let normalized = Url::parse(target)
    .map_or_else(|_| target.to_string(), |url| url.to_string());
  let trimmed = normalized.trim_end_matches('/');
  if trimmed.is_empty() {
    "/".to_string()
  } else {
    trimmed.to_string()
  }
}

/// Whether two link targets point at the same destination.
#[must_use]
pub fn same_target(a: &str, b: &str) -> bool {
  normalize_target(a) == normalize_target(b)
}

/// Extract the lower-cased host from an absolute or protocol-relative URL.
///
/// A bare host such as `example.com` is accepted as well, which is how the
/// own site is commonly configured.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
  let url = url.trim();
  if url.is_empty() {
    return None;
  }

  let candidate = if url.starts_with("//") {
    format!("https:{url}")
  } else {
    url.to_string()
  };

  let parsed = Url::parse(&candidate)
    .ok()
    .filter(|u| u.has_host())
    .or_else(|| {
      if candidate.contains("://") || candidate.starts_with('/') {
        None
      } else {
        Url::parse(&format!("https://{candidate}")).ok()
      }
    })?;

  parsed.host_str().map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_target_trailing_slash() {
    assert_eq!(normalize_target("/wp/"), "/wp");
    assert_eq!(normalize_target("/wp"), "/wp");
    assert_eq!(normalize_target("/"), "/");
  }

  #[test]
  fn test_normalize_target_absolute() {
    assert_eq!(
      normalize_target("HTTPS://Example.COM/Post/"),
      "https://example.com/Post"
    );
    assert!(same_target("https://example.com", "https://EXAMPLE.com/"));
    assert!(!same_target("https://example.com/a", "https://example.com/b"));
  }

  #[test]
  fn test_host_of_variants() {
    assert_eq!(host_of("https://Own-Site.com/y"), Some("own-site.com".into()));
    assert_eq!(host_of("//cdn.example.org/x"), Some("cdn.example.org".into()));
    assert_eq!(host_of("own-site.com"), Some("own-site.com".into()));
    assert_eq!(host_of("/relative/path"), None);
    assert_eq!(host_of(""), None);
  }
}

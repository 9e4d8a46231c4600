use std::fs;

use autolink_config::Config;
use autolink_engine::{CandidateSet, parse_keyword_lines};
use color_eyre::eyre::{Context, Result};
use log::info;

/// Load the candidate keywords, posts and terms named by `config`.
///
/// The JSON candidates file and the keyword list are combined, keyword list
/// rules going after the JSON ones. Posts are then filtered by type and
/// title length and ordered longest literal first.
///
/// # Errors
///
/// Returns an error if a configured file cannot be read or the candidates
/// file is not valid JSON.
pub fn load_candidates(config: &Config) -> Result<CandidateSet> {
  let mut set = match config.candidates {
    Some(ref path) => {
      let json = fs::read_to_string(path).wrap_err_with(|| {
        format!("Failed to read candidates file: {}", path.display())
      })?;
      CandidateSet::from_json_str(&json).wrap_err_with(|| {
        format!("Failed to parse candidates file: {}", path.display())
      })?
    },
    None => CandidateSet::default(),
  };

  if let Some(ref path) = config.keywords {
    let text = fs::read_to_string(path).wrap_err_with(|| {
      format!("Failed to read keyword list: {}", path.display())
    })?;
    let rules = parse_keyword_lines(&text, config.linking().case_sensitive);
    info!("Loaded {} keyword rule(s) from {}", rules.len(), path.display());
    set.extend_keywords(rules);
  }

  let set = set.prepare(config.min_title_length, &config.post_types);
  info!(
    "Candidates: {} keyword rule(s), {} post(s), {} term(s)",
    set.keywords.len(),
    set.posts.len(),
    set.terms.len()
  );
  Ok(set)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_load_candidates_combines_sources() {
    let dir = TempDir::new().unwrap();
    let candidates = dir.path().join("candidates.json");
    let keywords = dir.path().join("keywords.txt");
    fs::write(
      &candidates,
      r#"{
        "keywords": [{"name": "Rust", "target": "/rust"}],
        "posts": [
          {"id": 1, "title": "Go", "permalink": "/go"},
          {"id": 2, "title": "Async Rust", "permalink": "/async"},
          {"id": 3, "title": "Product", "post_type": "product", "permalink": "/p"}
        ]
      }"#,
    )
    .unwrap();
    fs::write(&keywords, "# comment\ncargo, crates, /cargo\n").unwrap();

    let config = Config {
      candidates: Some(candidates),
      keywords: Some(keywords),
      ..Config::default()
    };
    let set = load_candidates(&config).unwrap();

    let names: Vec<&str> = set.keywords.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, vec!["Rust", "cargo", "crates"]);
    let titles: Vec<&str> = set.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Async Rust"]);
  }

  #[test]
  fn test_load_candidates_invalid_json() {
    let dir = TempDir::new().unwrap();
    let candidates = dir.path().join("candidates.json");
    fs::write(&candidates, "{not json").unwrap();

    let config = Config {
      candidates: Some(candidates),
      ..Config::default()
    };
    assert!(load_candidates(&config).is_err());
  }
}

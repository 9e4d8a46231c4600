//! Value parsers for `KEY=VALUE` overrides.
use std::path::PathBuf;

use crate::error::ConfigError;

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
  ConfigError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
    expected,
  }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" => Ok(true),
    "false" | "no" | "0" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean value for '{key}': '{value}'. Expected true/false, \
         yes/no, or 1/0"
      )))
    },
  }
}

pub(crate) fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
  value
    .parse()
    .map_err(|_| invalid(key, value, "Expected a positive integer"))
}

pub(crate) fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
  value
    .parse()
    .map_err(|_| invalid(key, value, "Expected an integer"))
}

/// Empty values clear the option.
pub(crate) fn parse_optional_path(value: &str) -> Option<PathBuf> {
  if value.is_empty() {
    None
  } else {
    Some(PathBuf::from(value))
  }
}

/// Empty values clear the option.
pub(crate) fn parse_optional_string(value: &str) -> Option<String> {
  if value.is_empty() {
    None
  } else {
    Some(value.to_string())
  }
}

pub(crate) fn parse_optional_usize(
  key: &str,
  value: &str,
) -> Result<Option<usize>, ConfigError> {
  if value.is_empty() {
    Ok(None)
  } else {
    parse_usize(key, value).map(Some)
  }
}

/// Comma separated list; an empty value yields an empty list.
pub(crate) fn parse_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_string)
    .collect()
}

/// Append `other` to `base`, skipping entries already present.
pub(crate) fn extend_unique(base: &mut Vec<String>, other: Vec<String>) {
  for item in other {
    if !base.contains(&item) {
      base.push(item);
    }
  }
}

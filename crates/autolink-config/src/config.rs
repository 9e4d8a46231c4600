use std::{
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use autolink_engine::RunConfig;
use serde::{Deserialize, Serialize};

use crate::{
  error::ConfigError,
  linking::LinkingConfig,
  parse::{
    extend_unique,
    parse_list,
    parse_optional_path,
    parse_optional_string,
    parse_optional_usize,
    parse_usize,
  },
};

/// Configuration for a batch relinking run.
///
/// [`Config`] holds everything needed to relink a directory of HTML
/// documents: where the documents live, where the candidate keywords, posts
/// and terms come from, and how links are inserted. Fields are typically
/// loaded from a TOML or JSON config file, but can also be set via CLI
/// arguments and `--config KEY=VALUE` overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Public base URL of the site, used to derive each document's own URL.
  pub site_url: Option<String>,

  /// Input directory containing HTML documents.
  pub input_dir: Option<PathBuf>,

  /// Output directory for relinked documents.
  pub output_dir: PathBuf,

  /// JSON file with keyword rules, posts and terms.
  pub candidates: Option<PathBuf>,

  /// Keyword list file, one `keyword, keyword, url` mapping per line.
  pub keywords: Option<PathBuf>,

  /// Number of threads to use for parallel processing.
  pub jobs: Option<usize>,

  /// File extensions that are relinked. Everything else is copied verbatim.
  pub extensions: Vec<String>,

  /// Post titles shorter than this (in characters) are never linked.
  pub min_title_length: usize,

  /// Post types whose titles are linked.
  pub post_types: Vec<String>,

  /// Where to write a JSON report of the inserted links.
  pub report: Option<PathBuf>,

  /// Linking behaviour.
  pub linking: Option<LinkingConfig>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      site_url:         None,
      input_dir:        None,
      output_dir:       PathBuf::from("linked"),
      candidates:       None,
      keywords:         None,
      jobs:             None,
      extensions:       vec!["html".to_string(), "htm".to_string()],
      min_title_length: 3,
      post_types:       vec!["post".to_string(), "page".to_string()],
      report:           None,
      linking:          None,
    }
  }
}

impl Config {
  /// The linking table, or its defaults when the file has none.
  #[must_use]
  pub fn linking(&self) -> LinkingConfig {
    self.linking.clone().unwrap_or_default()
  }

  /// Engine configuration for this run.
  #[must_use]
  pub fn run_config(&self) -> RunConfig {
    self.linking().to_run_config()
  }

  /// Whether `path` has one of the configured extensions.
  #[must_use]
  pub fn is_linkable(&self, path: &Path) -> bool {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| {
        self
          .extensions
          .iter()
          .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
      })
  }

  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  #[allow(
    clippy::option_if_let_else,
    reason = "Clearer with explicit match on extension"
  )]
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        match ext.to_lowercase().as_str() {
          "json" => Ok(serde_json::from_str(&content)?),
          "toml" => Ok(toml::from_str(&content)?),
          _ => {
            Err(ConfigError::Config(format!(
              "Unsupported config file format: {}",
              path.display()
            )))
          },
        }
      },
      None => {
        Err(ConfigError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load configuration from files and overrides.
  ///
  /// Explicit `config_files` are merged in order, later files taking
  /// precedence. Without explicit files a discovered config file is used, and
  /// failing that the defaults. `config_overrides` are applied last.
  ///
  /// # Errors
  ///
  /// Returns an error if a config file cannot be loaded or an override is
  /// invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged_config = Self::from_file(first).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          first.display(),
          e
        ))
      })?;

      for config_path in rest {
        let additional_config = Self::from_file(config_path).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
          ))
        })?;
        merged_config.merge(additional_config);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      merged_config
    } else if let Some(discovered_config) = Self::find_config_file() {
      log::info!(
        "Using discovered config file: {}",
        discovered_config.display()
      );
      Self::from_file(&discovered_config).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load discovered config from {}: {}",
          discovered_config.display(),
          e
        ))
      })?
    } else {
      Self::default()
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    Ok(config)
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// Keys are field names; fields of the linking table are addressed as
  /// `linking.<field>`. List values are comma separated.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  ///
  /// - An override string is not in KEY=VALUE format
  /// - A key is not recognized
  /// - A value cannot be parsed as the expected type
  ///
  /// # Example
  ///
  /// ```rust
  /// use autolink_config::Config;
  ///
  /// let mut config = Config::default();
  /// config
  ///   .apply_overrides(&[
  ///     "linking.nofollow=true".to_string(),
  ///     "site_url=https://example.com".to_string(),
  ///   ])
  ///   .unwrap();
  /// assert!(config.linking().nofollow);
  /// ```
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Apply a single override.
  ///
  /// # Errors
  ///
  /// Returns an error for unknown keys and unparsable values.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    if let Some(nested) = key.strip_prefix("linking.") {
      return self
        .linking
        .get_or_insert_with(LinkingConfig::default)
        .apply_override(nested, value);
    }

    match key {
      "site_url" => self.site_url = parse_optional_string(value),
      "input_dir" => self.input_dir = parse_optional_path(value),
      "output_dir" => self.output_dir = PathBuf::from(value),
      "candidates" => self.candidates = parse_optional_path(value),
      "keywords" => self.keywords = parse_optional_path(value),
      "jobs" => self.jobs = parse_optional_usize(key, value)?,
      "extensions" => self.extensions = parse_list(value),
      "min_title_length" => self.min_title_length = parse_usize(key, value)?,
      "post_types" => self.post_types = parse_list(value),
      "report" => self.report = parse_optional_path(value),
      _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: Other's [`Some`] value replaces this config's
  ///   value
  /// - [`Vec<T>`] fields: Other's entries are appended, skipping duplicates
  /// - Plain fields: Other's value replaces only when it is not the default,
  ///   so a file that leaves a field unset does not reset it
  pub fn merge(&mut self, other: Self) {
    if other.site_url.is_some() {
      self.site_url = other.site_url;
    }
    if other.input_dir.is_some() {
      self.input_dir = other.input_dir;
    }
    let defaults = Self::default();
    if other.output_dir != defaults.output_dir {
      self.output_dir = other.output_dir;
    }
    if other.candidates.is_some() {
      self.candidates = other.candidates;
    }
    if other.keywords.is_some() {
      self.keywords = other.keywords;
    }
    self.jobs = other.jobs.or(self.jobs);
    extend_unique(&mut self.extensions, other.extensions);
    if other.min_title_length != defaults.min_title_length {
      self.min_title_length = other.min_title_length;
    }
    extend_unique(&mut self.post_types, other.post_types);
    if other.report.is_some() {
      self.report = other.report;
    }
    if other.linking.is_some() {
      self.linking = other.linking;
    }
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "autolink.toml",
          "autolink.json",
          ".autolink.toml",
          ".autolink.json",
          ".config/autolink.toml",
          ".config/autolink.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let xdg_config_dir = PathBuf::from(xdg_config_home).join("autolink");
          for filename in &["config.toml", "config.json"] {
            let config_path = xdg_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        if let Ok(home) = std::env::var("HOME") {
          let home_config_dir =
            PathBuf::from(home).join(".config").join("autolink");
          for filename in &["config.toml", "config.json"] {
            let config_path = home_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        None
      })
      .clone()
  }

  /// Validate all paths specified in the configuration
  ///
  /// # Errors
  ///
  /// Returns an error if any configured path does not exist or is invalid.
  pub fn validate_paths(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    match self.input_dir {
      Some(ref input_dir) if !input_dir.exists() => {
        errors.push(format!(
          "Input directory does not exist: {}",
          input_dir.display()
        ));
      },
      Some(ref input_dir) if !input_dir.is_dir() => {
        errors.push(format!(
          "Input path is not a directory: {}",
          input_dir.display()
        ));
      },
      Some(_) => {},
      None => errors.push("No input directory configured".to_string()),
    }

    for (label, path) in [
      ("Candidates file", &self.candidates),
      ("Keyword list", &self.keywords),
    ] {
      if let Some(path) = path {
        if !path.exists() {
          errors.push(format!("{label} does not exist: {}", path.display()));
        } else if !path.is_file() {
          errors.push(format!("{label} is not a file: {}", path.display()));
        }
      }
    }

    if self.candidates.is_none() && self.keywords.is_none() {
      errors.push(
        "At least one of a candidates file or a keyword list must be provided"
          .to_string(),
      );
    }

    // The walker skips the output directory, so one that contains the input
    // would leave nothing to relink
    if let (Some(input_dir), Ok(output_dir)) =
      (&self.input_dir, self.output_dir.canonicalize())
      && input_dir
        .canonicalize()
        .is_ok_and(|input_dir| input_dir.starts_with(&output_dir))
    {
      errors.push(format!(
        "Output directory must not be or contain the input directory: {}",
        output_dir.display()
      ));
    }

    if !errors.is_empty() {
      let error_message = errors.join("\n");
      return Err(ConfigError::Config(format!(
        "Configuration path validation errors:\n{error_message}"
      )));
    }

    Ok(())
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the template cannot be retrieved or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)
      .map_err(|e| ConfigError::Template(e.to_string()))?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

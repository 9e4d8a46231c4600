use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for autolink
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Insert keyword, post-title and taxonomy links into rendered HTML"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", action = clap::ArgAction::Append, global = true)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times), e.g. `--config linking.nofollow=true`
  #[arg(long = "config", action = clap::ArgAction::Append, global = true)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the autolink CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new autolink configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "autolink.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Relink a directory of HTML documents.
  Link {
    /// Directory containing the HTML documents.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output directory for the relinked documents.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON file with keyword rules, posts and terms.
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Keyword list file, one `keyword, keyword, url` mapping per line.
    #[arg(short, long)]
    keywords: Option<PathBuf>,

    /// Public base URL of the site.
    #[arg(short, long)]
    site_url: Option<String>,

    /// Number of threads to use for parallel processing.
    #[arg(short = 'p', long = "jobs")]
    jobs: Option<usize>,

    /// Write a JSON report of the inserted links to this file.
    #[arg(short, long)]
    report: Option<PathBuf>,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

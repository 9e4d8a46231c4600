//! Configuration loading for the binary: config files, `--config`
//! overrides, then the arguments of the `link` subcommand.
pub use autolink_config::Config;
use color_eyre::eyre::{Context, Result};

use crate::cli::{Cli, Commands};

/// Load the configuration for a run and validate its paths.
///
/// # Errors
///
/// Returns an error if a config file cannot be loaded, an override is
/// invalid, or a configured path does not exist.
pub fn load(cli: &Cli) -> Result<Config> {
  let mut config = Config::load(&cli.config_files, &cli.config_overrides)
    .wrap_err("Failed to load configuration")?;

  merge_with_cli(&mut config, cli);

  config
    .validate_paths()
    .wrap_err("Invalid configuration")?;

  Ok(config)
}

/// Merge CLI arguments into this config, prioritizing CLI values when
/// present
pub fn merge_with_cli(config: &mut Config, cli: &Cli) {
  if let Some(Commands::Link {
    input_dir,
    output_dir,
    candidates,
    keywords,
    site_url,
    jobs,
    report,
  }) = &cli.command
  {
    if let Some(input_dir) = input_dir {
      config.input_dir = Some(input_dir.clone());
    }

    if let Some(output_dir) = output_dir {
      config.output_dir.clone_from(output_dir);
    }

    if let Some(candidates) = candidates {
      config.candidates = Some(candidates.clone());
    }

    if let Some(keywords) = keywords {
      config.keywords = Some(keywords.clone());
    }

    if let Some(site_url) = site_url {
      config.site_url = Some(site_url.clone());
    }

    config.jobs = jobs.or(config.jobs);

    if let Some(report) = report {
      config.report = Some(report.clone());
    }
  }
}

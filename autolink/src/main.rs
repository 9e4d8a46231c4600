use std::fs;

use autolink::{
  cli::{Cli, Commands},
  config::{self, Config},
  utils,
};
use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info};

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  if let Some(Commands::Init {
    output,
    format,
    force,
  }) = &cli.command
  {
    return init(output, format, *force);
  }

  // Create configuration from config files, overrides and CLI arguments
  let config = config::load(&cli)?;

  info!("Starting relinking...");
  let summary = utils::relink_directory(&config)?;
  info!(
    "Done: {} link(s) across {} document(s)",
    summary.total_inserted, summary.documents
  );

  Ok(())
}

/// Write a commented default configuration file.
fn init(output: &std::path::Path, format: &str, force: bool) -> Result<()> {
  // Check if file already exists and that we're not forcing overwrite
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  // Create parent directories if needed
  if let Some(parent) = output.parent()
    && !parent.as_os_str().is_empty()
    && !parent.exists()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
    info!("Created directory: {}", parent.display());
  }

  Config::generate_default_config(format, output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;

  info!(
    "Configuration file created successfully. Edit it to point at your \
     documents and candidates."
  );
  Ok(())
}

use std::{
  fs,
  path::{Path, PathBuf},
};

use autolink_config::Config;
use autolink_engine::{
  AutolinkProcessor,
  CandidateSet,
  InsertedLink,
  process_with_recovery,
};
use color_eyre::eyre::{Context, Result, eyre};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use super::{
  candidates::load_candidates,
  document::{context_for, split_body},
};

/// Links inserted into one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
  /// Path relative to the input directory.
  pub path:           String,
  pub url:            String,
  pub total_inserted: usize,
  pub links:          Vec<InsertedLink>,
}

/// Outcome of a batch run, also the shape of the JSON report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
  pub documents:      usize,
  pub copied:         usize,
  pub total_inserted: usize,
  pub reports:        Vec<DocumentReport>,
}

/// Every file below `input_dir`, skipping anything inside `skip_dir`.
///
/// `skip_dir` only applies when it lies inside `input_dir`. A directory that
/// contains the input would otherwise hide every file.
#[must_use]
pub fn collect_files(input_dir: &Path, skip_dir: Option<&Path>) -> Vec<PathBuf> {
  let input_root = input_dir.canonicalize().ok();
  let skip_dir = skip_dir
    .and_then(|dir| dir.canonicalize().ok())
    .filter(|skip| {
      input_root
        .as_ref()
        .is_some_and(|root| skip.starts_with(root) && skip != root)
    });

  let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
    .follow_links(true)
    .into_iter()
    .filter_entry(|entry| {
      skip_dir.as_ref().is_none_or(|skip| {
        !entry
          .path()
          .canonicalize()
          .is_ok_and(|path| path.starts_with(skip))
      })
    })
    .filter_map(std::result::Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .map(walkdir::DirEntry::into_path)
    .collect();

  files.sort();
  files
}

enum FileOutcome {
  Linked(DocumentReport),
  Copied,
}

fn process_file(
  config: &Config,
  processor: &AutolinkProcessor,
  candidates: &CandidateSet,
  input_dir: &Path,
  file_path: &Path,
) -> Result<FileOutcome> {
  let rel_path = file_path.strip_prefix(input_dir).wrap_err_with(|| {
    format!(
      "Failed to determine relative path for {}",
      file_path.display()
    )
  })?;
  let output_path = config.output_dir.join(rel_path);
  if let Some(parent) = output_path.parent() {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create output directory: {}", parent.display())
    })?;
  }

  if !config.is_linkable(file_path) {
    fs::copy(file_path, &output_path).wrap_err_with(|| {
      format!("Failed to copy {}", file_path.display())
    })?;
    return Ok(FileOutcome::Copied);
  }

  let html = fs::read_to_string(file_path).wrap_err_with(|| {
    format!("Failed to read document: {}", file_path.display())
  })?;
  let context =
    context_for(candidates, config.site_url.as_deref(), rel_path, &html);
  // Only the body is linked, so <title> and other head markup stay as is
  let (head, body, tail) = split_body(&html);
  let result = process_with_recovery(processor, body, candidates, &context);
  let linked = format!("{head}{}{tail}", result.html);

  fs::write(&output_path, linked).wrap_err_with(|| {
    format!("Failed to write output HTML: {}", output_path.display())
  })?;
  debug!(
    "{}: inserted {} link(s)",
    rel_path.display(),
    result.total_inserted
  );

  Ok(FileOutcome::Linked(DocumentReport {
    path:           rel_path.to_string_lossy().replace('\\', "/"),
    url:            context.own_url.unwrap_or_default(),
    total_inserted: result.total_inserted,
    links:          result.links,
  }))
}

/// Relink every document below the configured input directory.
///
/// Candidates are loaded once and shared. Each document is an independent
/// linking run with its own budget, processed on a thread pool sized by
/// `jobs` (or the number of CPUs). Files with other extensions are copied
/// through so the output mirrors the input tree.
///
/// # Errors
///
/// Returns an error if the candidates cannot be loaded, a file cannot be read
/// or written, or the report cannot be written.
pub fn relink_directory(config: &Config) -> Result<RunSummary> {
  let input_dir = config
    .input_dir
    .as_deref()
    .ok_or_else(|| eyre!("No input directory configured"))?;
  info!("Input directory: {}", input_dir.display());
  info!("Output directory: {}", config.output_dir.display());

  let candidates = load_candidates(config)?;
  let processor = AutolinkProcessor::new(config.run_config());

  fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
    format!(
      "Failed to create output directory: {}",
      config.output_dir.display()
    )
  })?;

  let files = collect_files(input_dir, Some(&config.output_dir));
  info!("Found {} files", files.len());

  let thread_count = config.jobs.unwrap_or_else(num_cpus::get).max(1);
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(thread_count)
    .build()
    .wrap_err("Failed to build thread pool")?;

  let outcomes: Vec<FileOutcome> = pool.install(|| {
    files
      .par_iter()
      .map(|file_path| {
        process_file(config, &processor, &candidates, input_dir, file_path)
      })
      .collect::<Result<Vec<_>>>()
  })?;

  let mut summary = RunSummary::default();
  for outcome in outcomes {
    match outcome {
      FileOutcome::Linked(report) => {
        summary.documents += 1;
        summary.total_inserted += report.total_inserted;
        summary.reports.push(report);
      },
      FileOutcome::Copied => summary.copied += 1,
    }
  }

  info!(
    "Relinked {} document(s), inserted {} link(s), copied {} other file(s)",
    summary.documents, summary.total_inserted, summary.copied
  );

  if let Some(ref report_path) = config.report {
    write_report(&summary, report_path)?;
  }

  Ok(summary)
}

/// Write `summary` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized or written.
pub fn write_report(summary: &RunSummary, path: &Path) -> Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create report directory: {}", parent.display())
    })?;
  }

  let json = serde_json::to_string_pretty(summary)
    .wrap_err("Failed to serialize link report")?;
  fs::write(path, json).wrap_err_with(|| {
    format!("Failed to write link report: {}", path.display())
  })?;

  info!("Wrote link report: {}", path.display());
  Ok(())
}

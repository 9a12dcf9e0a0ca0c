//! Implementation of the `bpybuild checkout` command.
//!
//! Checks out one resolved version into `{root}/{version}`, or with `--all`
//! every buildable version side by side under `root`.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use bpybuild_lib::checkout::checkout_all;
use bpybuild_lib::request::fetch_sources;
use bpybuild_lib::resolve::Resolver;

use super::TargetArgs;
use super::resolve::print_selection;
use crate::output::{OutputFormat, format_duration, print_error, print_json, print_stat, print_success, symbols};

#[derive(Debug, Serialize)]
struct AllResult {
  succeeded: Vec<AllSuccess>,
  skipped: Vec<String>,
  failed: Vec<AllFailure>,
}

#[derive(Debug, Serialize)]
struct AllSuccess {
  version: String,
  path: String,
}

#[derive(Debug, Serialize)]
struct AllFailure {
  version: String,
  error: String,
}

pub fn cmd_checkout(
  resolver: &Resolver,
  version: Option<String>,
  root: &Path,
  parents: bool,
  all: bool,
  target: &TargetArgs,
  output: OutputFormat,
) -> Result<()> {
  let start = Instant::now();

  if all {
    return checkout_everything(resolver, root, parents, output, start);
  }

  let request = target.request(version);
  let resolution = fetch_sources(resolver, &request, root, parents).context("Checkout failed")?;

  if output.is_json() {
    return print_json(&resolution);
  }

  print_success(&format!(
    "Checked out Blender {} into {}",
    resolution.selection.version(),
    resolution.path.display()
  ));
  print_selection(&resolution.selection);
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}

fn checkout_everything(resolver: &Resolver, root: &Path, parents: bool, output: OutputFormat, start: Instant) -> Result<()> {
  let report = checkout_all(resolver, root, parents).context("Checkout failed")?;

  if output.is_json() {
    let result = AllResult {
      succeeded: report
        .succeeded
        .iter()
        .map(|(version, path)| AllSuccess {
          version: version.to_string(),
          path: path.display().to_string(),
        })
        .collect(),
      skipped: report.skipped.iter().map(ToString::to_string).collect(),
      failed: report
        .failed
        .iter()
        .map(|f| AllFailure {
          version: f.version.to_string(),
          error: f.error.to_string(),
        })
        .collect(),
    };
    print_json(&result)?;
  } else {
    for (version, path) in &report.succeeded {
      println!(
        "  {} {} {} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        version,
        symbols::ARROW,
        path.display()
      );
    }
    for failure in &report.failed {
      print_error(&format!("{}: {}", failure.version, failure.error));
    }

    println!();
    print_stat("Checked out", &report.succeeded.len().to_string());
    print_stat("Skipped (no code tag)", &report.skipped.len().to_string());
    print_stat("Failed", &report.failed.len().to_string());
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if !report.is_success() {
    bail!("{} version(s) failed to check out", report.failed.len());
  }
  Ok(())
}

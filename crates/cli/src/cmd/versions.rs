//! Implementation of the `bpybuild versions` command.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use bpybuild_lib::resolve::{MatchedVersion, Resolver};
use bpybuild_lib::sources::VersionTag;

use super::TargetArgs;
use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_versions(resolver: &Resolver, all: bool, target: &TargetArgs, output: OutputFormat) -> Result<()> {
  if all {
    let index = resolver.matched_versions().context("Failed to list versions")?;
    let versions: Vec<&MatchedVersion> = index.values().rev().collect();

    if output.is_json() {
      return print_json(&versions);
    }
    for matched in versions {
      print_matched(matched);
    }
    return Ok(());
  }

  let target = target.target()?;
  let compatible = resolver
    .resolve(target.platform.os, target.platform.bitness, target.runtime)
    .context("Failed to resolve versions")?;
  let versions: Vec<&MatchedVersion> = compatible.values().rev().collect();

  if output.is_json() {
    return print_json(&versions);
  }

  if versions.is_empty() {
    print_info(&format!(
      "No version ships libraries for {} with Python {}",
      target.platform, target.runtime
    ));
    return Ok(());
  }

  println!("Versions for {} with Python {}:", target.platform, target.runtime);
  for matched in versions {
    println!("  {} {}", symbols::INFO, matched.version);
  }

  Ok(())
}

fn print_matched(matched: &MatchedVersion) {
  let marker = if matched.is_buildable() {
    symbols::SUCCESS
      .if_supports_color(Stream::Stdout, |s| s.green())
      .to_string()
  } else {
    symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string()
  };

  println!(
    "  {} {:<10} code: {:<24} library: {}",
    marker,
    matched.version.to_string(),
    raw_tags(&matched.code),
    raw_tags(&matched.library)
  );
}

fn raw_tags(tags: &[VersionTag]) -> String {
  if tags.is_empty() {
    return "-".to_string();
  }
  tags.iter().map(|t| t.raw.as_str()).collect::<Vec<_>>().join(", ")
}

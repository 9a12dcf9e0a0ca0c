use anyhow::Result;

use bpybuild_lib::resolve::{Resolver, Selection};

use super::TargetArgs;
use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_resolve(resolver: &Resolver, version: Option<String>, target: &TargetArgs, output: OutputFormat) -> Result<()> {
  let target = target.target()?;
  let selection = resolver.select(version.as_deref(), &target)?;

  if output.is_json() {
    return print_json(&selection);
  }

  print_success(&format!(
    "Blender {} for {} with Python {}",
    selection.version(),
    target.platform,
    target.runtime
  ));
  print_selection(&selection);
  Ok(())
}

pub fn print_selection(selection: &Selection) {
  if let Some(tag) = selection.matched.primary_code() {
    print_stat("Code tag", &tag.raw);
  }
  if let Some(tag) = selection.matched.primary_library() {
    print_stat("Library tag", &tag.raw);
  }
  print_stat("Platform libraries", &selection.platform.name);
  if let Some(toolchain) = selection.toolchain() {
    print_stat("Toolchain", toolchain);
  }
}

use anyhow::{Context, Result};

use bpybuild_lib::resolve::Resolver;

use crate::output::{OutputFormat, format_runtimes, print_info, print_json, symbols};

pub fn cmd_platforms(resolver: &Resolver, version: &str, output: OutputFormat) -> Result<()> {
  let matrix = resolver
    .platform_matrix(version)
    .with_context(|| format!("Failed to list platforms of {}", version))?;

  if output.is_json() {
    return print_json(&matrix);
  }

  if matrix.is_empty() {
    print_info(&format!("{} has no platform libraries", version));
    return Ok(());
  }

  for support in &matrix {
    let descriptor = &support.descriptor;
    let mut details = vec![descriptor.os_family.to_string()];
    if let Some(bitness) = descriptor.bitness {
      details.push(bitness.to_string());
    }
    if let Some(toolchain) = &descriptor.toolchain {
      details.push(toolchain.clone());
    }
    if let Some(darwin) = &descriptor.darwin_version {
      details.push(format!("darwin {}", darwin));
    }
    if let Some(processor) = &descriptor.processor {
      details.push(processor.clone());
    }

    println!("  {} {} ({})", symbols::INFO, descriptor.name, details.join(", "));
    println!("      Python: {}", format_runtimes(&support.runtimes));
  }

  Ok(())
}

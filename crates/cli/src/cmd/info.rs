use anyhow::Result;

use bpybuild_lib::config::Settings;
use bpybuild_lib::platform::Platform;
use bpybuild_lib::platform::python::RuntimeVersion;

use crate::output::{OutputFormat, print_json, print_stat, print_warning};

pub fn cmd_info(settings: &Settings, output: OutputFormat) -> Result<()> {
  let platform = Platform::current();
  let python = RuntimeVersion::detect();
  let config_file = Settings::path()?;
  let root = settings.checkout_root()?;

  if output.is_json() {
    let json_output = serde_json::json!({
      "platform": platform,
      "python": python.map(|p| p.to_string()),
      "settings": settings,
      "checkout_root": root,
      "config_file": config_file,
    });
    return print_json(&json_output);
  }

  println!("System:");
  print_stat("Platform", &platform.to_string());
  print_stat("OS", platform.os.as_str());
  print_stat("Word width", &platform.bitness.to_string());
  match python {
    Some(version) => print_stat("Python", &version.to_string()),
    None => print_stat("Python", "not found"),
  }

  println!();
  println!("Settings:");
  print_stat("Config file", &config_file.display().to_string());
  print_stat("Code repository", &settings.git_url);
  print_stat("Branch", &settings.branch);
  print_stat("Library repository", &settings.svn_url);
  print_stat("Checkout root", &root.display().to_string());

  if python.is_none() {
    println!();
    print_warning("No Python interpreter on PATH; pass --python to resolve or check out.");
  }

  Ok(())
}

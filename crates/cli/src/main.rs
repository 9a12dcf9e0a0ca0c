mod cmd;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bpybuild_lib::config::Settings;
use bpybuild_lib::remote::{GitCli, SvnCli};
use bpybuild_lib::resolve::Resolver;

use crate::cmd::{TargetArgs, cmd_checkout, cmd_info, cmd_platforms, cmd_resolve, cmd_versions};
use crate::output::{OutputFormat, print_error};

/// bpybuild - find and check out the Blender sources for building bpy
#[derive(Parser)]
#[command(name = "bpybuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Git remote of the Blender sources
  #[arg(long, global = true, value_name = "URL")]
  git_url: Option<String>,

  /// Svn root of the precompiled libraries
  #[arg(long, global = true, value_name = "URL")]
  svn_url: Option<String>,

  /// Development branch of the code repository
  #[arg(long, global = true)]
  branch: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the host platform, the detected Python and the effective settings
  Info {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the versions that can be built for a target
  Versions {
    /// List every known version, including those with a tag on one side only
    #[arg(long)]
    all: bool,

    #[command(flatten)]
    target: TargetArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the platform libraries of a version and their Python versions
  Platforms {
    /// Version in any spelling (2.80, v2.80, blender-2.80-release)
    version: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Pick the version and platform libraries for a target without checking out
  Resolve {
    /// Version to build (default: newest compatible)
    #[arg(long)]
    version: Option<String>,

    #[command(flatten)]
    target: TargetArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Resolve and check out the sources and platform libraries
  Checkout {
    /// Version to build (default: newest compatible)
    #[arg(long, conflicts_with = "all")]
    version: Option<String>,

    /// Directory receiving one subdirectory per version (default: from settings)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Create missing parent directories
    #[arg(short, long)]
    parents: bool,

    /// Check out every version that has a code tag, whatever the target
    #[arg(long, conflicts_with_all = ["os", "bits", "python"])]
    all: bool,

    #[command(flatten)]
    target: TargetArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(e) = run(cli) {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let settings = load_settings(&cli)?;

  match cli.command {
    Commands::Info { output } => cmd_info(&settings, output),
    Commands::Versions { all, target, output } => cmd_versions(&resolver(&settings), all, &target, output),
    Commands::Platforms { version, output } => cmd_platforms(&resolver(&settings), &version, output),
    Commands::Resolve {
      version,
      target,
      output,
    } => cmd_resolve(&resolver(&settings), version, &target, output),
    Commands::Checkout {
      version,
      path,
      parents,
      all,
      target,
      output,
    } => {
      let root = match path {
        Some(path) => path,
        None => settings.checkout_root().context("Failed to locate the checkout root")?,
      };
      cmd_checkout(&resolver(&settings), version, &root, parents, all, &target, output)
    }
  }
}

/// Settings file and environment, then the global flags on top.
fn load_settings(cli: &Cli) -> Result<Settings> {
  let mut settings = Settings::load().context("Failed to load settings")?;

  if let Some(url) = &cli.git_url {
    settings.git_url = url.clone();
  }
  if let Some(url) = &cli.svn_url {
    settings.svn_url = url.clone();
  }
  if let Some(branch) = &cli.branch {
    settings.branch = branch.clone();
  }

  debug!(?settings, "effective settings");
  Ok(settings)
}

fn resolver(settings: &Settings) -> Resolver {
  Resolver::from_settings(settings, Arc::new(GitCli::new()), Arc::new(SvnCli::new()))
}

mod checkout;
mod info;
mod platforms;
mod resolve;
mod versions;

pub use checkout::cmd_checkout;
pub use info::cmd_info;
pub use platforms::cmd_platforms;
pub use resolve::cmd_resolve;
pub use versions::cmd_versions;

use anyhow::Result;
use clap::Args;

use bpybuild_lib::platform::Platform;
use bpybuild_lib::platform::bitness::Bitness;
use bpybuild_lib::platform::os::OsFamily;
use bpybuild_lib::platform::python::RuntimeVersion;
use bpybuild_lib::request::SourceRequest;
use bpybuild_lib::resolve::BuildTarget;

/// Target flags shared by the resolving commands. Unset flags describe the
/// host.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
  /// Operating system to build for (android, darwin, linux, windows)
  #[arg(long)]
  os: Option<OsFamily>,

  /// Processor word width to build for (32 or 64)
  #[arg(long)]
  bits: Option<Bitness>,

  /// Python version the module is built for, e.g. 3.8 (default: python on PATH)
  #[arg(long)]
  python: Option<RuntimeVersion>,
}

impl TargetArgs {
  pub fn request(&self, version: Option<String>) -> SourceRequest {
    SourceRequest {
      version,
      platform: Some(Platform::new(
        self.os.unwrap_or_else(OsFamily::current),
        self.bits.unwrap_or_else(Bitness::current),
      )),
      runtime: self.python,
    }
  }

  pub fn target(&self) -> Result<BuildTarget> {
    Ok(self.request(None).target()?)
  }
}

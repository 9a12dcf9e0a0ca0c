//! Blocking execution of the `git` and `svn` executables.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::RemoteError;

/// Run `program` with `args` and return its trimmed stdout.
///
/// Svn prompts are disabled by the callers passing `--non-interactive`; git
/// is kept from prompting for credentials through `GIT_TERMINAL_PROMPT`.
pub(crate) fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String, RemoteError> {
  let mut command = Command::new(program);
  command.args(args).env("GIT_TERMINAL_PROMPT", "0").env("LC_ALL", "C");
  if let Some(dir) = cwd {
    command.current_dir(dir);
  }

  debug!(program, ?args, cwd = ?cwd, "spawning process");

  let output = command.output().map_err(|e| RemoteError::Spawn {
    program: program.to_string(),
    source: e,
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }

    return Err(RemoteError::Command {
      command: format!("{} {}", program, args.join(" ")),
      code: output.status.code(),
      stderr,
    });
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

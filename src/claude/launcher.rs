use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::error::MultiError;

fn ensure_executable_path(path: &Path) -> Result<()> {
    let meta = fs::metadata(path)
        .with_context(|| format!("claude binary path does not exist: {}", path.display()))?;
    if !meta.is_file() {
        anyhow::bail!("claude binary path is not a file: {}", path.display());
    }
    Ok(())
}

pub fn resolve_claude_bin() -> Result<PathBuf> {
    if let Ok(custom) = env::var("CLAUDE_MULTI_CLAUDE_BIN") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            ensure_executable_path(&path)?;
            return Ok(path);
        }
    }
    which::which("claude").map_err(|err| {
        MultiError::MissingClaudeBinary(format!(
            "set CLAUDE_MULTI_CLAUDE_BIN or put claude on PATH ({err})"
        ))
        .into()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub exit_code: Option<i32>,
    pub interrupted: bool,
}

impl LaunchOutcome {
    fn from_status(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
            interrupted: was_interrupted(status),
        }
    }
}

#[cfg(unix)]
fn was_interrupted(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(libc::SIGINT) || status.code() == Some(130)
}

#[cfg(not(unix))]
fn was_interrupted(status: ExitStatus) -> bool {
    // STATUS_CONTROL_C_EXIT
    status.code() == Some(0xC000_013Au32 as i32)
}

/// Keeps this process alive through a Ctrl-C aimed at the child. Installed
/// only after spawning so the child keeps the default disposition.
#[cfg(unix)]
struct InterruptShield {
    previous: libc::sighandler_t,
}

#[cfg(unix)]
impl InterruptShield {
    fn raise() -> Self {
        // SAFETY: swapping the SIGINT disposition for SIG_IGN has no
        // preconditions; the previous handler is restored on drop.
        let previous = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for InterruptShield {
    fn drop(&mut self) {
        if self.previous != libc::SIG_ERR {
            // SAFETY: restores the disposition returned by `raise`.
            unsafe {
                libc::signal(libc::SIGINT, self.previous);
            }
        }
    }
}

#[cfg(not(unix))]
struct InterruptShield;

#[cfg(not(unix))]
impl InterruptShield {
    fn raise() -> Self {
        Self
    }
}

/// Run `bin` interactively in `project_dir` and wait for it to finish.
pub fn run_interactive(bin: &Path, project_dir: &Path, args: &[String]) -> Result<LaunchOutcome> {
    let mut child = Command::new(bin)
        .args(args)
        .current_dir(project_dir)
        .spawn()
        .with_context(|| format!("failed to run `{}`", bin.display()))?;

    let _shield = InterruptShield::raise();
    let status = child
        .wait()
        .with_context(|| format!("failed waiting for `{}`", bin.display()))?;
    Ok(LaunchOutcome::from_status(status))
}

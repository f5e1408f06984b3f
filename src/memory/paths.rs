use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MultiError;

#[derive(Debug, Clone)]
pub struct MultiPaths {
    pub multi_home: PathBuf,
    pub shared_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub config_file: PathBuf,
    pub logs_dir: PathBuf,
    pub shared_instructions: PathBuf,
    pub claude_dir: PathBuf,
    pub claude_projects_dir: PathBuf,
}

impl MultiPaths {
    /// Layout with every directory under `root`.
    #[cfg(test)]
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            multi_home: root.to_path_buf(),
            shared_dir: root.join("shared"),
            sessions_dir: root.join("sessions"),
            config_file: root.join("config.json"),
            logs_dir: root.join("logs"),
            shared_instructions: root.join("shared").join("CLAUDE.md"),
            claude_dir: root.join("claude"),
            claude_projects_dir: root.join("claude").join("projects"),
        }
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<MultiPaths> {
    let home = required_home_dir()?;
    let multi_home = env_or_default_path("CLAUDE_MULTI_HOME", home.join(".claude-multi"));

    let shared_dir = env_or_default_path("CLAUDE_MULTI_SHARED_DIR", multi_home.join("shared"));
    let sessions_dir =
        env_or_default_path("CLAUDE_MULTI_SESSIONS_DIR", multi_home.join("sessions"));
    let config_file =
        env_or_default_path("CLAUDE_MULTI_CONFIG_PATH", multi_home.join("config.json"));
    let logs_dir = env_or_default_path("CLAUDE_MULTI_LOGS_DIR", multi_home.join("logs"));
    let shared_instructions = shared_dir.join("CLAUDE.md");

    let claude_dir = env_or_default_path("CLAUDE_CONFIG_DIR", home.join(".claude"));
    let claude_projects_dir =
        env_or_default_path("CLAUDE_MULTI_PROJECTS_DIR", claude_dir.join("projects"));

    Ok(MultiPaths {
        multi_home,
        shared_dir,
        sessions_dir,
        config_file,
        logs_dir,
        shared_instructions,
        claude_dir,
        claude_projects_dir,
    })
}

/// Create the tool home and the directories under it.
pub fn ensure_layout(paths: &MultiPaths) -> Result<()> {
    for dir in [
        &paths.multi_home,
        &paths.shared_dir,
        &paths.sessions_dir,
        &paths.logs_dir,
    ] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Resolve a user-supplied project directory to its canonical absolute form.
pub fn resolve_project_dir(raw: &Path) -> Result<PathBuf> {
    let canonical = match fs::canonicalize(raw) {
        Ok(path) => path,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(MultiError::ProjectPathMissing(raw.to_path_buf()).into());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to resolve {}", raw.display()));
        }
    };
    if !canonical.is_dir() {
        return Err(MultiError::ProjectPathMissing(canonical).into());
    }
    Ok(strip_verbatim_prefix(canonical))
}

fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path;
    };
    match raw.strip_prefix(r"\\?\") {
        Some(rest) if !rest.starts_with("UNC") => PathBuf::from(rest),
        _ => path,
    }
}

/// Default session name: the last component of the project directory.
pub fn default_session_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("default")
        .to_string()
}

/// Absolute form of a user-supplied file path with a leading `~` expanded.
/// The file does not have to exist.
pub fn absolute_user_path(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    let expanded = if trimmed == "~" {
        required_home_dir()?
    } else if let Some(rest) = trimmed
        .strip_prefix("~/")
        .or_else(|| trimmed.strip_prefix("~\\"))
    {
        required_home_dir()?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };
    std::path::absolute(&expanded)
        .with_context(|| format!("failed to make {} absolute", expanded.display()))
}

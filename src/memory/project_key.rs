//! Per-project storage naming.
//!
//! Claude Code keeps per-project state under a directory named after the
//! project's absolute path. The escaping is one-way and not injective: a
//! component that already contains `-` cannot be told apart from a separator.

use std::path::{Path, PathBuf};

/// Escape a drive-letter/backslash path (`C:\Users\me` -> `C--Users-me`).
pub fn escape_windows_path(raw: &str) -> String {
    raw.replace([':', '\\'], "-")
        .trim_start_matches('-')
        .to_string()
}

/// Escape a forward-slash path (`/home/me/app` -> `home-me-app`).
pub fn escape_unix_path(raw: &str) -> String {
    let rest = raw.strip_prefix('/').unwrap_or(raw);
    rest.replace('/', "-")
}

/// Storage identifier for an absolute project directory on this platform.
pub fn project_key(project_dir: &Path) -> String {
    let raw = project_dir.to_string_lossy();
    if cfg!(windows) {
        escape_windows_path(&raw)
    } else {
        escape_unix_path(&raw)
    }
}

pub fn project_storage(claude_projects_dir: &Path, project_dir: &Path) -> PathBuf {
    claude_projects_dir.join(project_key(project_dir))
}

pub fn mirror_dir(project_storage: &Path) -> PathBuf {
    project_storage.join("memory")
}

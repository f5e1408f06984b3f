use crate::memory::paths::MultiPaths;
use crate::memory::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn audit_log_path(paths: &MultiPaths) -> PathBuf {
    paths.logs_dir.join("audit.log")
}

pub fn append_event(paths: &MultiPaths, phase: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = audit_log_path(paths);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Like [`append_event`], but a logging failure only produces a warning.
pub fn record(paths: &MultiPaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = append_event(paths, phase, status, message) {
        crate::memory::warn::emit(
            "AUDIT_WRITE_FAILED",
            phase,
            &audit_log_path(paths).display().to_string(),
            &format!("{err:#}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{append_event, audit_log_path};
    use crate::memory::paths::MultiPaths;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn events_are_appended_as_json_lines() {
        let tmp = tempdir().expect("tempdir");
        let paths = MultiPaths::rooted_at(tmp.path());

        append_event(&paths, "sync-to", "ok", "copied=1").expect("first");
        append_event(&paths, "sync-from", "failed", "merge failed").expect("second");

        let raw = fs::read_to_string(audit_log_path(&paths)).expect("read log");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).expect("json");
        assert_eq!(second["phase"], "sync-from");
        assert_eq!(second["status"], "failed");
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::memory::sync::{Entry, is_markdown, list_entries};

/// Every session directory name, sorted. A session with no backups yet is
/// still listed.
pub fn list_sessions(sessions_dir: &Path) -> Result<Vec<String>> {
    if !sessions_dir.exists() {
        return Ok(Vec::new());
    }
    let names = list_entries(sessions_dir)?
        .into_iter()
        .filter_map(|entry| match entry {
            Entry::Directory(path) => path
                .file_name()
                .and_then(|s| s.to_str())
                .map(ToOwned::to_owned),
            Entry::File(_) => None,
        })
        .collect();
    Ok(names)
}

/// Backup directories of one session, newest first.
pub fn session_history(sessions_dir: &Path, session_name: &str) -> Result<Vec<PathBuf>> {
    let session_dir = sessions_dir.join(session_name);
    if !session_dir.exists() {
        return Ok(Vec::new());
    }
    let mut snapshots: Vec<PathBuf> = list_entries(&session_dir)?
        .into_iter()
        .filter_map(|entry| match entry {
            Entry::Directory(path) => Some(path),
            Entry::File(_) => None,
        })
        .collect();
    snapshots.reverse();
    Ok(snapshots)
}

#[derive(Debug, Clone)]
pub struct MemoryFileInfo {
    /// Path relative to the shared pool, `/`-separated.
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedSummary {
    pub files: Vec<MemoryFileInfo>,
    pub total_size: u64,
    pub last_updated: Option<DateTime<Local>>,
}

impl SharedSummary {
    fn add(&mut self, name: String, path: &Path) -> Result<()> {
        let meta =
            fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
        let modified: DateTime<Local> = meta
            .modified()
            .with_context(|| format!("no mtime for {}", path.display()))?
            .into();
        self.total_size += meta.len();
        if self.last_updated.is_none_or(|last| modified > last) {
            self.last_updated = Some(modified);
        }
        self.files.push(MemoryFileInfo {
            name,
            size: meta.len(),
            modified,
        });
        Ok(())
    }
}

pub fn shared_summary(shared_dir: &Path) -> Result<SharedSummary> {
    let mut summary = SharedSummary::default();
    if !shared_dir.exists() {
        return Ok(summary);
    }

    let entries = list_entries(shared_dir)?;
    for entry in &entries {
        if let Entry::File(path) = entry
            && is_markdown(path)
            && let Some(name) = path.file_name().and_then(|s| s.to_str())
        {
            summary.add(name.to_string(), path)?;
        }
    }
    for entry in &entries {
        let Entry::Directory(topic_dir) = entry else {
            continue;
        };
        let Some(topic) = topic_dir.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        for topic_entry in list_entries(topic_dir)? {
            if let Entry::File(path) = &topic_entry
                && is_markdown(path)
                && let Some(name) = path.file_name().and_then(|s| s.to_str())
            {
                summary.add(format!("{topic}/{name}"), path)?;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{list_sessions, session_history, shared_summary};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sessions_and_history_are_sorted() {
        let tmp = tempdir().expect("tempdir");
        let sessions = tmp.path().join("sessions");
        fs::create_dir_all(sessions.join("web/20260101_090000")).expect("mkdir");
        fs::create_dir_all(sessions.join("web/20260102_090000")).expect("mkdir");
        fs::create_dir_all(sessions.join("api/20260103_090000")).expect("mkdir");

        assert_eq!(list_sessions(&sessions).expect("list"), vec!["api", "web"]);
        let history = session_history(&sessions, "web").expect("history");
        assert_eq!(history.len(), 2);
        assert!(history[0].ends_with("20260102_090000"));
        assert!(session_history(&sessions, "none").expect("empty").is_empty());
    }

    #[test]
    fn session_without_backups_is_listed_with_empty_history() {
        let tmp = tempdir().expect("tempdir");
        let sessions = tmp.path().join("sessions");
        fs::create_dir_all(sessions.join("fresh")).expect("mkdir");
        fs::write(sessions.join("stray.md"), "x").expect("write");

        assert_eq!(list_sessions(&sessions).expect("list"), vec!["fresh"]);
        assert!(session_history(&sessions, "fresh").expect("history").is_empty());
    }

    #[test]
    fn missing_sessions_root_lists_nothing() {
        let tmp = tempdir().expect("tempdir");
        assert!(list_sessions(&tmp.path().join("nope")).expect("list").is_empty());
    }

    #[test]
    fn summary_counts_top_level_and_topic_files() {
        let tmp = tempdir().expect("tempdir");
        let shared = tmp.path().join("shared");
        fs::create_dir_all(shared.join("infra")).expect("mkdir");
        fs::write(shared.join("MEMORY.md"), "12345").expect("write");
        fs::write(shared.join("infra/setup.md"), "123").expect("write");
        fs::write(shared.join("notes.txt"), "ignored").expect("write");

        let summary = shared_summary(&shared).expect("summary");
        let names: Vec<&str> = summary.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["MEMORY.md", "infra/setup.md"]);
        assert_eq!(summary.total_size, 8);
        assert!(summary.last_updated.is_some());
    }
}

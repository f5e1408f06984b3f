use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::MultiError;
use crate::memory::merge::merge_files;
use crate::memory::project_key::mirror_dir;
use crate::memory::warn;

/// A directory child, tagged by what it is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(PathBuf),
    Directory(PathBuf),
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Directory(path) => path,
        }
    }
}

/// Visible children of a directory, plus the ones whose metadata could not
/// be read.
#[derive(Debug, Default)]
struct Listing {
    entries: Vec<Entry>,
    unreadable: Vec<(PathBuf, std::io::Error)>,
}

fn scan_dir(dir: &Path) -> Result<Listing> {
    let read_dir =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut listing = Listing::default();
    for entry in read_dir {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => listing.entries.push(Entry::Directory(path)),
            Ok(meta) if meta.is_file() => listing.entries.push(Entry::File(path)),
            Ok(_) => {}
            Err(err) => listing.unreadable.push((path, err)),
        }
    }
    listing
        .entries
        .sort_by(|a, b| a.path().file_name().cmp(&b.path().file_name()));
    Ok(listing)
}

/// Visible children of `dir`, sorted by file name. Symlinks are followed;
/// entries that cannot be stat'ed are reported on stderr and left out.
pub fn list_entries(dir: &Path) -> Result<Vec<Entry>> {
    let listing = scan_dir(dir)?;
    for (path, err) in &listing.unreadable {
        warn::emit(
            "ENTRY_STAT_FAILED",
            "list",
            &path.display().to_string(),
            &err.to_string(),
        );
    }
    Ok(listing.entries)
}

/// Reject anything but one plain path segment, so backups stay under the
/// sessions root.
pub fn validate_session_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(MultiError::InvalidSessionName(name.to_string()).into()),
    }
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("md")
}

fn markdown_files(entries: &[Entry]) -> impl Iterator<Item = &Path> {
    entries.iter().filter_map(|entry| match entry {
        Entry::File(path) if is_markdown(path) => Some(path.as_path()),
        _ => None,
    })
}

fn topic_dirs(entries: &[Entry]) -> impl Iterator<Item = &Path> {
    entries.iter().filter_map(|entry| match entry {
        Entry::Directory(path) => Some(path.as_path()),
        Entry::File(_) => None,
    })
}

/// Copy `source` to `target` verbatim, keeping the source mtime when the
/// platform allows it.
pub fn copy_verbatim(source: &Path, target: &Path) -> Result<()> {
    fs::copy(source, target).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            target.display()
        )
    })?;
    if let Ok(modified) = fs::metadata(source).and_then(|m| m.modified())
        && let Ok(file) = fs::OpenOptions::new().write(true).open(target)
    {
        let _ = file.set_modified(modified);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub copied: Vec<PathBuf>,
    pub merged: Vec<PathBuf>,
    /// Merges that found nothing new to add.
    pub unchanged: Vec<PathBuf>,
    pub backed_up: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub backup_dir: Option<PathBuf>,
}

impl SyncOutcome {
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn touched(&self) -> usize {
        self.copied.len() + self.merged.len() + self.unchanged.len()
    }

    fn fail(&mut self, path: &Path, stage: &'static str, err: anyhow::Error) {
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            stage,
            error: format!("{err:#}"),
        });
    }

    /// Merge `source` into `target` when it exists there, else copy it.
    fn fold_into(&mut self, source: &Path, target: &Path) {
        if target.exists() {
            match merge_files(source, target) {
                Ok(merge) if merge.changed() => self.merged.push(target.to_path_buf()),
                Ok(_) => self.unchanged.push(target.to_path_buf()),
                Err(err) => self.fail(target, "merge", err),
            }
        } else {
            match copy_verbatim(source, target) {
                Ok(()) => self.copied.push(target.to_path_buf()),
                Err(err) => self.fail(target, "copy", err),
            }
        }
    }

    /// Record every unreadable entry as a failure and hand back the rest.
    fn take_listing(&mut self, listing: Listing) -> Vec<Entry> {
        for (path, err) in listing.unreadable {
            self.fail(&path, "stat", err.into());
        }
        listing.entries
    }

    fn back_up(&mut self, source: &Path, target: &Path) {
        match copy_verbatim(source, target) {
            Ok(()) => self.backed_up.push(target.to_path_buf()),
            Err(err) => self.fail(target, "backup", err),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SyncFromResult {
    NothingToSync { mirror: PathBuf },
    Synced(SyncOutcome),
}

#[derive(Debug, Clone)]
pub struct SyncEngine {
    shared_dir: PathBuf,
    sessions_dir: PathBuf,
}

impl SyncEngine {
    pub fn new(shared_dir: impl Into<PathBuf>, sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            shared_dir: shared_dir.into(),
            sessions_dir: sessions_dir.into(),
        }
    }

    /// Shared pool -> project mirror.
    pub fn sync_to_session(&self, project_storage: &Path) -> Result<SyncOutcome> {
        let memory_dir = mirror_dir(project_storage);
        fs::create_dir_all(&memory_dir)
            .with_context(|| format!("failed to create {}", memory_dir.display()))?;

        let mut outcome = SyncOutcome::default();
        if !self.shared_dir.exists() {
            return Ok(outcome);
        }
        let entries = outcome.take_listing(scan_dir(&self.shared_dir)?);

        for shared_file in markdown_files(&entries) {
            let Some(name) = shared_file.file_name() else {
                continue;
            };
            outcome.fold_into(shared_file, &memory_dir.join(name));
        }

        for topic_dir in topic_dirs(&entries) {
            let Some(topic) = topic_dir.file_name() else {
                continue;
            };
            let target_dir = memory_dir.join(topic);
            if let Err(err) = fs::create_dir_all(&target_dir) {
                outcome.fail(&target_dir, "mkdir", err.into());
                continue;
            }
            let topic_entries = match scan_dir(topic_dir) {
                Ok(listing) => outcome.take_listing(listing),
                Err(err) => {
                    outcome.fail(topic_dir, "list", err);
                    continue;
                }
            };
            for topic_file in markdown_files(&topic_entries) {
                let Some(name) = topic_file.file_name() else {
                    continue;
                };
                outcome.fold_into(topic_file, &target_dir.join(name));
            }
        }

        Ok(outcome)
    }

    /// Project mirror -> shared pool, snapshotting every mirror file first.
    pub fn sync_from_session(
        &self,
        project_storage: &Path,
        session_name: &str,
    ) -> Result<SyncFromResult> {
        validate_session_name(session_name)?;
        let memory_dir = mirror_dir(project_storage);
        if !memory_dir.is_dir() {
            return Ok(SyncFromResult::NothingToSync { mirror: memory_dir });
        }

        let listing = scan_dir(&memory_dir)?;
        fs::create_dir_all(&self.shared_dir)
            .with_context(|| format!("failed to create {}", self.shared_dir.display()))?;
        let backup_dir = create_backup_dir(&self.sessions_dir.join(session_name))?;

        let mut outcome = SyncOutcome {
            backup_dir: Some(backup_dir.clone()),
            ..SyncOutcome::default()
        };
        let entries = outcome.take_listing(listing);

        for session_file in markdown_files(&entries) {
            let Some(name) = session_file.file_name() else {
                continue;
            };
            outcome.back_up(session_file, &backup_dir.join(name));
            outcome.fold_into(session_file, &self.shared_dir.join(name));
        }

        for topic_dir in topic_dirs(&entries) {
            let Some(topic) = topic_dir.file_name() else {
                continue;
            };
            let shared_topic_dir = self.shared_dir.join(topic);
            if let Err(err) = fs::create_dir_all(&shared_topic_dir) {
                outcome.fail(&shared_topic_dir, "mkdir", err.into());
                continue;
            }
            let topic_entries = match scan_dir(topic_dir) {
                Ok(listing) => outcome.take_listing(listing),
                Err(err) => {
                    outcome.fail(topic_dir, "list", err);
                    continue;
                }
            };
            for topic_file in markdown_files(&topic_entries) {
                let Some(name) = topic_file.file_name() else {
                    continue;
                };
                // Backups are flat: topic files land beside top-level ones.
                outcome.back_up(topic_file, &backup_dir.join(name));
                outcome.fold_into(topic_file, &shared_topic_dir.join(name));
            }
        }

        Ok(SyncFromResult::Synced(outcome))
    }
}

pub fn backup_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Claim a fresh `YYYYMMDD_HHMMSS` directory under `session_root`. A second
/// claim within the same second gets a `_N` suffix instead of reusing the
/// earlier backup.
fn create_backup_dir(session_root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(session_root)
        .with_context(|| format!("failed to create {}", session_root.display()))?;
    let stamp = backup_stamp();
    let mut attempt = 0usize;
    loop {
        let name = if attempt == 0 {
            stamp.clone()
        } else {
            format!("{stamp}_{attempt}")
        };
        let candidate = session_root.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to create {}", candidate.display()));
            }
        }
    }
}

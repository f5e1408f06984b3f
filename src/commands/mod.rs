pub mod config;
pub mod init;
pub mod sessions;
pub mod start;
pub mod status;
pub mod sync;

use serde::Serialize;
use std::path::Path;

use crate::memory::audit;
use crate::memory::paths::MultiPaths;
use crate::memory::sync::{SyncEngine, SyncFromResult, SyncOutcome};
use crate::memory::warn;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

pub fn progress(text: &str) {
    eprintln!("{text}");
}

fn record_outcome(
    paths: &MultiPaths,
    phase: &str,
    outcome: &SyncOutcome,
    report: &mut CommandReport,
) {
    report.detail(format!(
        "{phase}: copied={} merged={} unchanged={} backed_up={} failed={}",
        outcome.copied.len(),
        outcome.merged.len(),
        outcome.unchanged.len(),
        outcome.backed_up.len(),
        outcome.failures.len()
    ));
    for failure in &outcome.failures {
        let path = failure.path.display().to_string();
        warn::emit("FILE_SYNC_FAILED", failure.stage, &path, &failure.error);
        report.issue(format!(
            "{phase}: {} {path} failed: {}",
            failure.stage, failure.error
        ));
    }
    let status = if outcome.ok() { "ok" } else { "partial" };
    audit::record(
        paths,
        phase,
        status,
        &format!(
            "touched={} backed_up={} failed={}",
            outcome.touched(),
            outcome.backed_up.len(),
            outcome.failures.len()
        ),
    );
}

/// Shared pool -> project mirror, folded into `report`.
pub fn sync_to(
    paths: &MultiPaths,
    engine: &SyncEngine,
    project_storage: &Path,
    report: &mut CommandReport,
) {
    progress("[>>] Syncing shared memory to session...");
    match engine.sync_to_session(project_storage) {
        Ok(outcome) => {
            record_outcome(paths, "sync-to", &outcome, report);
            if outcome.ok() {
                progress("[OK] Memory synced to session");
            } else {
                progress("[!] Memory synced to session with errors");
            }
        }
        Err(err) => {
            audit::record(paths, "sync-to", "failed", &format!("{err:#}"));
            report.issue(format!("sync-to failed: {err:#}"));
        }
    }
}

/// Project mirror -> shared pool, folded into `report`.
pub fn sync_from(
    paths: &MultiPaths,
    engine: &SyncEngine,
    project_storage: &Path,
    session_name: &str,
    report: &mut CommandReport,
) {
    progress("[<<] Syncing session memory back to shared pool...");
    match engine.sync_from_session(project_storage, session_name) {
        Ok(SyncFromResult::NothingToSync { mirror }) => {
            report.detail(format!(
                "sync-from: nothing to sync ({} does not exist)",
                mirror.display()
            ));
            audit::record(paths, "sync-from", "noop", &mirror.display().to_string());
            progress("[!] No session memory to sync");
        }
        Ok(SyncFromResult::Synced(outcome)) => {
            if let Some(backup) = &outcome.backup_dir {
                report.detail(format!("backup_dir={}", backup.display()));
            }
            record_outcome(paths, "sync-from", &outcome, report);
            if outcome.ok() {
                progress("[OK] Memory synced from session");
            } else {
                progress("[!] Memory synced from session with errors");
            }
        }
        Err(err) => {
            audit::record(paths, "sync-from", "failed", &format!("{err:#}"));
            report.issue(format!("sync-from failed: {err:#}"));
        }
    }
}

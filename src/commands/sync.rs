use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;

use crate::commands::{CommandReport, sync_from, sync_to};
use crate::memory::config::{ConfigProvider, JsonConfigStore};
use crate::memory::paths::{default_session_name, ensure_layout, resolve_paths, resolve_project_dir};
use crate::memory::project_key::project_storage;
use crate::memory::sync::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SyncDirection {
    /// Shared pool -> session
    To,
    /// Session -> shared pool
    From,
    #[default]
    Both,
}

impl SyncDirection {
    fn includes_to(self) -> bool {
        matches!(self, Self::To | Self::Both)
    }

    fn includes_from(self) -> bool {
        matches!(self, Self::From | Self::Both)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub project_path: PathBuf,
    pub direction: SyncDirection,
}

pub fn run(opts: &SyncOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let project_dir = resolve_project_dir(&opts.project_path)?;
    ensure_layout(&paths)?;
    let config = JsonConfigStore::load(&paths)?;

    let mut report = CommandReport::new("sync");
    let storage = project_storage(&paths.claude_projects_dir, &project_dir);
    let session_name = default_session_name(&project_dir);
    let engine = SyncEngine::new(config.shared_dir(), config.sessions_dir());

    report.detail(format!("project={}", project_dir.display()));
    report.detail(format!("project_storage={}", storage.display()));
    report.detail(format!("session={session_name}"));

    if opts.direction.includes_to() {
        sync_to(&paths, &engine, &storage, &mut report);
    }
    if opts.direction.includes_from() {
        sync_from(&paths, &engine, &storage, &session_name, &mut report);
    }

    Ok(report)
}

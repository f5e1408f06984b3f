use anyhow::Result;
use std::path::PathBuf;

use crate::claude::instructions;
use crate::claude::launcher::{resolve_claude_bin, run_interactive};
use crate::commands::{CommandReport, progress, sync_from, sync_to};
use crate::memory::audit;
use crate::memory::config::{ConfigProvider, JsonConfigStore};
use crate::memory::paths::{
    absolute_user_path, default_session_name, ensure_layout, resolve_paths, resolve_project_dir,
};
use crate::memory::project_key::project_storage;
use crate::memory::sync::{SyncEngine, validate_session_name};
use crate::memory::warn;

#[derive(Debug, Clone)]
pub struct StartOptions {
    pub project_path: PathBuf,
    pub name: Option<String>,
    pub instructions: Vec<String>,
}

const BANNER_WIDTH: usize = 60;

pub fn run(opts: &StartOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let project_dir = resolve_project_dir(&opts.project_path)?;
    let session_name = opts
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_session_name(&project_dir));
    validate_session_name(&session_name)?;
    ensure_layout(&paths)?;
    let config = JsonConfigStore::load(&paths)?;

    let mut report = CommandReport::new("start");
    let storage = project_storage(&paths.claude_projects_dir, &project_dir);
    let engine = SyncEngine::new(config.shared_dir(), config.sessions_dir());

    report.detail(format!("session={session_name}"));
    report.detail(format!("project={}", project_dir.display()));
    report.detail(format!("project_storage={}", storage.display()));
    progress(&format!("Session: {session_name}"));
    progress(&format!("Project: {}", project_dir.display()));
    progress(&format!("Claude Code project path: {}", storage.display()));

    let bin = match resolve_claude_bin() {
        Ok(bin) => bin,
        Err(err) => {
            report.issue(format!("{err:#}"));
            return Ok(report);
        }
    };

    let mut launch_args = Vec::new();
    if config.settings().inject_instructions {
        let configured = config
            .settings()
            .instruction_files
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>();
        let extra = opts
            .instructions
            .iter()
            .map(|raw| absolute_user_path(raw))
            .collect::<Result<Vec<_>>>()?;
        let bundle = instructions::compose(&paths.shared_instructions, &configured, &extra)?;
        for missing in &bundle.missing {
            // The shared CLAUDE.md is optional; only named files are worth a warning.
            if *missing != paths.shared_instructions {
                warn::emit(
                    "INSTRUCTIONS_MISSING",
                    "start",
                    &missing.display().to_string(),
                    "file not found",
                );
                report.detail(format!("instructions_missing={}", missing.display()));
            }
        }
        for source in &bundle.sources {
            report.detail(format!("instructions={}", source.display()));
        }
        launch_args = bundle.launch_args();
    }

    if config.sync_on_start() {
        sync_to(&paths, &engine, &storage, &mut report);
    }

    progress("\n[*] Starting Claude Code session...");
    progress(&format!("Working directory: {}", project_dir.display()));
    progress(&format!("\n{}", "=".repeat(BANNER_WIDTH)));
    progress("Claude Code is running. When you exit, memory will be synced back.");
    progress(&format!("{}\n", "=".repeat(BANNER_WIDTH)));

    let outcome = match run_interactive(&bin, &project_dir, &launch_args) {
        Ok(outcome) => outcome,
        Err(err) => {
            audit::record(&paths, "launch", "failed", &format!("{err:#}"));
            report.issue(format!("error running claude: {err:#}"));
            return Ok(report);
        }
    };

    progress(&format!("\n{}", "=".repeat(BANNER_WIDTH)));
    if outcome.interrupted {
        progress("[!] Session interrupted by user");
        report.detail("claude_interrupted=true");
    } else {
        progress("Claude Code session ended");
    }
    progress(&"=".repeat(BANNER_WIDTH));
    report.detail(format!(
        "claude_exit_code={}",
        outcome
            .exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "none".to_string())
    ));

    if config.sync_on_end() {
        sync_from(&paths, &engine, &storage, &session_name, &mut report);
    }

    Ok(report)
}

use anyhow::Result;

use crate::commands::CommandReport;
use crate::memory::history::{list_sessions, session_history};
use crate::memory::paths::resolve_paths;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("sessions");
    report.detail(format!("sessions_dir={}", paths.sessions_dir.display()));

    let sessions = list_sessions(&paths.sessions_dir)?;
    if sessions.is_empty() {
        report.detail("No sessions tracked yet.");
        return Ok(report);
    }

    for name in sessions {
        let snapshots = session_history(&paths.sessions_dir, &name)?;
        let latest = snapshots
            .first()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "none".to_string());
        report.detail(format!(
            "session={name} snapshots={} latest={latest}",
            snapshots.len()
        ));
    }

    Ok(report)
}

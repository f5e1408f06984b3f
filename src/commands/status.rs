use anyhow::Result;

use crate::commands::CommandReport;
use crate::memory::history::shared_summary;
use crate::memory::paths::resolve_paths;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("location={}", paths.shared_dir.display()));
    if !paths.shared_dir.exists() {
        report.issue("missing shared memory dir (run `claude-multi init`)");
        return Ok(report);
    }

    let summary = shared_summary(&paths.shared_dir)?;
    report.detail(format!("total_files={}", summary.files.len()));
    report.detail(format!("total_size={} bytes", summary.total_size));
    if let Some(last) = summary.last_updated {
        report.detail(format!("last_updated={}", last.format(TIME_FORMAT)));
    }

    if summary.files.is_empty() {
        report.detail("No memory files yet.");
    }
    for file in &summary.files {
        report.detail(format!(
            "file={} size={} modified={}",
            file.name,
            file.size,
            file.modified.format(TIME_FORMAT)
        ));
    }

    Ok(report)
}

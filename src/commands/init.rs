use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::commands::CommandReport;
use crate::memory::config::JsonConfigStore;
use crate::memory::paths::{ensure_layout, resolve_paths};

const DEFAULT_MEMORY_MD: &str = "\
# Shared Memory Across Claude Code Sessions

This file contains learnings shared across all Claude Code sessions.

## Getting Started

- Use `claude-multi start <project>` to start a session
- All sessions will automatically sync learnings here
- Organize knowledge by topic in separate .md files
";

const DEFAULT_CLAUDE_MD: &str = "\
# Shared Claude Code Instructions

These instructions are automatically injected into every session.

## Example Instructions

Add your common instructions here. For example:

- Always run tests before committing
- Follow the project's code style guide

## Tips

- Edit this file in the shared memory directory
- Add project-specific CLAUDE.md files with --instructions
- Configure default instruction files with: claude-multi config --add-instructions <file>
";

/// Write `contents` unless `path` already exists. Returns true if written.
fn write_if_absent(path: &Path, contents: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("init");

    ensure_layout(&paths)?;
    report.detail(format!("config_dir={}", paths.multi_home.display()));
    report.detail(format!("shared_memory={}", paths.shared_dir.display()));
    report.detail(format!("sessions_dir={}", paths.sessions_dir.display()));

    let config = JsonConfigStore::load(&paths)?;
    if !config.exists() {
        let written = config.save()?;
        report.detail(format!("created {}", written.display()));
    }

    let memory_md = paths.shared_dir.join("MEMORY.md");
    if write_if_absent(&memory_md, DEFAULT_MEMORY_MD)? {
        report.detail(format!("created {}", memory_md.display()));
    }
    if write_if_absent(&paths.shared_instructions, DEFAULT_CLAUDE_MD)? {
        report.detail(format!("created {}", paths.shared_instructions.display()));
    }

    report.detail("next: run `claude-multi start <project-path>` to start a session");
    Ok(report)
}

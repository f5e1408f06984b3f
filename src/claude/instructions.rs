//! Extra instructions handed to claude at launch.
//!
//! Sources, in order: the shared pool's `CLAUDE.md`, the configured
//! `instruction_files`, then files named on the command line.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const APPEND_PROMPT_FLAG: &str = "--append-system-prompt";

#[derive(Debug, Clone, Default)]
pub struct InstructionBundle {
    pub sources: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub text: String,
}

impl InstructionBundle {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Arguments that pass the bundle to claude.
    pub fn launch_args(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        vec![APPEND_PROMPT_FLAG.to_string(), self.text.clone()]
    }
}

pub fn compose(
    shared_instructions: &Path,
    configured: &[PathBuf],
    extra: &[PathBuf],
) -> Result<InstructionBundle> {
    let mut bundle = InstructionBundle::default();
    let mut sections: Vec<String> = Vec::new();

    let candidates = std::iter::once(shared_instructions.to_path_buf())
        .chain(configured.iter().cloned())
        .chain(extra.iter().cloned());
    for path in candidates {
        if bundle.sources.contains(&path) || bundle.missing.contains(&path) {
            continue;
        }
        if !path.is_file() {
            bundle.missing.push(path);
            continue;
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            sections.push(trimmed.to_string());
        }
        bundle.sources.push(path);
    }

    bundle.text = sections.join("\n\n");
    Ok(bundle)
}

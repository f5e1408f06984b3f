//! Line-level merge of two markdown memory documents.
//!
//! The target keeps every line it already has. Source lines are appended only
//! when they carry something the target lacks: bullets and plain lines are
//! compared by their normalized form, headings verbatim. New bullets are
//! grouped under a single `## Updates from <stamp>` heading.

use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::memory::util::write_replace;

pub const UPDATE_HEADING_PREFIX: &str = "## Updates from ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Heading,
    Bullet,
    Content,
}

pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with(['-', '*', '+']) {
        LineKind::Bullet
    } else if trimmed.starts_with('#') {
        LineKind::Heading
    } else {
        LineKind::Content
    }
}

/// Key used to decide whether two lines state the same fact.
pub fn normalize_line(line: &str) -> String {
    let stripped = line
        .trim()
        .trim_start_matches(['-', '*', '+', ' ']);
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    pub added_lines: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.added_lines > 0
    }
}

/// Split on `\n`; a final newline terminates the last line instead of
/// opening an empty one.
fn split_document(text: &str) -> (Vec<&str>, bool) {
    if text.is_empty() {
        return (Vec::new(), false);
    }
    match text.strip_suffix('\n') {
        Some(body) => (body.split('\n').collect(), true),
        None => (text.split('\n').collect(), false),
    }
}

struct MergeBuffer<'a> {
    lines: Vec<&'a str>,
    emitted: HashSet<&'a str>,
    seen: HashSet<String>,
}

impl<'a> MergeBuffer<'a> {
    fn push(&mut self, line: &'a str) {
        self.emitted.insert(line);
        self.lines.push(line);
    }
}

/// Merge `source` into `target`. `stamp` is the text placed after the
/// update heading prefix.
pub fn merge_documents(target: &str, source: &str, stamp: &str) -> MergeOutcome {
    let (target_lines, target_trailing_newline) = split_document(target);
    let (source_lines, _) = split_document(source);
    let heading = format!("{UPDATE_HEADING_PREFIX}{stamp}");

    let mut buf = MergeBuffer {
        lines: Vec::with_capacity(target_lines.len() + source_lines.len()),
        emitted: HashSet::new(),
        seen: HashSet::new(),
    };

    for line in target_lines {
        match classify(line) {
            LineKind::Bullet | LineKind::Content => {
                buf.seen.insert(normalize_line(line));
            }
            LineKind::Blank | LineKind::Heading => {}
        }
        buf.push(line);
    }
    let target_len = buf.lines.len();

    let mut update_section = false;
    for line in source_lines {
        match classify(line) {
            LineKind::Blank => {}
            LineKind::Heading => {
                if !buf.emitted.contains(line) {
                    buf.push(line);
                }
            }
            LineKind::Bullet => {
                if !buf.seen.insert(normalize_line(line)) {
                    continue;
                }
                if !update_section {
                    update_section = true;
                    buf.push("");
                    buf.push(&heading);
                    buf.push("");
                }
                buf.push(line);
            }
            LineKind::Content => {
                if buf.seen.insert(normalize_line(line)) {
                    buf.push(line);
                }
            }
        }
    }

    let added_lines = buf.lines.len() - target_len;
    let mut text = buf.lines.join("\n");
    if added_lines == 0 && target_trailing_newline {
        text.push('\n');
    }

    MergeOutcome { text, added_lines }
}

pub fn update_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Merge `source` into `target` on disk. Only `target` is written, and it is
/// replaced whole.
pub fn merge_files(source: &Path, target: &Path) -> Result<MergeOutcome> {
    let source_text = fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    let target_text = fs::read_to_string(target)
        .with_context(|| format!("failed to read {}", target.display()))?;

    let outcome = merge_documents(&target_text, &source_text, &update_stamp());
    write_replace(target, outcome.text.as_bytes())?;
    Ok(outcome)
}

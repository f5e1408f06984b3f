use anyhow::Result;
use serde_json::Value;

use crate::commands::CommandReport;
use crate::env_loader::active_overrides;
use crate::memory::config::{ConfigProvider, JsonConfigStore, coerce_value};
use crate::memory::paths::{absolute_user_path, resolve_paths};

#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub key: Option<String>,
    pub value: Option<String>,
    pub add_instructions: Option<String>,
    pub remove_instructions: Option<String>,
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn run(opts: &ConfigOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut config = JsonConfigStore::load(&paths)?;
    let mut report = CommandReport::new("config");

    if let Some(raw) = &opts.add_instructions {
        let file = absolute_user_path(raw)?.display().to_string();
        if config.add_instruction_file(&file)? {
            report.detail(format!("added instruction file: {file}"));
        } else {
            report.detail(format!("instruction file already in list: {file}"));
        }
        return Ok(report);
    }

    if let Some(raw) = &opts.remove_instructions {
        let file = absolute_user_path(raw)?.display().to_string();
        if config.remove_instruction_file(&file)? {
            report.detail(format!("removed instruction file: {file}"));
        } else {
            report.detail(format!("instruction file not in list: {file}"));
        }
        return Ok(report);
    }

    match (&opts.key, &opts.value) {
        (Some(key), Some(raw)) => {
            let value = coerce_value(raw);
            config.set(key, value.clone())?;
            report.detail(format!("set {key} = {}", render(&value)));
        }
        (Some(key), None) => match config.get(key) {
            Some(value) => report.detail(format!("{key} = {}", render(&value))),
            None => report.detail(format!("{key} = (unset)")),
        },
        (None, _) => {
            report.detail(format!("config_dir={}", paths.multi_home.display()));
            report.detail(format!("config_file={}", config.path().display()));
            report.detail(format!("shared_memory={}", paths.shared_dir.display()));
            report.detail(format!(
                "shared_claude_md={}",
                paths.shared_instructions.display()
            ));
            report.detail(format!("sessions_dir={}", paths.sessions_dir.display()));
            report.detail(format!("claude_dir={}", paths.claude_dir.display()));
            report.detail(format!(
                "claude_projects_dir={}",
                paths.claude_projects_dir.display()
            ));
            for (key, value) in config.document()? {
                if let Value::Array(items) = &value {
                    if items.is_empty() {
                        report.detail(format!("{key}: (none)"));
                    }
                    for item in items {
                        report.detail(format!("{key}: {}", render(item)));
                    }
                } else {
                    report.detail(format!("{key}: {}", render(&value)));
                }
            }
            for (var, value) in active_overrides() {
                report.detail(format!("env {var}={value}"));
            }
        }
    }

    Ok(report)
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MultiError;
use crate::memory::paths::MultiPaths;
use crate::memory::util::write_replace;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiSettings {
    pub auto_sync: bool,
    pub sync_on_start: bool,
    pub sync_on_end: bool,
    /// Seconds.
    pub watch_interval: u64,
    pub inject_instructions: bool,
    pub instruction_files: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for MultiSettings {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_on_start: true,
            sync_on_end: true,
            watch_interval: 30,
            inject_instructions: true,
            instruction_files: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// What the sync commands need from configuration.
pub trait ConfigProvider {
    fn shared_dir(&self) -> &Path;
    fn sessions_dir(&self) -> &Path;
    fn sync_on_start(&self) -> bool;
    fn sync_on_end(&self) -> bool;
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

/// Settings persisted as a pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
    shared_dir: PathBuf,
    sessions_dir: PathBuf,
    settings: MultiSettings,
}

impl JsonConfigStore {
    pub fn load(paths: &MultiPaths) -> Result<Self> {
        let settings = load_settings(&paths.config_file)?;
        Ok(Self {
            path: paths.config_file.clone(),
            shared_dir: paths.shared_dir.clone(),
            sessions_dir: paths.sessions_dir.clone(),
            settings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn settings(&self) -> &MultiSettings {
        &self.settings
    }

    /// All keys as a JSON object, sorted by key.
    pub fn document(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(&self.settings)? {
            Value::Object(map) => Ok(map),
            other => Err(MultiError::InvalidConfig(format!(
                "settings serialized to {other}, expected an object"
            ))
            .into()),
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(&self.settings)?;
        write_replace(&self.path, format!("{data}\n").as_bytes())?;
        Ok(self.path.clone())
    }

    /// Append `file` to `instruction_files`. Returns false if already listed.
    pub fn add_instruction_file(&mut self, file: &str) -> Result<bool> {
        if self.settings.instruction_files.iter().any(|f| f == file) {
            return Ok(false);
        }
        self.settings.instruction_files.push(file.to_string());
        self.save()?;
        Ok(true)
    }

    /// Drop `file` from `instruction_files`. Returns false if it was not listed.
    pub fn remove_instruction_file(&mut self, file: &str) -> Result<bool> {
        let before = self.settings.instruction_files.len();
        self.settings.instruction_files.retain(|f| f != file);
        if self.settings.instruction_files.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}

fn load_settings(path: &Path) -> Result<MultiSettings> {
    if !path.exists() {
        return Ok(MultiSettings::default());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|err| MultiError::InvalidConfig(format!("{}: {err}", path.display())).into())
}

impl ConfigProvider for JsonConfigStore {
    fn shared_dir(&self) -> &Path {
        &self.shared_dir
    }

    fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn sync_on_start(&self) -> bool {
        env_or_bool("CLAUDE_MULTI_SYNC_ON_START", self.settings.sync_on_start)
    }

    fn sync_on_end(&self) -> bool {
        env_or_bool("CLAUDE_MULTI_SYNC_ON_END", self.settings.sync_on_end)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.document().ok()?.remove(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut doc = self.document()?;
        doc.insert(key.to_string(), value);
        let updated: MultiSettings = serde_json::from_value(Value::Object(doc))
            .map_err(|err| MultiError::InvalidConfig(format!("{key}: {err}")))?;
        self.settings = updated;
        self.save()?;
        Ok(())
    }
}

/// Interpret a CLI string the way a user most likely meant it.
pub fn coerce_value(raw: &str) -> Value {
    let lower = raw.to_ascii_lowercase();
    if lower == "true" || lower == "false" {
        return Value::Bool(lower == "true");
    }
    if !raw.is_empty()
        && raw.chars().all(|c| c.is_ascii_digit())
        && let Ok(n) = raw.parse::<u64>()
    {
        return Value::from(n);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ConfigProvider, JsonConfigStore, coerce_value};
    use crate::memory::paths::MultiPaths;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn paths_in(root: &Path) -> MultiPaths {
        MultiPaths::rooted_at(root)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().expect("tempdir");
        let store = JsonConfigStore::load(&paths_in(tmp.path())).expect("load");
        assert!(!store.exists());
        assert_eq!(store.get("sync_on_start"), Some(Value::Bool(true)));
        assert_eq!(store.get("watch_interval"), Some(json!(30)));
        assert_eq!(store.get("instruction_files"), Some(json!([])));
        assert_eq!(store.get("unknown"), None);
    }

    #[test]
    fn set_persists_and_reloads() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        let mut store = JsonConfigStore::load(&paths).expect("load");
        store.set("sync_on_end", Value::Bool(false)).expect("set");
        store.set("editor", json!("vim")).expect("set extra");

        let reloaded = JsonConfigStore::load(&paths).expect("reload");
        assert_eq!(reloaded.get("sync_on_end"), Some(Value::Bool(false)));
        assert_eq!(reloaded.get("editor"), Some(json!("vim")));
        assert!(reloaded.settings().sync_on_start);
    }

    #[test]
    fn set_rejects_wrong_type_for_known_key() {
        let tmp = tempdir().expect("tempdir");
        let mut store = JsonConfigStore::load(&paths_in(tmp.path())).expect("load");
        assert!(store.set("sync_on_start", json!("maybe")).is_err());
        assert!(store.settings().sync_on_start);
        assert!(!store.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        fs::write(&paths.config_file, "{not json").expect("write");
        let err = JsonConfigStore::load(&paths).expect_err("corrupt");
        assert!(format!("{err:#}").contains("config file invalid"));
    }

    #[test]
    fn instruction_files_are_deduplicated() {
        let tmp = tempdir().expect("tempdir");
        let mut store = JsonConfigStore::load(&paths_in(tmp.path())).expect("load");
        assert!(store.add_instruction_file("/a/CLAUDE.md").expect("add"));
        assert!(!store.add_instruction_file("/a/CLAUDE.md").expect("add again"));
        assert!(store.remove_instruction_file("/a/CLAUDE.md").expect("remove"));
        assert!(!store.remove_instruction_file("/a/CLAUDE.md").expect("remove again"));
    }

    #[test]
    fn cli_values_are_coerced() {
        assert_eq!(coerce_value("TRUE"), Value::Bool(true));
        assert_eq!(coerce_value("false"), Value::Bool(false));
        assert_eq!(coerce_value("45"), json!(45));
        assert_eq!(coerce_value("-3"), json!("-3"));
        assert_eq!(coerce_value("vim"), json!("vim"));
    }
}

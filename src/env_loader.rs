use std::env;
use std::path::PathBuf;

include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));

fn fallback_dotenv_path(multi_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    match multi_home {
        Some(base) => Some(base.join(".env")),
        None => Some(home_dir?.join(".claude-multi").join(".env")),
    }
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("CLAUDE_MULTI_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

/// Recognized `CLAUDE_MULTI_*` variables that are currently set.
pub fn active_overrides() -> Vec<(&'static str, String)> {
    GENERATED_ENV_ALLOWLIST
        .iter()
        .filter_map(|key| match env::var(key) {
            Ok(v) if !v.trim().is_empty() => Some((*key, v)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{GENERATED_ENV_ALLOWLIST, fallback_dotenv_path};
    use std::path::PathBuf;

    #[test]
    fn fallback_uses_tool_home_when_set() {
        let got = fallback_dotenv_path(
            Some(PathBuf::from("/workspace/cm")),
            Some(PathBuf::from("/home/alice")),
        );
        assert_eq!(got, Some(PathBuf::from("/workspace/cm/.env")));
    }

    #[test]
    fn fallback_uses_home_when_tool_home_unset() {
        let got = fallback_dotenv_path(None, Some(PathBuf::from("/home/alice")));
        assert_eq!(got, Some(PathBuf::from("/home/alice/.claude-multi/.env")));
    }

    #[test]
    fn allowlist_knows_layout_overrides() {
        assert!(GENERATED_ENV_ALLOWLIST.contains(&"CLAUDE_MULTI_HOME"));
        assert!(GENERATED_ENV_ALLOWLIST.contains(&"CLAUDE_MULTI_SYNC_ON_END"));
        assert!(!GENERATED_ENV_ALLOWLIST.contains(&"CLAUDE_MULTI_WARN"));
    }
}

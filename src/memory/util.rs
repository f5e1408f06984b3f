use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Replace `path` with `data` through a sibling temp file, so readers see
/// either the old or the new content.
pub fn write_replace(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data)
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    if let Ok(meta) = fs::metadata(path) {
        let _ = fs::set_permissions(tmp.path(), meta.permissions());
    }
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_replace;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn replaces_existing_file_without_leftovers() {
        let tmp = tempdir().expect("tempdir");
        let target = tmp.path().join("notes.md");
        fs::write(&target, "old").expect("write");

        write_replace(&target, b"new").expect("replace");

        assert_eq!(fs::read_to_string(&target).expect("read"), "new");
        let count = fs::read_dir(tmp.path()).expect("read dir").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn fails_when_parent_is_missing() {
        let tmp = tempdir().expect("tempdir");
        assert!(write_replace(&tmp.path().join("nope/notes.md"), b"x").is_err());
    }
}

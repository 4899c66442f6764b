//! In-place file edits performed by release step actions.
//!
//! Each helper reports whether it changed anything so callers can treat an
//! unchanged file as an already-completed edit.

use crate::error::{Result, WorkflowError};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.]+)?").expect("version regex is valid")
});

/// Replace the first version string found in `path` with `new_version`.
pub fn set_version_in_file(path: &Path, new_version: &str) -> Result<bool> {
    let content = std::fs::read_to_string(path).map_err(|e| WorkflowError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to read file: {}", e),
    })?;

    let current = VERSION_RE
        .find(&content)
        .ok_or_else(|| WorkflowError::FileUpdateFailed {
            path: path.to_path_buf(),
            reason: "no version string found".to_string(),
        })?;

    if current.as_str() == new_version {
        return Ok(false);
    }

    let updated = format!(
        "{}{}{}",
        &content[..current.start()],
        new_version,
        &content[current.end()..]
    );
    std::fs::write(path, updated).map_err(|e| WorkflowError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to write file: {}", e),
    })?;
    log::debug!("{}: {} -> {}", path.display(), current.as_str(), new_version);
    Ok(true)
}

/// Flip the code freeze workflow from passing (`exit 0`) to failing (`exit 1`).
pub fn enable_code_freeze(path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path).map_err(|e| WorkflowError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to read file: {}", e),
    })?;

    if content.contains("exit 0") {
        std::fs::write(path, content.replace("exit 0", "exit 1")).map_err(|e| {
            WorkflowError::FileUpdateFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write file: {}", e),
            }
        })?;
        return Ok(true);
    }
    if content.contains("exit 1") {
        return Ok(false);
    }
    Err(WorkflowError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: "expected an 'exit 0' or 'exit 1' line".to_string(),
    }
    .into())
}

/// Create the release notes file if it does not exist yet.
pub fn write_release_notes_stub(path: &Path, release: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("# Release of {}\n\n## Summary\n", release))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_version_replaces_first_match_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.go");
        std::fs::write(
            &path,
            "package servenv\n\nconst versionName = \"20.0.0-SNAPSHOT\"\n// keep 1.2.3\n",
        )
        .unwrap();

        assert!(set_version_in_file(&path, "20.0.0-rc1").unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"20.0.0-rc1\""));
        assert!(content.contains("keep 1.2.3"));

        assert!(!set_version_in_file(&path, "20.0.0-rc1").unwrap());
    }

    #[test]
    fn test_set_version_without_version_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VERSION");
        std::fs::write(&path, "unknown\n").unwrap();
        assert!(set_version_in_file(&path, "1.0.0").is_err());
    }

    #[test]
    fn test_code_freeze_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code_freeze.yml");
        std::fs::write(&path, "steps:\n  - run: exit 0\n").unwrap();

        assert!(enable_code_freeze(&path).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("exit 1"));
        assert!(!enable_code_freeze(&path).unwrap());
    }

    #[test]
    fn test_release_notes_stub_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changelog/20.0/20.0.0/release_notes.md");
        assert!(write_release_notes_stub(&path, "v20.0.0").unwrap());
        assert!(!write_release_notes_stub(&path, "v20.0.0").unwrap());
    }
}

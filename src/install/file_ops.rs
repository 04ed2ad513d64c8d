//! Atomic file writes.
//!
//! Patched sources and staged unit files are written to a sibling temp file,
//! synced, then renamed over the target so a crash never leaves a
//! half-written file behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Write file atomically to prevent corruption
pub fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;

        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write temp file {}", temp_path.display()))?;

        file.sync_all()
            .with_context(|| format!("Failed to sync temp file {}", temp_path.display()))?;
    }

    if let Ok(metadata) = fs::metadata(path) {
        // Keep the original mode on rewrite.
        fs::set_permissions(&temp_path, metadata.permissions())
            .with_context(|| format!("Failed to copy permissions to {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_content_without_leftovers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("server.js");
        fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!tmp.path().join("server.tmp").exists());
    }

    #[test]
    fn missing_parent_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(write_file_atomic(&tmp.path().join("nope/server.js"), "x").is_err());
    }
}

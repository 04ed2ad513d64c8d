//! Zip extraction and source-root discovery

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Directory names never taken as the extracted source root.
const IGNORED_DIRS: &[&str] = &["__pycache__", "__MACOSX"];

/// Extract every entry of the zip at `archive_path` under `dest`.
///
/// Entries whose names would escape `dest` (absolute paths, `..`) are
/// rejected. Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let zip_file = fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(zip_file).context("Failed to read ZIP archive")?;

    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    let mut files = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read ZIP entry at index {i}"))?;

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| anyhow!("Unsafe path in archive: {}", entry.name()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut outfile = fs::File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract {}", entry.name()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode().filter(|m| m & 0o777 != 0) {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777))
                    .with_context(|| format!("Failed to set permissions on {}", out_path.display()))?;
            }
        }

        files += 1;
    }

    Ok(files)
}

/// The top-level directory a branch archive unpacks into (e.g. `repo-main/`).
///
/// When several directories exist the lexicographically first one wins.
pub fn find_source_root(extract_dir: &Path) -> Result<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(extract_dir)
        .with_context(|| format!("Failed to read {}", extract_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| {
            !IGNORED_DIRS
                .iter()
                .any(|ignored| entry.file_name() == std::ffi::OsStr::new(ignored))
        })
        .map(|entry| entry.path())
        .collect();

    dirs.sort();
    dirs.into_iter()
        .next()
        .ok_or_else(|| anyhow!("No extracted directory found in {}", extract_dir.display()))
}

//! Copying the extracted application tree into the install directory
//!
//! On the privileged platform the install location is system-owned, so the
//! copy runs through elevated `mkdir`/`cp`/`chown` and ownership is handed
//! back to the invoking user (npm later writes into the tree as that user).
//! Elsewhere the tree is copied directly.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::privilege::Elevated;
use super::runner::CommandRunner;
use crate::config::InstallConfig;

/// Copy the contents of `source` into `config.install_dir`.
pub fn install_tree(config: &InstallConfig, runner: &dyn CommandRunner, source: &Path) -> Result<()> {
    let target = &config.install_dir;

    if config.platform.is_privileged() {
        let elevated = Elevated::new(runner, config.elevate);
        elevated.create_dir_all(target)?;
        elevated.copy_contents(source, target)?;
        elevated.chown_recursive(target, &config.owner)?;
    } else {
        let copied = copy_dir_recursive(source, target)?;
        log::debug!("Copied {copied} files into {}", target.display());
    }

    Ok(())
}

/// Recursively copy `src` into `dst`, merging with existing contents.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).with_context(|| format!("Failed to create {}", dst.display()))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} is outside {}", entry.path().display(), src.display()))?;
        let dest_path = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .with_context(|| format!("Failed to create {}", dest_path.display()))?;
        } else {
            fs::copy(entry.path(), &dest_path).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    dest_path.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

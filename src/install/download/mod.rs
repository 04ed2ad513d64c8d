//! Source acquisition: branch archive download, extraction and install
//!
//! ## Module Organization
//!
//! - `github` - Archive URL construction
//! - `core` - HTTP download
//! - `extract` - Zip extraction and source-root discovery

mod core;
mod extract;
mod github;

pub use self::core::download_archive;
pub use extract::{extract_zip, find_source_root};
pub use github::SourceLocation;

use anyhow::Context;

use super::runner::CommandRunner;
use super::{InstallError, staging};
use crate::config::InstallConfig;

const ARCHIVE_FILE: &str = "svarog.zip";

/// Download the branch archive, unpack it and copy it into the install directory.
///
/// All intermediate files live in a temp directory that is removed on every
/// exit path.
pub fn acquire_source(config: &InstallConfig, runner: &dyn CommandRunner) -> Result<(), InstallError> {
    let temp_dir = tempfile::Builder::new()
        .prefix("svarog_install")
        .tempdir()
        .context("Failed to create temporary directory")?;

    let url = config.source.archive_url();
    let archive_path = temp_dir.path().join(ARCHIVE_FILE);
    log::info!("Downloading {url}");
    let bytes = download_archive(&url, &archive_path, &config.timings)?;
    log::info!("Archive downloaded ({bytes} bytes)");

    let extract_dir = temp_dir.path().join("extracted");
    let files = extract_zip(&archive_path, &extract_dir)?;
    log::debug!("Extracted {files} files into {}", extract_dir.display());

    let source_root = find_source_root(&extract_dir)?;
    staging::install_tree(config, runner, &source_root)?;
    log::info!("Sources copied to {}", config.install_dir.display());

    if let Err(e) = temp_dir.close() {
        log::warn!("Failed to remove temporary files: {e}");
    }

    Ok(())
}

//! Steps that operate on the fetched application: npm dependencies,
//! database initialization and the port patch in the entry point.

use anyhow::Context;
use std::fs;
use std::path::Path;

use super::file_ops::write_file_atomic;
use super::runner::CommandRunner;
use super::InstallError;
use crate::config::InstallConfig;

/// `npm install` inside the install directory.
pub fn install_dependencies(
    config: &InstallConfig,
    runner: &dyn CommandRunner,
) -> Result<(), InstallError> {
    log::info!("Installing npm dependencies...");
    runner
        .run_checked_in(&config.install_dir, &config.runtime.package_manager, &["install"])
        .context("Dependency installation failed")?;
    log::info!("Dependencies installed");
    Ok(())
}

/// `npm run init-db` inside the install directory.
pub fn initialize_database(
    config: &InstallConfig,
    runner: &dyn CommandRunner,
) -> Result<(), InstallError> {
    log::info!("Initializing database...");
    runner
        .run_checked_in(
            &config.install_dir,
            &config.runtime.package_manager,
            &["run", "init-db"],
        )
        .context("Database initialization failed")?;
    log::info!("Database initialized");
    Ok(())
}

/// The entry point's port assignment for `port`.
pub fn port_assignment(port: u16) -> String {
    format!("const PORT = process.env.PORT || {port};")
}

/// Rewrite the default port assignment in the entry point to use `port`.
pub fn configure_port(config: &InstallConfig, port: u16) -> Result<(), InstallError> {
    log::info!("Configuring port {port}");
    let path = config.entry_point_path();
    patch_port(&path, config.default_port, port)?;
    log::info!("Port {port} configured in {}", config.entry_point);
    Ok(())
}

/// Replace every `const PORT = process.env.PORT || <default_port>;` in `path`.
///
/// Fails with [`InstallError::PatternNotFound`] and leaves the file untouched
/// when the assignment is absent, e.g. after a rename upstream or a previous
/// patch.
pub fn patch_port(path: &Path, default_port: u16, port: u16) -> Result<(), InstallError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let pattern = port_assignment(default_port);
    if !content.contains(&pattern) {
        return Err(InstallError::PatternNotFound {
            path: path.to_path_buf(),
            pattern,
        });
    }

    let patched = content.replace(&pattern, &port_assignment(port));
    write_file_atomic(path, &patched)?;
    Ok(())
}

//! Runtime dependency checks and installation
//!
//! Verifies Node.js (minimum major version) and npm, installing both from
//! the system package manager when Node.js is missing.

use anyhow::{Context, anyhow};

use super::platform::Platform;
use super::privilege::Elevated;
use super::runner::{CommandRunner, stdout_trimmed};
use super::InstallError;
use crate::config::InstallConfig;

/// System package managers, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    AptGet,
    Yum,
    Dnf,
}

impl PackageManager {
    pub const PREFERENCE: [PackageManager; 3] =
        [PackageManager::AptGet, PackageManager::Yum, PackageManager::Dnf];

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::AptGet => "apt-get",
            PackageManager::Yum => "yum",
            PackageManager::Dnf => "dnf",
        }
    }

    /// Commands (without `sudo`) that install Node.js and npm.
    pub fn install_commands(&self) -> Vec<Vec<&'static str>> {
        let install = vec![self.program(), "install", "-y", "nodejs", "npm"];
        match self {
            PackageManager::AptGet => vec![vec!["apt-get", "update"], install],
            PackageManager::Yum | PackageManager::Dnf => vec![install],
        }
    }

    /// First supported package manager found on `PATH`.
    pub fn detect(runner: &dyn CommandRunner) -> Option<Self> {
        Self::PREFERENCE
            .into_iter()
            .find(|pm| runner.which(pm.program()).is_some())
    }
}

/// Major version from output like `v18.19.0`.
pub fn parse_major_version(version: &str) -> Option<u32> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    version.split('.').next()?.trim().parse().ok()
}

/// Ensure the runtime and its package manager are present and recent enough.
pub fn ensure_runtime(config: &InstallConfig, runner: &dyn CommandRunner) -> Result<(), InstallError> {
    log::info!("Checking dependencies...");
    let runtime = &config.runtime;

    match query_version(runner, &runtime.program) {
        Some(version) => {
            log::info!("Node.js found: {version}");
            check_minimum(&version, runtime.min_major)?;
        }
        None => {
            log::info!("Node.js not found, installing...");
            install_runtime(config, runner)?;
            if let Some(version) = query_version(runner, &runtime.program) {
                log::info!("Node.js installed: {version}");
                check_minimum(&version, runtime.min_major)?;
            }
        }
    }

    match query_version(runner, &runtime.package_manager) {
        Some(version) => {
            log::info!("npm found: {version}");
            Ok(())
        }
        None => Err(anyhow!("npm not found").into()),
    }
}

fn query_version(runner: &dyn CommandRunner, program: &str) -> Option<String> {
    match runner.run_checked(program, &["--version"]) {
        Ok(output) => Some(stdout_trimmed(&output)),
        Err(e) => {
            log::debug!("{program} --version failed: {e:#}");
            None
        }
    }
}

fn check_minimum(version: &str, min_major: u32) -> Result<(), InstallError> {
    let major = parse_major_version(version)
        .ok_or_else(|| anyhow!("Unrecognized Node.js version string: {version}"))?;
    if major < min_major {
        return Err(anyhow!(
            "Node.js {min_major}.0 or newer is required (found {version})"
        )
        .into());
    }
    Ok(())
}

fn install_runtime(config: &InstallConfig, runner: &dyn CommandRunner) -> Result<(), InstallError> {
    match config.platform {
        Platform::Windows => Err(anyhow!(
            "Automatic Node.js installation is not available on Windows; \
             please install Node.js manually from https://nodejs.org/"
        )
        .into()),
        Platform::Linux => {
            let pm = PackageManager::detect(runner).ok_or(InstallError::NoPackageManager)?;
            log::info!("Installing Node.js via {}...", pm.program());

            let elevated = Elevated::new(runner, config.elevate);
            for command in pm.install_commands() {
                let (program, args) = command
                    .split_first()
                    .ok_or_else(|| anyhow!("empty install command"))?;
                elevated
                    .run_checked(program, args)
                    .with_context(|| format!("Node.js installation via {} failed", pm.program()))?;
            }
            Ok(())
        }
    }
}

//! Unattended Svarog installation
//!
//! [`run_install`] drives the ordered [`Step`]s of [`pipeline`] against an
//! [`InstallConfig`]. External programs are reached through a
//! [`CommandRunner`] so the whole flow can run against a recording fake.
//!
//! # Module Structure
//!
//! - `pipeline` - Step ordering, outcomes and short-circuiting
//! - `dependencies` - Node.js/npm detection and package-manager installs
//! - `download` - Archive download, extraction and source staging
//! - `application` - npm install, database init and port patching
//! - `linux` - systemd unit, service control and journal access
//! - `windows` - Detached server start-up
//! - `network` - Free port search and connectivity probes
//! - `privilege` - `sudo` wrapping for system paths

pub mod application;
pub mod dependencies;
pub mod download;
mod error;
mod file_ops;
mod linux;
pub mod network;
pub mod pipeline;
pub mod platform;
pub mod privilege;
pub mod readiness;
mod report;
pub mod runner;
pub mod signals;
mod staging;
#[cfg(test)]
pub(crate) mod test_support;
mod windows;

pub use error::InstallError;
pub use pipeline::{InstallOutcome, Pipeline, Step, StepOutcome};
pub use platform::Platform;
pub use report::InstallReport;
pub use runner::{CommandRunner, SystemCommandRunner};

use crate::config::InstallConfig;

/// Run every installation step in order.
///
/// Step failures are reported as [`InstallOutcome::Failed`]; fatal errors
/// (unsupported platform, no free port, no package manager, interruption)
/// are returned as `Err`.
pub fn run_install(
    config: &InstallConfig,
    runner: &dyn CommandRunner,
) -> Result<InstallOutcome, InstallError> {
    log::info!("=== Svarog Server Management System installer ===");
    log::info!(
        "Installing {} into {}",
        config.source.project_url(),
        config.install_dir.display()
    );

    let outcome = Pipeline::new(config, runner).run()?;
    if let InstallOutcome::Failed { step, reason } = &outcome {
        log::error!("Installation failed at {step}: {reason}");
    }
    Ok(outcome)
}

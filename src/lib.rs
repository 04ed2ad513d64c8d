//! Svarog installation library
//!
//! Provisions the Svarog Server Management System on a fresh host: runtime
//! dependencies, application sources, database, systemd service and a final
//! reachability check. The `svarog-install` binary is a thin wrapper around
//! [`install::run_install`].

pub mod cli;
pub mod config;
pub mod install;
pub mod logging;

pub use config::InstallConfig;
pub use install::{InstallError, InstallOutcome, InstallReport, run_install};

//! Installer error type

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by installation steps.
///
/// Fatal variants abort the pipeline immediately; everything else is a step
/// failure that the orchestrator logs before halting.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    #[error("No free port found in range {start}-{end}")]
    NoFreePort { start: u16, end: u16 },

    #[error("Unsupported package manager: none of apt-get, yum, dnf found")]
    NoPackageManager,

    #[error("Installation interrupted by user")]
    Interrupted,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Default port assignment `{pattern}` not found in {}", path.display())]
    PatternNotFound { path: PathBuf, pattern: String },

    #[error(transparent)]
    Step(#[from] anyhow::Error),
}

impl InstallError {
    /// Whether this error terminates the installer without a step-level report.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform(_)
                | Self::NoFreePort { .. }
                | Self::NoPackageManager
                | Self::Interrupted
                | Self::Config(_)
        )
    }
}

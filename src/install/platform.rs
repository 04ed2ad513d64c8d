//! Host platform detection

use std::fmt;
use std::path::PathBuf;

use super::InstallError;

/// Operating systems the installer can provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// systemd host; system-wide paths need elevated commands.
    Linux,
    /// No service manager integration; the server runs as a detached process.
    Windows,
}

impl Platform {
    /// Detect the platform this binary is running on.
    pub fn detect() -> Result<Self, InstallError> {
        Self::from_os_tag(std::env::consts::OS)
    }

    /// Map an OS tag (as in `std::env::consts::OS`) to a supported platform.
    pub fn from_os_tag(tag: &str) -> Result<Self, InstallError> {
        match tag.to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            other => Err(InstallError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Default install location.
    pub fn default_install_dir(&self) -> PathBuf {
        match self {
            Platform::Linux => PathBuf::from("/opt/svarog"),
            Platform::Windows => PathBuf::from(r"C:\Program Files\Svarog"),
        }
    }

    /// Whether service registration and system paths go through the privileged path.
    #[inline]
    pub fn is_privileged(&self) -> bool {
        matches!(self, Platform::Linux)
    }

    /// Name of the npm launcher on this platform.
    pub fn npm_program(&self) -> &'static str {
        match self {
            Platform::Linux => "npm",
            Platform::Windows => "npm.cmd",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::Windows => f.write_str("windows"),
        }
    }
}

/// Human-readable description of the running host, for the log.
pub fn host_description() -> String {
    format!(
        "{} {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH,
        std::env::consts::FAMILY
    )
}

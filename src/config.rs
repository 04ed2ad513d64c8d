//! Installer configuration
//!
//! [`InstallConfig`] is built once before the pipeline starts and never
//! changes afterwards. Values come from built-in defaults, then an optional
//! TOML file, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Args;
use crate::install::download::SourceLocation;
use crate::install::network::PortRange;
use crate::install::platform::Platform;
use crate::install::privilege;
use crate::install::readiness::Backoff;
use crate::install::InstallError;

pub const DEFAULT_SERVICE_NAME: &str = "svarog-server";
pub const DEFAULT_REPO: &str = "orca-raven/svarog-server-management";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_ARCHIVE_BASE_URL: &str = "https://github.com";

/// Runtime the application needs, checked before anything is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRequirement {
    /// Runtime binary queried with `--version`.
    pub program: String,
    /// Package manager used for the application's own dependencies.
    pub package_manager: String,
    /// Lowest accepted major version of the runtime.
    pub min_major: u32,
}

impl RuntimeRequirement {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            program: "node".to_string(),
            package_manager: platform.npm_program().to_string(),
            min_major: 14,
        }
    }
}

/// Waits and timeouts used by network and readiness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long to wait for the service manager to report the unit active.
    pub service_ready: Backoff,
    /// How long to wait for the server to accept TCP connections.
    pub connectivity: Backoff,
    /// Per-attempt TCP connect timeout.
    pub connect_timeout: Duration,
    pub download_connect_timeout: Duration,
    pub download_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            service_ready: Backoff::default(),
            connectivity: Backoff::default(),
            connect_timeout: Duration::from_secs(5),
            download_connect_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(300),
        }
    }
}

/// Immutable installer configuration.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub platform: Platform,
    pub install_dir: PathBuf,
    pub service_name: String,
    pub source: SourceLocation,
    pub port_range: PortRange,
    pub runtime: RuntimeRequirement,
    /// Application entry point, relative to `install_dir`.
    pub entry_point: String,
    /// Port hardcoded in the entry point before patching.
    pub default_port: u16,
    /// Directory systemd units are installed into.
    pub unit_dir: PathBuf,
    /// Number of journal lines shown when the service fails to start.
    pub journal_lines: usize,
    /// Prefix privileged commands with `sudo`.
    pub elevate: bool,
    /// User that owns the installed tree.
    pub owner: String,
    pub timings: Timings,
}

impl InstallConfig {
    /// Defaults for the host this binary runs on.
    pub fn detect() -> Result<Self, InstallError> {
        Ok(Self::defaults(Platform::detect()?))
    }

    /// Defaults for an OS tag such as `"linux"`; unsupported tags are fatal.
    pub fn for_os(tag: &str) -> Result<Self, InstallError> {
        Ok(Self::defaults(Platform::from_os_tag(tag)?))
    }

    pub fn defaults(platform: Platform) -> Self {
        Self {
            platform,
            install_dir: platform.default_install_dir(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            source: SourceLocation {
                base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
                repo: DEFAULT_REPO.to_string(),
                branch: DEFAULT_BRANCH.to_string(),
            },
            port_range: PortRange::DEFAULT,
            runtime: RuntimeRequirement::for_platform(platform),
            entry_point: "server.js".to_string(),
            default_port: 3000,
            unit_dir: PathBuf::from("/etc/systemd/system"),
            journal_lines: 20,
            elevate: platform.is_privileged() && !privilege::is_root(),
            owner: privilege::current_user(),
            timings: Timings::default(),
        }
    }

    /// Path of the entry point inside the install directory.
    pub fn entry_point_path(&self) -> PathBuf {
        self.install_dir.join(&self.entry_point)
    }

    /// Path the systemd unit is installed at.
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(format!("{}.service", self.service_name))
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), InstallError> {
        if let Some(dir) = file.install_dir {
            self.install_dir = dir;
        }
        if let Some(name) = file.service_name {
            self.service_name = name;
        }
        if let Some(repo) = file.repo {
            self.source.repo = repo;
        }
        if let Some(branch) = file.branch {
            self.source.branch = branch;
        }
        if let Some(url) = file.archive_base_url {
            self.source.base_url = url;
        }
        if let Some(major) = file.node_min_major {
            self.runtime.min_major = major;
        }
        if let Some(secs) = file.readiness_timeout_secs {
            self.timings.service_ready.deadline = Duration::from_secs(secs);
            self.timings.connectivity.deadline = Duration::from_secs(secs);
        }
        self.port_range = PortRange::new(
            file.port_start.unwrap_or(self.port_range.start),
            file.port_end.unwrap_or(self.port_range.end),
        )?;
        Ok(())
    }

    fn apply_args(&mut self, args: &Args) -> Result<(), InstallError> {
        if let Some(dir) = &args.install_dir {
            self.install_dir = dir.clone();
        }
        if let Some(name) = &args.service_name {
            self.service_name = name.clone();
        }
        if let Some(repo) = &args.repo {
            self.source.repo = repo.clone();
        }
        if let Some(branch) = &args.branch {
            self.source.branch = branch.clone();
        }
        self.port_range = PortRange::new(
            args.port_start.unwrap_or(self.port_range.start),
            args.port_end.unwrap_or(self.port_range.end),
        )?;
        Ok(())
    }

    fn validate(&self) -> Result<(), InstallError> {
        if self.service_name.is_empty()
            || !self
                .service_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
        {
            return Err(InstallError::Config(format!(
                "invalid service name `{}`",
                self.service_name
            )));
        }
        if self.source.repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(InstallError::Config(format!(
                "repository must be `owner/name`, got `{}`",
                self.source.repo
            )));
        }
        if !self.install_dir.is_absolute() {
            return Err(InstallError::Config(format!(
                "install directory must be an absolute path, got `{}`",
                self.install_dir.display()
            )));
        }
        Ok(())
    }
}

/// Optional overrides read from a TOML file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub install_dir: Option<PathBuf>,
    pub service_name: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub archive_base_url: Option<String>,
    pub port_start: Option<u16>,
    pub port_end: Option<u16>,
    pub node_min_major: Option<u32>,
    pub readiness_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, InstallError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            InstallError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&text).map_err(|e| {
            InstallError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

/// Default location of the optional config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("svarog-install").join("config.toml"))
}

/// Build the configuration for this run.
///
/// Platform detection happens first so an unsupported host is rejected before
/// any file is read.
pub fn resolve(args: &Args) -> Result<InstallConfig, InstallError> {
    let mut config = InstallConfig::detect()?;

    let file_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => default_config_path().filter(|p| p.exists()),
    };
    if let Some(path) = file_path {
        log::info!("Loading configuration from {}", path.display());
        config.apply_file(FileConfig::load(&path)?)?;
    }

    config.apply_args(args)?;
    config.validate()?;
    Ok(config)
}

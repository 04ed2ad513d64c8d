use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for svarog-install
///
/// Every flag is optional; without any the installer uses the built-in
/// defaults (optionally overridden by a TOML config file).
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "svarog-install")]
#[command(version, about = "Install the Svarog Server Management System as a service")]
pub struct Args {
    /// Path to a TOML config file (defaults to <config dir>/svarog-install/config.toml if present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Directory the application is installed into
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Name of the registered service
    #[arg(long)]
    pub service_name: Option<String>,

    /// GitHub repository (`owner/name`) the sources are fetched from
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch whose archive is downloaded
    #[arg(long)]
    pub branch: Option<String>,

    /// First port tried when searching for a free port
    #[arg(long)]
    pub port_start: Option<u16>,

    /// Last port tried when searching for a free port
    #[arg(long)]
    pub port_end: Option<u16>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

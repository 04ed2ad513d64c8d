//! Completion summary printed after a successful run.

use std::path::PathBuf;

use super::platform::Platform;
use crate::config::InstallConfig;
use crate::success;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub url: String,
    pub install_dir: PathBuf,
    pub service_name: String,
    pub platform: Platform,
    pub port: u16,
}

impl InstallReport {
    pub fn new(config: &InstallConfig, port: u16, host: &str) -> Self {
        Self {
            url: format!("http://{host}:{port}"),
            install_dir: config.install_dir.clone(),
            service_name: config.service_name.clone(),
            platform: config.platform,
            port,
        }
    }

    /// Service management commands shown to the operator (Linux only).
    pub fn management_hints(&self) -> Vec<String> {
        if self.platform != Platform::Linux {
            return Vec::new();
        }
        let name = &self.service_name;
        vec![
            format!("Start:   sudo systemctl start {name}"),
            format!("Stop:    sudo systemctl stop {name}"),
            format!("Restart: sudo systemctl restart {name}"),
            format!("Status:  sudo systemctl status {name}"),
            format!("Logs:    sudo journalctl -u {name} -f"),
        ]
    }

    pub fn log_summary(&self) {
        success!("=== INSTALLATION COMPLETED SUCCESSFULLY ===");
        success!("Svarog Server Management System is available at: {}", self.url);
        success!("Installation path: {}", self.install_dir.display());

        let hints = self.management_hints();
        if !hints.is_empty() {
            success!("Service management commands:");
            for hint in hints {
                success!("  {hint}");
            }
        }

        success!("Installation finished, the server is up and running");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_host_and_port() {
        let config = InstallConfig::for_os("linux").unwrap();
        let report = InstallReport::new(&config, 4321, "192.168.1.20");
        assert_eq!(report.url, "http://192.168.1.20:4321");
        assert_eq!(report.service_name, "svarog-server");
    }

    #[test]
    fn hints_only_on_linux() {
        let linux = InstallReport::new(&InstallConfig::for_os("linux").unwrap(), 3000, "localhost");
        let hints = linux.management_hints();
        assert_eq!(hints.len(), 5);
        assert!(hints[4].ends_with("journalctl -u svarog-server -f"));

        let windows =
            InstallReport::new(&InstallConfig::for_os("windows").unwrap(), 3000, "localhost");
        assert!(windows.management_hints().is_empty());
    }
}

//! Systemd service control operations.

use anyhow::{Context, Result};

use crate::install::privilege::Elevated;
use crate::install::runner::stdout_trimmed;

/// Reload systemd daemon to pick up changes
pub(super) fn reload_systemd_daemon(elevated: &Elevated) -> Result<()> {
    elevated
        .run_checked("systemctl", &["daemon-reload"])
        .context("Failed to reload systemd daemon")?;
    Ok(())
}

/// Enable the systemd service for boot-time start
pub(super) fn enable_systemd_service(elevated: &Elevated, service_name: &str) -> Result<()> {
    elevated
        .run_checked("systemctl", &["enable", service_name])
        .with_context(|| format!("Failed to enable systemd service {service_name}"))?;
    Ok(())
}

/// Start the systemd service
pub(super) fn start_systemd_service(elevated: &Elevated, service_name: &str) -> Result<()> {
    elevated
        .run_checked("systemctl", &["start", service_name])
        .with_context(|| format!("Failed to start systemd service {service_name}"))?;
    Ok(())
}

/// State reported by `systemctl is-active`.
///
/// `is-active` exits non-zero for every state but `active`, so the exit
/// status is ignored and the printed state is returned.
pub(super) fn active_state(elevated: &Elevated, service_name: &str) -> Result<String> {
    let output = elevated
        .run("systemctl", &["is-active", service_name])
        .context("Failed to execute systemctl is-active")?;
    Ok(stdout_trimmed(&output))
}

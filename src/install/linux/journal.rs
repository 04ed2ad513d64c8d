//! Systemd journal access for start-up diagnostics.

use anyhow::{Context, Result};

use crate::install::privilege::Elevated;

/// Last `lines` journal entries of the unit.
pub(super) fn recent_logs(elevated: &Elevated, service_name: &str, lines: usize) -> Result<String> {
    let count = lines.to_string();
    let output = elevated
        .run("journalctl", &["-u", service_name, "-n", &count, "--no-pager"])
        .context("Failed to execute journalctl")?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Log the tail of the unit's journal; errors are only logged.
pub(super) fn show_recent_logs(elevated: &Elevated, service_name: &str, lines: usize) {
    match recent_logs(elevated, service_name, lines) {
        Ok(text) if !text.trim().is_empty() => {
            log::info!("Recent service logs:");
            for line in text.lines() {
                log::info!("  {line}");
            }
        }
        Ok(_) => log::info!("No journal entries for {service_name}"),
        Err(e) => log::warn!("Could not read service logs: {e:#}"),
    }
}

//! Linux service registration and start-up using systemd.
//!
//! # Module Structure
//!
//! - `unit` - Unit file generation and staged installation
//! - `service_control` - `systemctl` operations (reload, enable, start, is-active)
//! - `journal` - Journal tail shown when start-up fails

use std::path::PathBuf;

use anyhow::anyhow;

use super::privilege::Elevated;
use super::readiness::poll_until;
use super::runner::CommandRunner;
use super::InstallError;
use crate::config::InstallConfig;

mod journal;
mod service_control;
mod unit;

use unit::{UnitSpec, render_unit};

const SERVICE_DESCRIPTION: &str = "Svarog Server Management System";

/// Write the unit, reload systemd and enable the service.
pub fn register_service(
    config: &InstallConfig,
    runner: &dyn CommandRunner,
    port: u16,
) -> Result<(), InstallError> {
    log::info!("Creating systemd service...");

    let node_path = runner
        .which(&config.runtime.program)
        .unwrap_or_else(|| PathBuf::from(unit::DEFAULT_NODE_PATH));
    let documentation = config.source.project_url();
    let spec = UnitSpec {
        service_name: &config.service_name,
        description: SERVICE_DESCRIPTION,
        documentation: &documentation,
        working_dir: &config.install_dir,
        node_path: &node_path,
        entry_point: &config.entry_point,
        port,
    };
    let content = render_unit(&spec);

    let elevated = Elevated::new(runner, config.elevate);
    unit::install_unit_file(&elevated, &config.unit_path(), &content)?;
    service_control::reload_systemd_daemon(&elevated)?;
    service_control::enable_systemd_service(&elevated, &config.service_name)?;

    log::info!("Service {} created and enabled", config.service_name);
    Ok(())
}

/// Start the service and wait until systemd reports it `active`.
///
/// On timeout the journal tail is logged before failing.
pub fn start_service(config: &InstallConfig, runner: &dyn CommandRunner) -> Result<(), InstallError> {
    log::info!("Starting service...");
    let elevated = Elevated::new(runner, config.elevate);
    service_control::start_systemd_service(&elevated, &config.service_name)?;

    let mut last_state = String::new();
    let active = poll_until(&config.timings.service_ready, || {
        match service_control::active_state(&elevated, &config.service_name) {
            Ok(state) if state == "active" => Some(()),
            Ok(state) => {
                log::debug!("Service state: {state}");
                last_state = state;
                None
            }
            Err(e) => {
                log::debug!("{e:#}");
                None
            }
        }
    });

    if active.is_some() {
        log::info!("Service started");
        return Ok(());
    }

    log::error!("Service failed to start");
    journal::show_recent_logs(&elevated, &config.service_name, config.journal_lines);
    let state = if last_state.is_empty() {
        "unknown".to_string()
    } else {
        last_state
    };
    Err(anyhow!(
        "Service {} did not become active (last state: {state})",
        config.service_name
    )
    .into())
}

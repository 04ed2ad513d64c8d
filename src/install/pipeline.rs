//! Ordered installation steps and the fold that runs them.
//!
//! Each step yields a [`StepOutcome`]. The first `Failed` outcome stops the
//! run; fatal errors bypass the outcome entirely and propagate as `Err`.

use std::fmt;

use anyhow::anyhow;

use super::network::{self, wait_until_reachable};
use super::platform::{Platform, host_description};
use super::report::InstallReport;
use super::runner::CommandRunner;
use super::{InstallError, application, dependencies, download, linux, signals, windows};
use crate::config::InstallConfig;

/// One stage of the installation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    PlatformCheck,
    FreePort,
    RuntimeDependencies,
    SourceDownload,
    AppDependencies,
    DatabaseInit,
    PortConfig,
    ServiceUnit,
    ServiceStart,
    Connectivity,
}

impl Step {
    pub const ALL: [Step; 10] = [
        Step::PlatformCheck,
        Step::FreePort,
        Step::RuntimeDependencies,
        Step::SourceDownload,
        Step::AppDependencies,
        Step::DatabaseInit,
        Step::PortConfig,
        Step::ServiceUnit,
        Step::ServiceStart,
        Step::Connectivity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::PlatformCheck => "platform check",
            Step::FreePort => "free port selection",
            Step::RuntimeDependencies => "runtime dependencies",
            Step::SourceDownload => "source download",
            Step::AppDependencies => "application dependencies",
            Step::DatabaseInit => "database initialization",
            Step::PortConfig => "port configuration",
            Step::ServiceUnit => "service registration",
            Step::ServiceStart => "service start",
            Step::Connectivity => "connectivity check",
        }
    }

    fn execute(
        self,
        config: &InstallConfig,
        runner: &dyn CommandRunner,
        state: &mut InstallState,
    ) -> Result<(), InstallError> {
        match self {
            Step::PlatformCheck => {
                log::info!("Detected operating system: {}", host_description());
                log::debug!("Installing for {} into {}", config.platform, config.install_dir.display());
                Ok(())
            }
            Step::FreePort => {
                let port = network::find_free_port(config.port_range)?;
                state.set_port(port)
            }
            Step::RuntimeDependencies => dependencies::ensure_runtime(config, runner),
            Step::SourceDownload => download::acquire_source(config, runner),
            Step::AppDependencies => application::install_dependencies(config, runner),
            Step::DatabaseInit => application::initialize_database(config, runner),
            Step::PortConfig => application::configure_port(config, state.port()?),
            Step::ServiceUnit => match config.platform {
                Platform::Linux => linux::register_service(config, runner, state.port()?),
                Platform::Windows => {
                    log::info!("No service manager integration on {}", config.platform);
                    Ok(())
                }
            },
            Step::ServiceStart => match config.platform {
                Platform::Linux => linux::start_service(config, runner),
                Platform::Windows => windows::start_detached(config, runner, state.port()?),
            },
            Step::Connectivity => verify_connectivity(config, state.port()?),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Ok,
    Failed(String),
}

/// Values produced by one step and consumed by later ones.
#[derive(Debug, Default)]
pub struct InstallState {
    port: Option<u16>,
}

impl InstallState {
    /// The selected port; reading it before [`Step::FreePort`] ran is an error.
    pub fn port(&self) -> Result<u16, InstallError> {
        self.port
            .ok_or_else(|| anyhow!("No port has been selected yet").into())
    }

    fn set_port(&mut self, port: u16) -> Result<(), InstallError> {
        if let Some(existing) = self.port {
            return Err(anyhow!("Port already selected ({existing})").into());
        }
        self.port = Some(port);
        Ok(())
    }
}

/// How a run ended when no fatal error occurred.
#[derive(Debug)]
pub enum InstallOutcome {
    Completed(InstallReport),
    Failed { step: Step, reason: String },
}

impl InstallOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallOutcome::Completed(_) => 0,
            InstallOutcome::Failed { .. } => 1,
        }
    }
}

/// Runs [`Step::ALL`] in order against one configuration.
pub struct Pipeline<'a> {
    config: &'a InstallConfig,
    runner: &'a dyn CommandRunner,
    state: InstallState,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a InstallConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            state: InstallState::default(),
        }
    }

    pub fn run(mut self) -> Result<InstallOutcome, InstallError> {
        let total = Step::ALL.len();
        for (index, step) in Step::ALL.into_iter().enumerate() {
            check_interrupt()?;
            log::debug!("Step {}/{total}: {step}", index + 1);

            let outcome = self.run_step(step)?;
            check_interrupt()?;

            if let StepOutcome::Failed(reason) = outcome {
                return Ok(InstallOutcome::Failed { step, reason });
            }
        }

        let report = InstallReport::new(self.config, self.state.port()?, &network::local_ip());
        report.log_summary();
        Ok(InstallOutcome::Completed(report))
    }

    fn run_step(&mut self, step: Step) -> Result<StepOutcome, InstallError> {
        match step.execute(self.config, self.runner, &mut self.state) {
            Ok(()) => Ok(StepOutcome::Ok),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) if signals::interrupted() => {
                log::debug!("Step '{step}' stopped by interrupt: {e:#}");
                Err(InstallError::Interrupted)
            }
            Err(e) => {
                let reason = format!("{e:#}");
                log::error!("Step '{step}' failed: {reason}");
                Ok(StepOutcome::Failed(reason))
            }
        }
    }
}

fn check_interrupt() -> Result<(), InstallError> {
    if signals::interrupted() {
        return Err(InstallError::Interrupted);
    }
    Ok(())
}

fn verify_connectivity(config: &InstallConfig, port: u16) -> Result<(), InstallError> {
    log::info!("Testing installation...");
    let timings = &config.timings;
    if wait_until_reachable(port, &timings.connectivity, timings.connect_timeout) {
        log::info!("Server is responding on port {port}");
        Ok(())
    } else {
        Err(anyhow!("Server is not responding on port {port}").into())
    }
}

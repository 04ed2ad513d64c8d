//! Windows start-up: no service manager integration, the server runs as a
//! detached process.

use anyhow::anyhow;

use super::network::wait_until_reachable;
use super::runner::CommandRunner;
use super::InstallError;
use crate::config::InstallConfig;

/// Launch `node <entry point>` in the install directory and wait for it to listen.
pub fn start_detached(
    config: &InstallConfig,
    runner: &dyn CommandRunner,
    port: u16,
) -> Result<(), InstallError> {
    log::info!("Starting server...");
    let pid = runner.spawn_detached(
        &config.install_dir,
        &config.runtime.program,
        &[config.entry_point.as_str()],
    )?;
    log::info!("Server process started (pid {pid})");

    let timings = &config.timings;
    if !wait_until_reachable(port, &timings.service_ready, timings.connect_timeout) {
        return Err(anyhow!("Server did not start listening on port {port}").into());
    }

    log::info!("Server started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::readiness::Backoff;
    use crate::install::test_support::FakeRunner;
    use std::net::{Ipv4Addr, TcpListener};
    use std::time::Duration;

    fn config(dir: &std::path::Path) -> InstallConfig {
        let mut config = InstallConfig::for_os("windows").unwrap();
        config.install_dir = dir.to_path_buf();
        config.timings.service_ready = Backoff::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            Duration::from_millis(50),
        );
        config.timings.connect_timeout = Duration::from_millis(100);
        config
    }

    #[test]
    fn spawns_node_in_install_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let runner = FakeRunner::new();

        start_detached(&config(tmp.path()), &runner, port).unwrap();

        assert_eq!(runner.commands(), vec!["node server.js"]);
        assert_eq!(runner.dir_of("node"), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn server_that_never_listens_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let port = {
            let probe = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
            probe.local_addr().unwrap().port()
        };
        let runner = FakeRunner::new();
        assert!(start_detached(&config(tmp.path()), &runner, port).is_err());
    }
}

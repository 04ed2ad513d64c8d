//! Port discovery, connectivity probes and local address lookup.

use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};
use std::ops::RangeInclusive;
use std::time::Duration;

use super::InstallError;
use super::readiness::{Backoff, poll_until};

/// Inclusive TCP port range scanned for a free port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub const DEFAULT: PortRange = PortRange {
        start: 3000,
        end: 9999,
    };

    pub fn new(start: u16, end: u16) -> Result<Self, InstallError> {
        if start > end {
            return Err(InstallError::Config(format!(
                "port range start {start} is greater than end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    fn ports(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// First port in `range` that can be bound on the wildcard address.
///
/// The probe listener is dropped before returning, so nothing holds the port
/// afterwards. Another process may grab it before the service binds it; a
/// single-shot installer accepts that window.
pub fn find_free_port(range: PortRange) -> Result<u16, InstallError> {
    log::info!(
        "Searching for a free port in range {}-{}",
        range.start,
        range.end
    );

    for port in range.ports() {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)) {
            Ok(listener) => {
                drop(listener);
                log::info!("Found free port: {port}");
                return Ok(port);
            }
            Err(e) => log::debug!("Port {port} unavailable: {e}"),
        }
    }

    Err(InstallError::NoFreePort {
        start: range.start,
        end: range.end,
    })
}

/// Whether a TCP connection to `localhost:port` succeeds within `timeout`.
///
/// Tries every address `localhost` resolves to.
pub fn probe_connect(port: u16, timeout: Duration) -> bool {
    let addrs: Vec<SocketAddr> = match ("localhost", port).to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(e) => {
            log::debug!("Failed to resolve localhost: {e}");
            vec![SocketAddr::from((Ipv4Addr::LOCALHOST, port))]
        }
    };

    addrs.iter().any(|addr| match TcpStream::connect_timeout(addr, timeout) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("Connect to {addr} failed: {e}");
            false
        }
    })
}

/// Poll `localhost:port` until it accepts a connection or `backoff` runs out.
pub fn wait_until_reachable(port: u16, backoff: &Backoff, connect_timeout: Duration) -> bool {
    poll_until(backoff, || probe_connect(port, connect_timeout).then_some(())).is_some()
}

/// Best-effort address other hosts can reach this machine on.
///
/// Connecting a UDP socket sends nothing; it only makes the kernel pick the
/// outbound interface. Falls back to `localhost`.
pub fn local_ip() -> String {
    local_ip_via("8.8.8.8:80").unwrap_or_else(|| "localhost".to_string())
}

fn local_ip_via(remote: &str) -> Option<String> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(remote).ok()?;
    let addr = socket.local_addr().ok()?;
    if addr.ip().is_unspecified() {
        return None;
    }
    Some(addr.ip().to_string())
}

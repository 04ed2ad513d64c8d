//! Shared test helpers: a scripted `CommandRunner`, a one-shot archive server
//! and configuration shortcuts.

use std::cell::RefCell;
use std::fs;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use svarog_install::InstallConfig;
use svarog_install::install::CommandRunner;
use svarog_install::install::network::PortRange;
use svarog_install::install::readiness::Backoff;
use zip::write::SimpleFileOptions;

// ── Output construction ──────────────────────────────────────────────────────

fn output(code: i32, stdout: &[u8], stderr: &[u8]) -> Output {
    #[cfg(unix)]
    let status = {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    };
    #[cfg(windows)]
    let status = {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    };
    Output {
        status,
        stdout: stdout.to_vec(),
        stderr: stderr.to_vec(),
    }
}

// ── Scripted runner ──────────────────────────────────────────────────────────

/// Behaves like a healthy host with Node.js 18 and systemd.
///
/// `cp -r <src>/. <dst>` really copies, and `systemctl start` (or a detached
/// spawn) starts listening on the configured port so the connectivity check
/// can pass. Every command line is recorded with `sudo` kept.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: RefCell<Vec<String>>,
    failures: Vec<String>,
    absent: Vec<String>,
    serve_port: Option<u16>,
    listener: RefCell<Option<TcpListener>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on `port` once the server is started.
    pub fn serving_on(mut self, port: u16) -> Self {
        self.serve_port = Some(port);
        self
    }

    /// Commands starting with `prefix` (sudo stripped) exit with status 1.
    pub fn fail_on(mut self, prefix: &str) -> Self {
        self.failures.push(prefix.to_string());
        self
    }

    /// `program` is not installed: not on PATH and `--version` fails.
    pub fn without(mut self, program: &str) -> Self {
        self.absent.push(program.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| c.trim_start_matches("sudo ").starts_with(prefix))
    }

    fn record(&self, program: &str, args: &[&str]) -> String {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(line.clone());
        line.trim_start_matches("sudo ").to_string()
    }

    fn start_listening(&self) -> Result<()> {
        if let Some(port) = self.serve_port {
            let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
            *self.listener.borrow_mut() = Some(listener);
        }
        Ok(())
    }

    fn respond(&self, command: &str, args: &[&str]) -> Result<Output> {
        if self.failures.iter().any(|f| command.starts_with(f.as_str())) {
            return Ok(output(1, b"", b"scripted failure"));
        }
        let program = command.split(' ').next().unwrap_or_default();
        if self.absent.iter().any(|a| a == program) {
            return Ok(output(127, b"", b"command not found"));
        }

        let reply = match command {
            "node --version" => output(0, b"v18.17.0\n", b""),
            "npm --version" => output(0, b"9.6.7\n", b""),
            c if c.starts_with("systemctl is-active") => output(0, b"active\n", b""),
            c if c.starts_with("systemctl start") => {
                self.start_listening()?;
                output(0, b"", b"")
            }
            c if c.starts_with("cp -r") => {
                let plain: Vec<&str> = args.iter().copied().filter(|a| *a != "sudo").collect();
                let (src, dst) = (plain[plain.len() - 2], plain[plain.len() - 1]);
                copy_tree(Path::new(src.trim_end_matches("/.")), Path::new(dst))?;
                output(0, b"", b"")
            }
            c if c.starts_with("mkdir -p") => {
                if let Some(dir) = args.last() {
                    fs::create_dir_all(dir)?;
                }
                output(0, b"", b"")
            }
            _ => output(0, b"", b""),
        };
        Ok(reply)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let command = self.record(program, args);
        self.respond(&command, args)
    }

    fn run_in(&self, _dir: &Path, program: &str, args: &[&str]) -> Result<Output> {
        let command = self.record(program, args);
        self.respond(&command, args)
    }

    fn spawn_detached(&self, _dir: &Path, program: &str, args: &[&str]) -> Result<u32> {
        self.record(program, args);
        self.start_listening()?;
        Ok(4242)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        if self.absent.iter().any(|a| a == program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

// ── Archive server ───────────────────────────────────────────────────────────

pub const SERVER_JS: &str = "const express = require('express');\n\
const PORT = process.env.PORT || 3000;\n\
app.listen(PORT);\n";

/// Zip laid out like a branch archive: one top-level directory.
pub fn branch_archive(server_js: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.add_directory("svarog-server-management-main/", options)
        .unwrap();
    zip.start_file("svarog-server-management-main/server.js", options)
        .unwrap();
    zip.write_all(server_js.as_bytes()).unwrap();
    zip.start_file("svarog-server-management-main/package.json", options)
        .unwrap();
    zip.write_all(br#"{"name":"svarog","scripts":{"init-db":"node init.js"}}"#)
        .unwrap();
    zip.finish().unwrap().into_inner()
}

/// Serve `body` to a single HTTP request. The handle yields the request line.
pub fn serve_once(body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(header.as_bytes()).unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    (base_url, handle)
}

// ── Configuration ────────────────────────────────────────────────────────────

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

pub fn quick_backoff() -> Backoff {
    Backoff::new(
        Duration::from_millis(5),
        Duration::from_millis(20),
        Duration::from_millis(300),
    )
}

/// Linux configuration rooted in `root`, scanning only `port`.
pub fn linux_config(root: &Path, base_url: &str, port: u16) -> InstallConfig {
    let mut config = InstallConfig::for_os("linux").unwrap();
    config.install_dir = root.join("svarog");
    config.unit_dir = root.join("units");
    config.source.base_url = base_url.to_string();
    config.port_range = PortRange::new(port, port).unwrap();
    config.elevate = true;
    config.owner = "svarog".to_string();
    config.timings.service_ready = quick_backoff();
    config.timings.connectivity = quick_backoff();
    config.timings.connect_timeout = Duration::from_millis(200);
    config.timings.download_timeout = Duration::from_secs(10);
    config
}

//! External command execution.
//!
//! Every package-manager, npm and systemd invocation goes through
//! [`CommandRunner`] so the pipeline can be driven by a recording fake.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result, bail};

/// Abstracts process execution so the real system can be swapped out.
pub trait CommandRunner {
    /// Run a program to completion and capture its output.
    fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with `dir` as its working directory.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output>;

    /// Start a program in `dir` without waiting for it. Returns the child PID.
    fn spawn_detached(&self, dir: &Path, program: &str, args: &[&str]) -> Result<u32>;

    /// Resolve a program on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Run a program and fail unless it exits successfully.
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<Output> {
        let output = self.run(program, args)?;
        check_status(program, args, output)
    }

    /// Run a program in `dir` and fail unless it exits successfully.
    fn run_checked_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output> {
        let output = self.run_in(dir, program, args)?;
        check_status(program, args, output)
    }
}

/// Production runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        log::debug!("Running: {}", display_command(program, args));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {program}"))
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output> {
        log::debug!(
            "Running in {}: {}",
            dir.display(),
            display_command(program, args)
        );
        Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {program} in {}", dir.display()))
    }

    fn spawn_detached(&self, dir: &Path, program: &str, args: &[&str]) -> Result<u32> {
        log::debug!(
            "Spawning in {}: {}",
            dir.display(),
            display_command(program, args)
        );
        let child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {program} in {}", dir.display()))?;
        Ok(child.id())
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Turn a non-zero exit into an error carrying the tail of stderr.
pub fn check_status(program: &str, args: &[&str], output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr_tail(&stderr, 10);
    match output.status.code() {
        Some(code) => bail!(
            "`{}` exited with status {code}{detail}",
            display_command(program, args)
        ),
        None => bail!(
            "`{}` was terminated by a signal{detail}",
            display_command(program, args)
        ),
    }
}

/// Trimmed stdout of a finished command.
pub fn stdout_trimmed(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub(crate) fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

fn stderr_tail(stderr: &str, lines: usize) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let all: Vec<&str> = trimmed.lines().collect();
    let start = all.len().saturating_sub(lines);
    format!(": {}", all[start..].join("\n"))
}

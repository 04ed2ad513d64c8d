//! Shared test helpers: a recording `CommandRunner` and output constructors.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

use anyhow::{Result, bail};

use super::runner::{CommandRunner, display_command};

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

enum Canned {
    Output(Output),
    Missing,
}

/// Records every command line and answers from canned responses.
///
/// Responses are keyed by command prefix with any leading `sudo ` stripped,
/// so `respond("systemctl is-active", ..)` matches both elevated and direct
/// calls. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<(Option<PathBuf>, String)>>,
    responses: Vec<(String, Canned)>,
    programs: HashMap<String, PathBuf>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, prefix: &str, output: Output) -> Self {
        self.responses
            .push((prefix.to_string(), Canned::Output(output)));
        self
    }

    pub fn fail_on(self, prefix: &str) -> Self {
        self.respond(prefix, err_output(1, b"simulated failure"))
    }

    /// Make spawning commands with this prefix fail as if the binary were absent.
    pub fn missing(mut self, prefix: &str) -> Self {
        self.responses.push((prefix.to_string(), Canned::Missing));
        self
    }

    pub fn with_program(mut self, name: &str, path: &str) -> Self {
        self.programs.insert(name.to_string(), PathBuf::from(path));
        self
    }

    /// Every recorded command line, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Working directory a command ran in, if it was started with one.
    pub fn dir_of(&self, prefix: &str) -> Option<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .find(|(_, c)| c.starts_with(prefix))
            .and_then(|(d, _)| d.clone())
    }

    fn answer(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> Result<Output> {
        let line = display_command(program, args);
        self.calls
            .borrow_mut()
            .push((dir.map(Path::to_path_buf), line.clone()));

        let key = line.strip_prefix("sudo ").unwrap_or(&line);
        match self
            .responses
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix.as_str()))
        {
            Some((_, Canned::Output(out))) => Ok(out.clone()),
            Some((_, Canned::Missing)) => bail!("Failed to execute {program}: not found"),
            None => Ok(ok_output(b"")),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.answer(None, program, args)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output> {
        self.answer(Some(dir), program, args)
    }

    fn spawn_detached(&self, dir: &Path, program: &str, args: &[&str]) -> Result<u32> {
        self.answer(Some(dir), program, args)?;
        Ok(4242)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.programs.get(program).cloned()
    }
}

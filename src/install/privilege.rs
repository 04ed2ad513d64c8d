//! Privilege escalation for system-wide operations
//!
//! On the privileged platform directory creation, copies into the install
//! location, unit installation and `systemctl` calls run through `sudo`
//! unless the installer already runs as root.

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use super::runner::CommandRunner;

/// Runs commands with `sudo` prepended when `sudo` is set.
pub struct Elevated<'a> {
    runner: &'a dyn CommandRunner,
    sudo: bool,
}

impl<'a> Elevated<'a> {
    pub fn new(runner: &'a dyn CommandRunner, sudo: bool) -> Self {
        Self { runner, sudo }
    }

    /// Run `program args` with elevation, failing on a non-zero exit.
    pub fn run_checked(&self, program: &str, args: &[&str]) -> Result<Output> {
        if self.sudo {
            self.runner.run_checked("sudo", &with_program(program, args))
        } else {
            self.runner.run_checked(program, args)
        }
    }

    /// Run `program args` with elevation and return the output whatever the exit status.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        if self.sudo {
            self.runner.run("sudo", &with_program(program, args))
        } else {
            self.runner.run(program, args)
        }
    }

    /// `sudo mkdir -p <dir>`
    pub fn create_dir_all(&self, dir: &Path) -> Result<()> {
        self.run_checked("mkdir", &["-p", &dir.to_string_lossy()])?;
        Ok(())
    }

    /// `sudo cp -r <src>/. <dst>`
    pub fn copy_contents(&self, src: &Path, dst: &Path) -> Result<()> {
        let src = format!("{}/.", src.display());
        self.run_checked("cp", &["-r", &src, &dst.to_string_lossy()])?;
        Ok(())
    }

    /// `sudo chown -R <owner>:<owner> <path>`
    pub fn chown_recursive(&self, path: &Path, owner: &str) -> Result<()> {
        let spec = format!("{owner}:{owner}");
        self.run_checked("chown", &["-R", &spec, &path.to_string_lossy()])?;
        Ok(())
    }

    /// `sudo mv <from> <to>`
    pub fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.run_checked("mv", &[&from.to_string_lossy(), &to.to_string_lossy()])?;
        Ok(())
    }
}

fn with_program<'a>(program: &'a str, args: &[&'a str]) -> Vec<&'a str> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push(program);
    full.extend_from_slice(args);
    full
}

/// Check if running as root
#[inline]
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Name of the invoking user, for handing ownership of the install tree back.
///
/// Prefers `$USER` (preserved by sudo wrappers), then the passwd entry of the
/// real UID.
pub fn current_user() -> String {
    if let Ok(user) = std::env::var("USER")
        && !user.is_empty()
    {
        return user;
    }

    #[cfg(unix)]
    {
        if let Ok(Some(user)) = nix::unistd::User::from_uid(nix::unistd::getuid()) {
            return user.name;
        }
    }

    #[cfg(windows)]
    {
        if let Ok(user) = std::env::var("USERNAME") {
            return user;
        }
    }

    "root".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::test_support::FakeRunner;

    #[test]
    fn sudo_is_prepended_when_elevating() {
        let runner = FakeRunner::new();
        Elevated::new(&runner, true)
            .create_dir_all(Path::new("/opt/svarog"))
            .unwrap();
        assert_eq!(runner.commands(), vec!["sudo mkdir -p /opt/svarog"]);
    }

    #[test]
    fn root_runs_commands_directly() {
        let runner = FakeRunner::new();
        let elevated = Elevated::new(&runner, false);
        elevated
            .copy_contents(Path::new("/tmp/x/svarog-main"), Path::new("/opt/svarog"))
            .unwrap();
        elevated
            .chown_recursive(Path::new("/opt/svarog"), "deploy")
            .unwrap();
        assert_eq!(
            runner.commands(),
            vec![
                "cp -r /tmp/x/svarog-main/. /opt/svarog",
                "chown -R deploy:deploy /opt/svarog",
            ]
        );
    }

    #[test]
    fn failed_command_is_an_error() {
        let runner = FakeRunner::new().fail_on("mv");
        let result = Elevated::new(&runner, true)
            .move_file(Path::new("/tmp/a"), Path::new("/etc/systemd/system/a"));
        assert!(result.is_err());
    }
}

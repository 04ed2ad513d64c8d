//! Systemd unit file generation and installation.
//!
//! The unit is staged as the invoking user, then moved into the system unit
//! directory with elevated privileges.

use std::path::Path;

use anyhow::{Context, Result};

use crate::install::file_ops::write_file_atomic;
use crate::install::privilege::Elevated;

/// Fallback `ExecStart` interpreter when `node` is not on `PATH`.
pub(super) const DEFAULT_NODE_PATH: &str = "/usr/bin/node";

/// Everything the unit template needs.
#[derive(Debug, Clone)]
pub(crate) struct UnitSpec<'a> {
    pub service_name: &'a str,
    pub description: &'a str,
    pub documentation: &'a str,
    pub working_dir: &'a Path,
    pub node_path: &'a Path,
    pub entry_point: &'a str,
    pub port: u16,
}

/// Render the unit file.
///
/// Hardening confines writes to the install directory; the daemon itself
/// runs as root.
pub(crate) fn render_unit(spec: &UnitSpec) -> String {
    let working_dir = spec.working_dir.display();
    let mut content = String::with_capacity(1024);

    // [Unit] section
    content.push_str("[Unit]\n");
    content.push_str(&format!("Description={}\n", spec.description));
    content.push_str(&format!("Documentation={}\n", spec.documentation));
    content.push_str("After=network.target\n");
    content.push('\n');

    // [Service] section
    content.push_str("[Service]\n");
    content.push_str("Type=simple\n");
    content.push_str("User=root\n");
    content.push_str(&format!("WorkingDirectory={working_dir}\n"));
    content.push_str("Environment=NODE_ENV=production\n");
    content.push_str(&format!("Environment=PORT={}\n", spec.port));
    content.push_str(&format!(
        "ExecStart={} {}\n",
        spec.node_path.display(),
        spec.entry_point
    ));
    content.push_str("Restart=on-failure\n");
    content.push_str("RestartSec=10\n");

    // Logging
    content.push_str("StandardOutput=journal\n");
    content.push_str("StandardError=journal\n");
    content.push_str(&format!("SyslogIdentifier={}\n", spec.service_name));
    content.push('\n');

    // Security and sandboxing
    content.push_str("NoNewPrivileges=yes\n");
    content.push_str("PrivateTmp=yes\n");
    content.push_str("ProtectSystem=strict\n");
    content.push_str(&format!("ReadWritePaths={working_dir}\n"));
    content.push('\n');

    // [Install] section
    content.push_str("[Install]\n");
    content.push_str("WantedBy=multi-user.target\n");

    content
}

/// Stage `content` in a temp dir and move it to `unit_path`.
pub(super) fn install_unit_file(
    elevated: &Elevated,
    unit_path: &Path,
    content: &str,
) -> Result<()> {
    let staging = tempfile::Builder::new()
        .prefix("svarog_unit")
        .tempdir()
        .context("Failed to create unit staging directory")?;
    let file_name = unit_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid unit path {}", unit_path.display()))?;
    let staged = staging.path().join(file_name);

    write_file_atomic(&staged, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o644))
            .context("Failed to set unit file permissions")?;
    }

    elevated.move_file(&staged, unit_path)?;
    Ok(())
}

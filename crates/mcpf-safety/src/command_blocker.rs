// SPDX-License-Identifier: MIT OR Apache-2.0
//! A PATH-prefix directory of inert shims standing in for launcher binaries,
//! installed for child processes spawned with `MCP_FUZZER_IN_SAFE_MODE=1`.

use crate::danger::LAUNCHER_BINARIES;
use crate::error::SafetyError;
use std::io::Write;
use tempfile::TempDir;
use tracing::warn;

/// The environment variable that activates the shim directory for a spawned
/// child, per the core's external-interface contract.
pub const SAFE_MODE_ENV_VAR: &str = "MCP_FUZZER_IN_SAFE_MODE";

/// A temporary PATH-prefix directory populated with shims for
/// [`LAUNCHER_BINARIES`]. Each shim exits nonzero and logs instead of
/// actually launching anything. Removed when dropped.
pub struct CommandBlocker {
    dir: TempDir,
}

impl CommandBlocker {
    /// Create the shim directory and populate it with one shim per
    /// dangerous command.
    pub fn install() -> Result<Self, SafetyError> {
        let dir = tempfile::tempdir().map_err(|source| SafetyError::ShimInstall {
            command: "<tempdir>".to_string(),
            source,
        })?;

        for command in LAUNCHER_BINARIES {
            write_shim(dir.path(), command)?;
        }

        Ok(Self { dir })
    }

    /// The directory that should be prepended to `PATH` for a child process.
    pub fn path_prefix(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Build a `PATH` value with the shim directory prepended to `existing`.
    pub fn prepend_to_path(&self, existing: &str) -> String {
        format!("{}:{existing}", self.dir.path().display())
    }
}

#[cfg(unix)]
fn write_shim(dir: &std::path::Path, command: &str) -> Result<(), SafetyError> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(command);
    let script = format!(
        "#!/bin/sh\necho \"mcp-fuzzer: blocked '{command}' in safe mode\" >&2\nexit 1\n"
    );

    let mut file = std::fs::File::create(&path).map_err(|source| SafetyError::ShimInstall {
        command: command.to_string(),
        source,
    })?;
    file.write_all(script.as_bytes())
        .map_err(|source| SafetyError::ShimInstall { command: command.to_string(), source })?;
    let mut perms = file
        .metadata()
        .map_err(|source| SafetyError::ShimInstall { command: command.to_string(), source })?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms)
        .map_err(|source| SafetyError::ShimInstall { command: command.to_string(), source })?;
    Ok(())
}

#[cfg(not(unix))]
fn write_shim(_dir: &std::path::Path, command: &str) -> Result<(), SafetyError> {
    warn!(target: "mcpf.safety.command_blocker", command, "PATH shims are POSIX-only; safe mode provides no protection for launcher binaries on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_a_shim_per_launcher_binary() {
        let blocker = CommandBlocker::install().expect("install shims");
        for command in LAUNCHER_BINARIES {
            assert!(blocker.path_prefix().join(command).exists());
        }
    }

    #[cfg(unix)]
    #[test]
    fn shim_exits_nonzero_and_does_not_launch_anything() {
        let blocker = CommandBlocker::install().expect("install shims");
        let output = std::process::Command::new(blocker.path_prefix().join("xdg-open"))
            .arg("http://example.com")
            .output()
            .expect("run shim");
        assert!(!output.status.success());
    }

    #[test]
    fn prepend_to_path_keeps_existing_entries() {
        let blocker = CommandBlocker::install().expect("install shims");
        let combined = blocker.prepend_to_path("/usr/bin:/bin");
        assert!(combined.ends_with("/usr/bin:/bin"));
        assert!(combined.starts_with(&blocker.path_prefix().display().to_string()));
    }

    #[test]
    fn directory_is_removed_on_drop() {
        let blocker = CommandBlocker::install().expect("install shims");
        let path = blocker.path_prefix().to_path_buf();
        drop(blocker);
        assert!(!path.exists());
    }
}

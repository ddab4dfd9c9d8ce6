//! Thin wrapper around the `adb` command line tool.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{DeviceError, Result};

/// Handle on one device reachable through adb.
#[derive(Debug, Clone)]
pub struct Adb {
    program: PathBuf,
    serial: Option<String>,
}

impl Adb {
    /// Use the `adb` binary at `program`, optionally pinned to one device.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            program: program.into(),
            serial,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(serial) = &self.serial {
            cmd.args(["-s", serial]);
        }
        cmd.args(args);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program.display(), args.join(" "))
    }

    fn spawn_error(&self, source: std::io::Error) -> DeviceError {
        DeviceError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        debug!(command = %self.describe(args), "adb");
        let status = self
            .command(args)
            .stdout(Stdio::null())
            .status()
            .map_err(|e| self.spawn_error(e))?;
        if !status.success() {
            return Err(DeviceError::CommandFailed {
                command: self.describe(args),
                status,
            });
        }
        Ok(())
    }

    /// Kill and start the adb server.
    pub fn restart_server(&self) -> Result<()> {
        info!("Restarting adb server.");
        self.run(&["kill-server"])?;
        self.run(&["start-server"])
    }

    /// Run a command through `adb exec-out` and return its raw stdout.
    pub fn exec_out(&self, args: &[&str]) -> Result<Vec<u8>> {
        let full: Vec<&str> = std::iter::once("exec-out").chain(args.iter().copied()).collect();
        debug!(command = %self.describe(&full), "adb");
        let output = self
            .command(&full)
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: self.describe(&full),
                status: output.status,
            });
        }
        Ok(output.stdout)
    }

    /// Run a command through `adb shell`.
    pub fn shell(&self, args: &[&str]) -> Result<()> {
        let full: Vec<&str> = std::iter::once("shell").chain(args.iter().copied()).collect();
        self.run(&full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_is_passed_first() {
        let adb = Adb::new("adb", Some("emulator-5554".to_string()));
        let cmd = adb.command(&["shell", "input", "tap", "1", "2"]);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-s", "emulator-5554", "shell", "input", "tap", "1", "2"]);
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let adb = Adb::new("/nonexistent/sortie-adb", None);
        let err = adb.exec_out(&["screencap", "-p"]).unwrap_err();
        assert!(matches!(err, DeviceError::Spawn { .. }));
    }
}

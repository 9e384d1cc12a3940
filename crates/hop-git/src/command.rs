use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use hop_core::{render_command, run_with_timeout, OutputMode};

use crate::error::GitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCli {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
            timeout: Duration::from_secs(1),
        }
    }
}

impl GitCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `git -C cwd <args>` and return trimmed stdout.
    pub fn run<I, S>(&self, cwd: &Path, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let owned_args: Vec<OsString> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();

        let mut command = Command::new(&self.binary);
        command.arg("-C").arg(cwd).args(&owned_args);
        let output = run_with_timeout(&mut command, self.timeout, OutputMode::Capture)?;

        if !output.success() {
            return Err(GitError::CommandFailed {
                command: render_command(command.get_program(), command.get_args()),
                status: output.status.code(),
            });
        }

        Ok(output.stdout.trim().to_string())
    }
}

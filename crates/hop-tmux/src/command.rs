use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use hop_core::{run_with_timeout, shell_join, OutputMode, ProcessOutput};

use crate::error::TmuxError;

/// Thin wrapper over the `tmux` binary. Every invocation is bounded by
/// `timeout` so a wedged server can never stall a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxCli {
    pub binary: PathBuf,
    /// Server socket, passed as `-S` when set.
    pub socket: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for TmuxCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tmux"),
            socket: None,
            timeout: Duration::from_secs(1),
        }
    }
}

impl TmuxCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    pub fn with_socket(mut self, socket: Option<PathBuf>) -> Self {
        self.socket = socket;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full argv, binary first.
    pub fn argv<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut argv = vec![self.binary.to_string_lossy().into_owned()];
        if let Some(socket) = &self.socket {
            argv.push("-S".to_string());
            argv.push(socket.to_string_lossy().into_owned());
        }
        argv.extend(args.iter().map(|arg| arg.as_ref().to_string()));
        argv
    }

    /// Shell-quoted form of the invocation, for logs and dry runs.
    pub fn render<S: AsRef<str>>(&self, args: &[S]) -> String {
        shell_join(self.argv(args))
    }

    fn invoke<S: AsRef<str>>(
        &self,
        args: &[S],
        mode: OutputMode,
    ) -> Result<ProcessOutput, TmuxError> {
        let argv = self.argv(args);
        let mut command = Command::new(&self.binary);
        command.args(&argv[1..]);
        let output = run_with_timeout(&mut command, self.timeout, mode)?;
        if !output.success() {
            return Err(TmuxError::CommandFailed {
                command: shell_join(&argv),
                status: output.status.code(),
            });
        }
        Ok(output)
    }

    /// Run and discard output.
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<(), TmuxError> {
        self.invoke(args, OutputMode::Discard).map(|_| ())
    }

    /// Run and return trimmed stdout. Blank output is an error.
    pub fn capture<S: AsRef<str>>(&self, args: &[S]) -> Result<String, TmuxError> {
        let output = self.invoke(args, OutputMode::Capture)?;
        let trimmed = output.stdout.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() {
            return Err(TmuxError::EmptyOutput {
                command: self.render(args),
            });
        }
        Ok(trimmed.to_string())
    }
}

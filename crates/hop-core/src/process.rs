//! Time-bounded subprocess execution shared by every external call.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Discard,
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("command failed to start ({command}): {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("command timed out after {timeout:?} ({command})")]
    TimedOut { command: String, timeout: Duration },
    #[error("failed to wait for command ({command}): {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Run `command` to completion or kill it once `timeout` elapses.
///
/// stdin is closed and stderr discarded. A killed command is reported as
/// [`ProcessError::TimedOut`].
pub fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
    mode: OutputMode,
) -> Result<ProcessOutput, ProcessError> {
    let rendered = render_command(command.get_program(), command.get_args());
    command.stdin(Stdio::null()).stderr(Stdio::null());
    match mode {
        OutputMode::Capture => command.stdout(Stdio::piped()),
        OutputMode::Discard => command.stdout(Stdio::null()),
    };

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        command: rendered.clone(),
        source,
    })?;

    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        })
    });

    // `None` when the timeout is too far out to represent: wait for exit.
    let deadline = Instant::now().checked_add(timeout);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Wait {
                    command: rendered,
                    source,
                });
            }
        }

        let now = Instant::now();
        let remaining = match deadline {
            Some(deadline) if now >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::TimedOut {
                    command: rendered,
                    timeout,
                });
            }
            Some(deadline) => deadline - now,
            None => POLL_INTERVAL,
        };
        thread::sleep(POLL_INTERVAL.min(remaining));
    };

    let stdout = reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    Ok(ProcessOutput { status, stdout })
}

pub fn render_command<'a>(program: &OsStr, args: impl IntoIterator<Item = &'a OsStr>) -> String {
    let mut rendered = program.to_string_lossy().into_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    rendered
}

pub fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Look `name` up on `PATH`, then try each fallback location in order.
///
/// Helpers launched from notification centers often inherit a minimal
/// `PATH`, so package-manager locations are listed explicitly.
pub fn find_program(name: &str, fallbacks: &[&str]) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }
    fallbacks
        .iter()
        .map(Path::new)
        .find(|candidate| is_executable(candidate))
        .map(Path::to_path_buf)
}

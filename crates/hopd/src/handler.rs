//! One handler program: how to launch it and what became of the run.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use hop_core::{is_executable, run_with_timeout, OutputMode, ProcessError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    /// Executed directly; needs the executable bit.
    Direct,
    /// Passed as the first argument to an interpreter found on `PATH`.
    Interpreter(&'static str),
}

impl Launcher {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sh") => Self::Interpreter("sh"),
            Some("py") => Self::Interpreter("python3"),
            _ => Self::Direct,
        }
    }
}

/// A handler resolved to its canonical path. Equality and hashing use the
/// path only, so the same file reached through different spellings is one
/// handler.
#[derive(Debug, Clone)]
pub struct HandlerTarget {
    pub path: PathBuf,
    pub launcher: Launcher,
}

impl PartialEq for HandlerTarget {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for HandlerTarget {}

impl Hash for HandlerTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl HandlerTarget {
    /// `None` when the path does not name a runnable file.
    pub fn resolve(path: &Path) -> Option<Self> {
        let path = path.canonicalize().ok()?;
        if !path.is_file() {
            return None;
        }
        let launcher = Launcher::for_path(&path);
        if launcher == Launcher::Direct && !is_executable(&path) {
            return None;
        }
        Some(Self { path, launcher })
    }

    pub fn command(&self, payload: &str) -> Command {
        let mut command = match self.launcher {
            Launcher::Direct => Command::new(&self.path),
            Launcher::Interpreter(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(&self.path);
                command
            }
        };
        command.arg(payload);
        command
    }

    /// Run with `payload` as the only argument, output discarded.
    pub fn run(&self, payload: &str, timeout: Duration) -> HandlerOutcome {
        match run_with_timeout(&mut self.command(payload), timeout, OutputMode::Discard) {
            Ok(output) => HandlerOutcome::Exited {
                code: output.status.code(),
            },
            Err(ProcessError::TimedOut { .. }) => HandlerOutcome::TimedOut,
            Err(err) => HandlerOutcome::Failed {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// `code` is `None` when the handler died from a signal.
    Exited { code: Option<i32> },
    TimedOut,
    Failed { message: String },
    /// The handler is the running dispatcher itself.
    SkippedSelf,
    /// Nothing runnable at the configured path.
    Missing,
}

impl HandlerOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0) })
    }
}

impl fmt::Display for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code: Some(code) } => write!(f, "exited {code}"),
            Self::Exited { code: None } => f.write_str("killed by signal"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Failed { message } => write!(f, "failed: {message}"),
            Self::SkippedSelf => f.write_str("skipped (self)"),
            Self::Missing => f.write_str("missing"),
        }
    }
}

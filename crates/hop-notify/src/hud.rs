//! Short-lived on-screen messages for click-resolution failures.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use hop_core::{is_executable, run_with_timeout, OutputMode};

use crate::error::NotifyError;
use crate::sink::{run_display_notification, OSASCRIPT_BIN};

pub trait Hud {
    fn show(&self, title: &str, body: &str, client_tty: Option<&str>) -> Result<(), NotifyError>;
}

/// User-provided script invoked as `script <title> <body> <client tty>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHud {
    pub script: PathBuf,
    pub timeout: Duration,
}

impl Hud for ScriptHud {
    fn show(&self, title: &str, body: &str, client_tty: Option<&str>) -> Result<(), NotifyError> {
        let mut command = Command::new(&self.script);
        command.arg(title).arg(body).arg(client_tty.unwrap_or(""));
        let output = run_with_timeout(&mut command, self.timeout, OutputMode::Discard)?;
        if !output.success() {
            return Err(NotifyError::SinkFailed {
                sink: self.script.display().to_string(),
                status: output.status.code(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsascriptHud {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl Hud for OsascriptHud {
    fn show(&self, title: &str, body: &str, _client_tty: Option<&str>) -> Result<(), NotifyError> {
        run_display_notification(&self.binary, title, body, self.timeout)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogHud;

impl Hud for LogHud {
    fn show(&self, title: &str, body: &str, client_tty: Option<&str>) -> Result<(), NotifyError> {
        tracing::warn!(title, client_tty = client_tty.unwrap_or(""), "{body}");
        Ok(())
    }
}

/// The configured script when executable, else osascript, else the log.
pub fn select_hud(script: &Path, timeout: Duration) -> Box<dyn Hud> {
    if is_executable(script) {
        return Box::new(ScriptHud {
            script: script.to_path_buf(),
            timeout,
        });
    }
    let osascript = Path::new(OSASCRIPT_BIN);
    if is_executable(osascript) {
        return Box::new(OsascriptHud {
            binary: osascript.to_path_buf(),
            timeout,
        });
    }
    Box::new(LogHud)
}

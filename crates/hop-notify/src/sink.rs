use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use hop_core::{find_program, is_executable, run_with_timeout, OutputMode, ProcessError};

use crate::error::NotifyError;
use crate::types::{DesktopNotification, NotificationSinkKind};

pub const OSASCRIPT_BIN: &str = "/usr/bin/osascript";

const TERMINAL_NOTIFIER_FALLBACKS: &[&str] = &[
    "/opt/homebrew/bin/terminal-notifier",
    "/usr/local/bin/terminal-notifier",
];

/// AppleScript taking `title` and `body` as its two arguments.
pub(crate) const DISPLAY_NOTIFICATION_SCRIPT: &str = "on run argv\n  \
     display notification (item 2 of argv) with title (item 1 of argv)\n\
     end run\n";

pub trait NotificationSink: Send + Sync {
    fn kind(&self) -> NotificationSinkKind;
    fn send(&self, notification: &DesktopNotification) -> Result<(), NotifyError>;

    /// Withdraw the notification posted under `group` once `delay` has
    /// passed, without blocking the caller.
    fn schedule_removal(&self, group: &str, delay: Duration) -> Result<(), NotifyError> {
        let _ = (group, delay);
        Err(NotifyError::Unavailable {
            tool: format!("{:?} removal", self.kind()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalNotifierSink {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl TerminalNotifierSink {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn args(notification: &DesktopNotification) -> Vec<String> {
        let mut args = vec![
            "-title".to_string(),
            notification.title.clone(),
            "-message".to_string(),
            notification.message.clone(),
        ];
        let optional = [
            ("-group", &notification.group),
            ("-activate", &notification.activate),
            ("-execute", &notification.on_click),
        ];
        for (flag, value) in optional {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }
        args
    }
}

impl NotificationSink for TerminalNotifierSink {
    fn kind(&self) -> NotificationSinkKind {
        NotificationSinkKind::TerminalNotifier
    }

    fn send(&self, notification: &DesktopNotification) -> Result<(), NotifyError> {
        let mut command = Command::new(&self.binary);
        command.args(Self::args(notification));
        let output = run_with_timeout(&mut command, self.timeout, OutputMode::Discard)?;
        if !output.success() {
            return Err(NotifyError::SinkFailed {
                sink: "terminal-notifier".to_string(),
                status: output.status.code(),
            });
        }
        Ok(())
    }

    /// Runs in a detached shell so the calling handler can exit right away.
    fn schedule_removal(&self, group: &str, delay: Duration) -> Result<(), NotifyError> {
        if group.is_empty() {
            return Ok(());
        }
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(r#"sleep "$1"; exec "$2" -remove "$3""#)
            .arg("panehop-remove")
            .arg(format!("{:.3}", delay.as_secs_f64()))
            .arg(&self.binary)
            .arg(group)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command.spawn().map_err(|source| ProcessError::Spawn {
            command: format!("{} -remove {group}", self.binary.display()),
            source,
        })?;
        Ok(())
    }
}

/// Plain `display notification`; no grouping or click action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsascriptSink {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl OsascriptSink {
    pub fn new(timeout: Duration) -> Self {
        Self {
            binary: PathBuf::from(OSASCRIPT_BIN),
            timeout,
        }
    }
}

impl NotificationSink for OsascriptSink {
    fn kind(&self) -> NotificationSinkKind {
        NotificationSinkKind::Osascript
    }

    fn send(&self, notification: &DesktopNotification) -> Result<(), NotifyError> {
        run_display_notification(
            &self.binary,
            &notification.title,
            &notification.message,
            self.timeout,
        )
    }
}

pub(crate) fn run_display_notification(
    osascript: &Path,
    title: &str,
    body: &str,
    timeout: Duration,
) -> Result<(), NotifyError> {
    let mut command = Command::new(osascript);
    command
        .arg("-e")
        .arg(DISPLAY_NOTIFICATION_SCRIPT)
        .arg(title)
        .arg(body);
    let output = run_with_timeout(&mut command, timeout, OutputMode::Discard)?;
    if !output.success() {
        return Err(NotifyError::SinkFailed {
            sink: "osascript".to_string(),
            status: output.status.code(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn kind(&self) -> NotificationSinkKind {
        NotificationSinkKind::Log
    }

    fn send(&self, notification: &DesktopNotification) -> Result<(), NotifyError> {
        tracing::info!(
            title = %notification.title,
            group = notification.group.as_deref().unwrap_or(""),
            on_click = notification.on_click.as_deref().unwrap_or(""),
            "{}",
            notification.message
        );
        Ok(())
    }
}

pub fn find_terminal_notifier() -> Option<PathBuf> {
    find_program("terminal-notifier", TERMINAL_NOTIFIER_FALLBACKS)
}

/// terminal-notifier when installed, else osascript, else the log.
pub fn select_sink(timeout: Duration) -> Box<dyn NotificationSink> {
    if let Some(binary) = find_terminal_notifier() {
        return Box::new(TerminalNotifierSink::new(binary, timeout));
    }
    if is_executable(Path::new(OSASCRIPT_BIN)) {
        return Box::new(OsascriptSink::new(timeout));
    }
    Box::new(LogSink)
}

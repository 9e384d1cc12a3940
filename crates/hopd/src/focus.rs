//! Bring the terminal application's own window and tab forward.
//!
//! tmux can switch clients, but only the terminal application knows which
//! of its windows shows which tty. Every call is best effort.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use hop_core::{is_executable, run_with_timeout, OutputMode};
use hop_notify::OSASCRIPT_BIN;

pub trait TerminalFocus {
    /// tty of the session the terminal would show first: its hotkey window
    /// if it has one, else the current window.
    fn preferred_tty(&self) -> Option<String>;

    /// Reveal and select the session attached to `tty`. False when no
    /// session matched.
    fn select_session_by_tty(&self, tty: &str) -> bool;

    /// Bring the application forward without choosing a session.
    fn activate(&self) -> bool;

    /// Bundle identifier of the frontmost application.
    fn frontmost_app(&self) -> Option<String>;
}

const PREFERRED_TTY_SCRIPT: &str = r#"on run argv
  tell application "iTerm2"
    set preferredTty to ""
    try
      repeat with w in windows
        if is hotkey window of w then
          try
            tell w to reveal hotkey window
          end try
          set preferredTty to tty of current session of w
          exit repeat
        end if
      end repeat
    end try
    if preferredTty is "" then
      try
        set preferredTty to tty of current session of current window
      end try
    end if
    activate
    return preferredTty
  end tell
end run"#;

const SELECT_BY_TTY_SCRIPT: &str = r#"on run argv
  set wanted to item 1 of argv
  set wantedBase to item 2 of argv
  tell application "iTerm2"
    repeat with w in windows
      repeat with t in tabs of w
        repeat with s in sessions of t
          try
            set sessionTty to tty of s
            if (sessionTty is equal to wanted) or (sessionTty ends with wantedBase) then
              try
                if is hotkey window of w then
                  tell w to reveal hotkey window
                else
                  tell w to select
                end if
              end try
              try
                tell t to select
              end try
              try
                tell s to select
              end try
              activate
              return "1"
            end if
          end try
        end repeat
      end repeat
    end repeat
  end tell
  return ""
end run"#;

const ACTIVATE_SCRIPT: &str = r#"on run argv
  tell application "iTerm2"
    try
      repeat with w in windows
        if is hotkey window of w then
          tell w to reveal hotkey window
          exit repeat
        end if
      end repeat
    end try
    activate
  end tell
  return "1"
end run"#;

const FRONTMOST_SCRIPT: &str = r#"tell application "System Events" to get bundle identifier of first application process whose frontmost is true"#;

/// iTerm2 driven through AppleScript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iterm2Focus {
    pub osascript: PathBuf,
    pub timeout: Duration,
}

impl Iterm2Focus {
    pub fn new(timeout: Duration) -> Self {
        Self {
            osascript: PathBuf::from(OSASCRIPT_BIN),
            timeout,
        }
    }

    /// Trimmed stdout of a successful run, `None` when empty or failed.
    fn run_script(&self, script: &str, args: &[&str]) -> Option<String> {
        let mut command = Command::new(&self.osascript);
        command.arg("-e").arg(script).args(args);
        match run_with_timeout(&mut command, self.timeout, OutputMode::Capture) {
            Ok(output) if output.success() => {
                let value = output.stdout.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Ok(output) => {
                tracing::debug!(status = ?output.status.code(), "osascript failed");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "osascript did not run");
                None
            }
        }
    }
}

impl TerminalFocus for Iterm2Focus {
    fn preferred_tty(&self) -> Option<String> {
        self.run_script(PREFERRED_TTY_SCRIPT, &[])
    }

    fn select_session_by_tty(&self, tty: &str) -> bool {
        let tty = tty.trim();
        if tty.is_empty() {
            return false;
        }
        let base = Path::new(tty)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| tty.to_string());
        self.run_script(SELECT_BY_TTY_SCRIPT, &[tty, base.as_str()]).is_some()
    }

    fn activate(&self) -> bool {
        self.run_script(ACTIVATE_SCRIPT, &[]).is_some()
    }

    fn frontmost_app(&self) -> Option<String> {
        self.run_script(FRONTMOST_SCRIPT, &[])
    }
}

/// For hosts without a scriptable terminal.
#[derive(Debug, Clone, Default)]
pub struct NoFocus;

impl TerminalFocus for NoFocus {
    fn preferred_tty(&self) -> Option<String> {
        None
    }

    fn select_session_by_tty(&self, _tty: &str) -> bool {
        false
    }

    fn activate(&self) -> bool {
        false
    }

    fn frontmost_app(&self) -> Option<String> {
        None
    }
}

pub fn select_focus(timeout: Duration) -> Box<dyn TerminalFocus> {
    if cfg!(target_os = "macos") && is_executable(Path::new(OSASCRIPT_BIN)) {
        Box::new(Iterm2Focus::new(timeout))
    } else {
        Box::new(NoFocus)
    }
}

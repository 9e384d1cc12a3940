use std::collections::HashSet;

use crate::command::TmuxCli;
use crate::error::TmuxError;
use crate::types::{
    parse_clients, parse_window_memberships, TmuxClient, TmuxSession, WindowMembership,
    CLIENT_FORMAT, WINDOW_FORMAT,
};

/// Window option set on windows holding a finished turn.
pub const DONE_OPTION: &str = "@panehop_done";

/// Everything the handlers need from a terminal multiplexer.
///
/// Queries never fail: an unreachable server looks the same as an empty
/// one. Only [`Multiplexer::execute`] reports errors, since callers decide
/// whether a failed mutation matters.
pub trait Multiplexer {
    /// `display-message -p` with an optional target.
    fn display(&self, target: Option<&str>, format: &str) -> Option<String>;

    fn list_clients(&self) -> Vec<TmuxClient>;

    /// `None` when the pane listing itself failed, as opposed to a server
    /// that has no panes.
    fn list_pane_ids(&self) -> Option<HashSet<String>>;

    fn list_window_memberships(&self) -> Vec<WindowMembership>;

    /// Last `lines` lines of pane history.
    fn capture_pane(&self, pane_id: &str, lines: u32) -> Option<String>;

    fn execute(&self, args: &[String]) -> Result<(), TmuxError>;

    /// Shell form of `args` as [`Multiplexer::execute`] would run them.
    fn render(&self, args: &[String]) -> String;

    fn pane_exists(&self, pane_id: &str) -> bool {
        !pane_id.is_empty() && self.display(Some(pane_id), "#{pane_id}").is_some()
    }

    fn window_of_pane(&self, pane_id: &str) -> Option<String> {
        if pane_id.is_empty() {
            return None;
        }
        self.display(Some(pane_id), "#{window_id}")
    }

    /// Identifier of the running server instance.
    fn server_pid(&self) -> Option<String> {
        self.display(None, "#{pid}")
    }

    /// Sessions containing `window_id`, first occurrence order, no repeats.
    fn sessions_for_window(&self, window_id: &str) -> Vec<TmuxSession> {
        let mut seen = HashSet::new();
        self.list_window_memberships()
            .into_iter()
            .filter(|row| row.window_id == window_id)
            .map(|row| row.session)
            .filter(|session| seen.insert(session.id.clone()))
            .collect()
    }

    fn pane_focused_in_any_client(&self, pane_id: &str) -> bool {
        self.list_clients()
            .iter()
            .any(|client| client.is_focused() && client.pane_id.as_deref() == Some(pane_id))
    }

    fn pane_active_in_any_client(&self, pane_id: &str) -> bool {
        self.list_clients()
            .iter()
            .any(|client| client.pane_id.as_deref() == Some(pane_id))
    }

    /// Type `text` literally into the pane, then press Enter.
    fn send_literal_line(&self, pane_id: &str, text: &str) -> Result<(), TmuxError> {
        self.execute(&send_literal_args(pane_id, text))?;
        self.execute(&send_enter_args(pane_id))
    }

    fn mark_window_done(&self, window_id: &str) -> Result<(), TmuxError> {
        self.execute(&[
            "set-option".to_string(),
            "-w".to_string(),
            "-t".to_string(),
            window_id.to_string(),
            DONE_OPTION.to_string(),
            "1".to_string(),
        ])
    }
}

pub fn send_literal_args(pane_id: &str, text: &str) -> Vec<String> {
    vec![
        "send-keys".to_string(),
        "-t".to_string(),
        pane_id.to_string(),
        "-l".to_string(),
        "--".to_string(),
        text.to_string(),
    ]
}

pub fn send_enter_args(pane_id: &str) -> Vec<String> {
    vec![
        "send-keys".to_string(),
        "-t".to_string(),
        pane_id.to_string(),
        "Enter".to_string(),
    ]
}

impl Multiplexer for TmuxCli {
    fn display(&self, target: Option<&str>, format: &str) -> Option<String> {
        let mut args = vec!["display-message", "-p"];
        if let Some(target) = target {
            args.extend(["-t", target]);
        }
        args.push(format);
        match self.capture(&args) {
            Ok(value) => Some(value.trim().to_string()),
            Err(err) => {
                tracing::debug!(error = %err, format, "tmux display failed");
                None
            }
        }
    }

    fn list_clients(&self) -> Vec<TmuxClient> {
        match self.capture(&["list-clients", "-F", CLIENT_FORMAT]) {
            Ok(raw) => parse_clients(&raw),
            Err(err) => {
                tracing::debug!(error = %err, "tmux list-clients failed");
                Vec::new()
            }
        }
    }

    fn list_pane_ids(&self) -> Option<HashSet<String>> {
        match self.capture(&["list-panes", "-a", "-F", "#{pane_id}"]) {
            Ok(raw) => Some(
                raw.lines()
                    .map(str::trim)
                    .filter(|pane| !pane.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Err(err) => {
                tracing::debug!(error = %err, "tmux list-panes failed");
                None
            }
        }
    }

    fn list_window_memberships(&self) -> Vec<WindowMembership> {
        match self.capture(&["list-windows", "-a", "-F", WINDOW_FORMAT]) {
            Ok(raw) => parse_window_memberships(&raw),
            Err(err) => {
                tracing::debug!(error = %err, "tmux list-windows failed");
                Vec::new()
            }
        }
    }

    fn capture_pane(&self, pane_id: &str, lines: u32) -> Option<String> {
        let start = format!("-{lines}");
        self.capture(&["capture-pane", "-p", "-t", pane_id, "-S", start.as_str()])
            .ok()
    }

    fn execute(&self, args: &[String]) -> Result<(), TmuxError> {
        self.run(args)
    }

    fn render(&self, args: &[String]) -> String {
        TmuxCli::render(self, args)
    }
}

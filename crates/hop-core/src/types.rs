use serde::{Deserialize, Serialize};

/// Persisted record of the last completed turn observed in a pane.
///
/// Written by the turn-complete handler, read back only by marker garbage
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMarker {
    pub thread_id: String,
    pub turn_id: String,
    pub cwd: String,
    pub title: String,
    pub message: String,
    pub server_instance_id: String,
    pub pane_id: String,
    pub window_id: String,
    /// Unix seconds.
    pub created_at: i64,
}

/// Per-thread autorun budget.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutorunState {
    #[serde(default)]
    pub remaining: Option<i64>,
    #[serde(default)]
    pub last_turn_id: Option<String>,
}

impl AutorunState {
    pub fn settled(remaining: i64, turn_id: &str) -> Self {
        Self {
            remaining: Some(remaining.max(0)),
            last_turn_id: Some(turn_id.to_string()),
        }
    }

    pub fn handled_turn(&self, turn_id: &str) -> bool {
        self.last_turn_id.as_deref() == Some(turn_id)
    }
}

/// Partial hints describing where a notification came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locator {
    pub client_name: Option<String>,
    pub client_tty: Option<String>,
    /// tty of the session the terminal application currently prefers, if it
    /// reported one.
    pub terminal_tty: Option<String>,
    pub session_id: Option<String>,
    pub session_name: Option<String>,
    pub window_id: Option<String>,
    pub window_name: Option<String>,
    pub pane_id: Option<String>,
}

impl Locator {
    /// Trim every hint and drop the empty ones.
    pub fn normalized(self) -> Self {
        Self {
            client_name: non_empty(self.client_name),
            client_tty: non_empty(self.client_tty),
            terminal_tty: non_empty(self.terminal_tty),
            session_id: non_empty(self.session_id),
            session_name: non_empty(self.session_name),
            window_id: non_empty(self.window_id),
            window_name: non_empty(self.window_name),
            pane_id: non_empty(self.pane_id),
        }
    }

    /// Human readable description of the original target, for diagnostics.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(session) = self.session_name.as_ref().or(self.session_id.as_ref()) {
            parts.push(format!("session={session}"));
        }
        if let Some(window) = self.window_name.as_ref().or(self.window_id.as_ref()) {
            parts.push(format!("window={window}"));
        }
        if let Some(pane) = &self.pane_id {
            parts.push(format!("pane={pane}"));
        }
        if parts.is_empty() {
            "unknown".to_string()
        } else {
            parts.join(" ")
        }
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

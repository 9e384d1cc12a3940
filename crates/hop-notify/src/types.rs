use serde::{Deserialize, Serialize};

/// One desktop notification, ready to hand to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopNotification {
    pub title: String,
    pub message: String,
    /// Replaces any earlier notification carrying the same group.
    pub group: Option<String>,
    /// Application bundle brought forward on click.
    pub activate: Option<String>,
    /// Shell command run on click.
    pub on_click: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSinkKind {
    TerminalNotifier,
    Osascript,
    Log,
}

//! Build notification content from a completed turn.

use hop_core::{NotificationEvent, NotifyConfig};

use crate::types::DesktopNotification;

const FALLBACK_BODY: &str = "Turn complete";

/// Map a turn-complete event to a notification.
///
/// `label` is the `project@branch` suffix for the title and `pane_id` the
/// originating pane, if known. The click command is attached later by the
/// caller since it depends on live tmux state.
pub fn notification_for_event(
    event: &NotificationEvent,
    label: Option<&str>,
    pane_id: Option<&str>,
    config: &NotifyConfig,
) -> DesktopNotification {
    let activate = config.activate_bundle_id.trim();
    DesktopNotification {
        title: notification_title(&config.app_title, label),
        message: notification_body(event, config.max_message_chars),
        group: Some(notification_group(pane_id, event.thread_id.as_deref())),
        activate: (!activate.is_empty()).then(|| activate.to_string()),
        on_click: None,
    }
}

pub fn notification_title(app_title: &str, label: Option<&str>) -> String {
    match label.map(str::trim).filter(|label| !label.is_empty()) {
        Some(label) => format!("{app_title} ({label})"),
        None => app_title.to_string(),
    }
}

/// Last assistant message, else the input messages, else a fixed line.
pub fn notification_body(event: &NotificationEvent, limit: usize) -> String {
    let mut body = event
        .last_assistant_message
        .as_deref()
        .map(normalize_whitespace)
        .unwrap_or_default();
    if body.is_empty() {
        body = normalize_whitespace(&event.input_messages.join(" "));
    }
    if body.is_empty() {
        body = FALLBACK_BODY.to_string();
    }
    truncate(&body, limit)
}

/// `codex-pane-<n>` for pane `%n`, else `codex-<thread>`, else `codex`.
pub fn notification_group(pane_id: Option<&str>, thread_id: Option<&str>) -> String {
    let pane = pane_id.map(str::trim).unwrap_or("");
    let pane = pane.strip_prefix('%').unwrap_or(pane);
    if !pane.is_empty() {
        return format!("codex-pane-{pane}");
    }
    match thread_id.filter(|thread| !thread.is_empty()) {
        Some(thread) => format!("codex-{thread}"),
        None => "codex".to_string(),
    }
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> String {
    if limit == 0 {
        return String::new();
    }
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_whitespace, notification_body, notification_for_event, notification_group,
        notification_title, truncate,
    };
    use hop_core::{NotificationEvent, NotifyConfig};
    use pretty_assertions::assert_eq;

    fn event(raw: &str) -> NotificationEvent {
        NotificationEvent::parse(raw).expect("parse event")
    }

    #[test]
    fn title_includes_label_when_present() {
        assert_eq!(notification_title("Codex", Some("repo@feat")), "Codex (repo@feat)");
        assert_eq!(notification_title("Codex", Some(" ")), "Codex");
        assert_eq!(notification_title("Codex", None), "Codex");
    }

    #[test]
    fn body_prefers_assistant_message_then_inputs() {
        let with_message = event(
            r#"{"type":"agent-turn-complete","last-assistant-message":"  All\n\tdone.  "}"#,
        );
        assert_eq!(notification_body(&with_message, 220), "All done.");

        let with_inputs = event(
            r#"{"type":"agent-turn-complete","last-assistant-message":" ","input-messages":["fix","the  bug"]}"#,
        );
        assert_eq!(notification_body(&with_inputs, 220), "fix the bug");

        let bare = event(r#"{"type":"agent-turn-complete"}"#);
        assert_eq!(notification_body(&bare, 220), "Turn complete");
    }

    #[test]
    fn truncation_counts_characters_and_appends_ellipsis() {
        assert_eq!(truncate("abcdef", 6), "abcdef");
        assert_eq!(truncate("abcdefg", 6), "abc...");
        assert_eq!(truncate("日本語テキスト", 5), "日本...");
        assert_eq!(truncate("abcdef", 2), "...");
        assert_eq!(truncate("abc", 0), "");

        let long = "x".repeat(300);
        let cut = truncate(&long, 220);
        assert_eq!(cut.chars().count(), 220);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn group_prefers_pane_then_thread() {
        assert_eq!(notification_group(Some("%12"), Some("t1")), "codex-pane-12");
        assert_eq!(notification_group(Some(""), Some("t1")), "codex-t1");
        assert_eq!(notification_group(None, Some("")), "codex");
    }

    #[test]
    fn maps_event_with_config_defaults() {
        let event = event(
            r#"{"type":"agent-turn-complete","thread-id":"t1","last-assistant-message":"Done."}"#,
        );
        let notification =
            notification_for_event(&event, Some("repo"), Some("%3"), &NotifyConfig::default());
        assert_eq!(notification.title, "Codex (repo)");
        assert_eq!(notification.message, "Done.");
        assert_eq!(notification.group.as_deref(), Some("codex-pane-3"));
        assert_eq!(notification.activate.as_deref(), Some("com.googlecode.iterm2"));
        assert_eq!(notification.on_click, None);
    }

    #[test]
    fn whitespace_normalization_collapses_runs() {
        assert_eq!(normalize_whitespace(" a \n\n b\tc "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }
}

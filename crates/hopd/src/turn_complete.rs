//! Built-in handler for `agent-turn-complete`: record the pane, tidy old
//! markers, and post a notification that jumps back to the pane on click.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use hop_core::{is_executable, shell_join, HopConfig, NotificationEvent, TerminalContext, TurnMarker};
use hop_git::{GitCli, RepoLabel};
use hop_notify::{notification_for_event, DesktopNotification, NotificationSink, NotificationSinkKind};
use hop_tmux::Multiplexer;

use crate::focus::TerminalFocus;
use crate::marker_store::{GcReport, MarkerStore, MarkerWrite};

pub const ON_CLICK_BIN: &str = "panehop-on-click";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCompleteReport {
    pub notification: DesktopNotification,
    pub marker: Option<MarkerWrite>,
    pub gc: Option<GcReport>,
    pub delivered: bool,
    pub removal_scheduled: bool,
}

pub struct TurnComplete<'a, M: ?Sized> {
    config: &'a HopConfig,
    context: &'a TerminalContext,
    sink: &'a dyn NotificationSink,
    focus: &'a dyn TerminalFocus,
    git: GitCli,
    mux: Option<&'a M>,
    tmux_bin: Option<PathBuf>,
    on_click_bin: Option<PathBuf>,
}

impl<'a, M: Multiplexer + ?Sized> TurnComplete<'a, M> {
    pub fn new(
        config: &'a HopConfig,
        context: &'a TerminalContext,
        sink: &'a dyn NotificationSink,
        focus: &'a dyn TerminalFocus,
    ) -> Self {
        Self {
            config,
            context,
            sink,
            focus,
            git: GitCli::default().with_timeout(config.notify.git_timeout()),
            mux: None,
            tmux_bin: None,
            on_click_bin: None,
        }
    }

    /// Without tmux there is no marker, no GC, and no click command.
    pub fn with_tmux(mut self, mux: &'a M, binary: PathBuf) -> Self {
        self.mux = Some(mux);
        self.tmux_bin = Some(binary);
        self
    }

    pub fn with_on_click_bin(mut self, path: PathBuf) -> Self {
        self.on_click_bin = Some(path);
        self
    }

    pub fn with_git(mut self, git: GitCli) -> Self {
        self.git = git;
        self
    }

    /// `None` for any event other than a completed turn.
    pub fn handle(&self, event: &NotificationEvent, now: SystemTime) -> Option<TurnCompleteReport> {
        if !event.is_turn_complete() {
            return None;
        }
        let cwd = event.cwd.as_deref().unwrap_or("");
        let pane_id = self.context.pane_id.as_deref();

        let label = RepoLabel::detect(&self.git, Path::new(cwd)).suffix();
        let mut notification =
            notification_for_event(event, label.as_deref(), pane_id, &self.config.notify);

        let store = MarkerStore::from_config(&self.config.markers);
        let mut marker = None;
        let mut gc = None;
        if let Some(mux) = self.mux {
            if let Some(pane_id) = pane_id {
                let record = TurnMarker {
                    thread_id: event.thread_id.clone().unwrap_or_default(),
                    turn_id: event.turn_key().to_string(),
                    cwd: cwd.to_string(),
                    title: notification.title.clone(),
                    message: notification.message.clone(),
                    server_instance_id: mux.server_pid().unwrap_or_default(),
                    pane_id: pane_id.to_string(),
                    window_id: mux.window_of_pane(pane_id).unwrap_or_default(),
                    created_at: DateTime::<Utc>::from(now).timestamp(),
                };
                marker = match store.write(mux, &record) {
                    Ok(written) => Some(written),
                    Err(err) => {
                        tracing::warn!(pane_id, error = %err, "failed to write turn marker");
                        None
                    }
                };
            }

            let server = mux.server_pid().unwrap_or_default();
            gc = match store.collect_garbage(mux, &server, now) {
                Ok(report) => Some(report),
                Err(err) => {
                    tracing::warn!(error = %err, "marker collection failed");
                    None
                }
            };
        }

        notification.on_click = self.click_command(&notification.title, cwd);
        let delivered = match self.sink.send(&notification) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(sink = ?self.sink.kind(), error = %err, "notification not delivered");
                false
            }
        };
        let removal_scheduled = delivered && self.maybe_schedule_removal(&notification);

        Some(TurnCompleteReport {
            notification,
            marker,
            gc,
            delivered,
            removal_scheduled,
        })
    }

    /// Shell command that runs the click resolver with everything tmux
    /// knows about this pane right now.
    pub fn click_command(&self, title: &str, cwd: &str) -> Option<String> {
        if let Some(command) = self
            .config
            .notify
            .on_click_override
            .as_deref()
            .map(str::trim)
            .filter(|command| !command.is_empty())
        {
            return Some(command.to_string());
        }
        if !self.context.inside_tmux() {
            return None;
        }
        let mux = self.mux?;
        let tmux_bin = self.tmux_bin.as_ref()?;
        let on_click = self.on_click_bin.as_ref().filter(|path| is_executable(path))?;
        let pane_id = self
            .context
            .pane_id
            .clone()
            .or_else(|| mux.display(None, "#{pane_id}"))?;

        let mut argv = vec![
            on_click.to_string_lossy().into_owned(),
            "--tmux-bin".to_string(),
            tmux_bin.to_string_lossy().into_owned(),
        ];
        let mut push = |flag: &str, value: Option<String>| {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                argv.push(flag.to_string());
                argv.push(value);
            }
        };
        push("--client", mux.display(None, "#{client_name}"));
        push("--client-tty", mux.display(None, "#{client_tty}"));
        push("--tmux-socket", self.context.socket.clone());
        push("--session-id", mux.display(Some(&pane_id), "#{session_id}"));
        push("--session-name", mux.display(Some(&pane_id), "#{session_name}"));
        push("--window-id", mux.display(Some(&pane_id), "#{window_id}"));
        push("--window-name", mux.display(Some(&pane_id), "#{window_name}"));
        push("--pane-id", Some(pane_id.clone()));
        push("--cwd", Some(cwd.to_string()));
        push("--notification-title", Some(title.to_string()));

        Some(shell_join(&argv))
    }

    /// Withdraw the notification shortly if the user is already looking at
    /// the pane: terminal frontmost, a single client, pane active in it.
    fn maybe_schedule_removal(&self, notification: &DesktopNotification) -> bool {
        let notify = &self.config.notify;
        if !notify.auto_remove_if_visible
            || self.sink.kind() != NotificationSinkKind::TerminalNotifier
        {
            return false;
        }
        let Some(group) = notification.group.as_deref().filter(|group| !group.is_empty()) else {
            return false;
        };
        if self.focus.frontmost_app().as_deref() != Some(notify.activate_bundle_id.as_str()) {
            return false;
        }
        let (Some(mux), Some(pane_id)) = (self.mux, self.context.pane_id.as_deref()) else {
            return false;
        };
        if mux.list_clients().len() != 1 || !mux.pane_active_in_any_client(pane_id) {
            return false;
        }
        match self.sink.schedule_removal(group, notify.auto_remove_delay()) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(group, error = %err, "could not schedule removal");
                false
            }
        }
    }
}

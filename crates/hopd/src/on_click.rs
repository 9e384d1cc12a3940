//! Notification click: find the pane the notification came from and move
//! the user's terminal there.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use hop_core::{non_empty, Locator};
use hop_notify::Hud;
use hop_tmux::Multiplexer;

use crate::focus::TerminalFocus;
use crate::resolver::{resolve, CommitReport, ResolvedTarget};

/// Hints recorded by the click command when the notification was posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "panehop-on-click", disable_help_flag = true, disable_version_flag = true)]
pub struct OnClickArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub tmux_bin: Option<PathBuf>,
    #[arg(long, allow_hyphen_values = true)]
    pub tmux_socket: Option<PathBuf>,
    #[arg(long, allow_hyphen_values = true)]
    pub client: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub client_tty: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub session_id: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub session_name: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub window_id: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub window_name: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub pane_id: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub cwd: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub notification_title: Option<String>,
    /// Print the tmux commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,
}

impl OnClickArgs {
    /// Parse `argv` (program name first), dropping anything unrecognized.
    /// Never fails: a click must not be lost to a stray flag.
    pub fn parse_lenient<I, T>(argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let command = Self::command();
        let known: HashMap<String, bool> = command
            .get_arguments()
            .filter_map(|arg| {
                arg.get_long()
                    .map(|long| (format!("--{long}"), arg.get_action().takes_values()))
            })
            .collect();

        let mut argv = argv.into_iter().map(Into::into);
        let mut kept = vec![argv
            .next()
            .unwrap_or_else(|| "panehop-on-click".to_string())];
        while let Some(arg) = argv.next() {
            let (flag, inline_value) = match arg.split_once('=') {
                Some((flag, _)) => (flag.to_string(), true),
                None => (arg.clone(), false),
            };
            match known.get(&flag) {
                Some(true) if !inline_value => {
                    if let Some(value) = argv.next() {
                        kept.push(arg);
                        kept.push(value);
                    }
                }
                Some(_) => kept.push(arg),
                None => tracing::debug!(arg, "ignoring unknown argument"),
            }
        }

        Self::try_parse_from(kept).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "unusable on-click arguments");
            Self::default()
        })
    }

    pub fn to_locator(&self, terminal_tty: Option<String>) -> Locator {
        Locator {
            client_name: self.client.clone(),
            client_tty: self.client_tty.clone(),
            terminal_tty,
            session_id: self.session_id.clone(),
            session_name: self.session_name.clone(),
            window_id: self.window_id.clone(),
            window_name: self.window_name.clone(),
            pane_id: self.pane_id.clone(),
        }
        .normalized()
    }

    pub fn requested_tty(&self) -> Option<String> {
        non_empty(self.client_tty.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Resolution failed; `reason` was shown on the HUD.
    Unresolved { reason: String },
    /// Shell form of the commands that would have run.
    DryRun { commands: Vec<String> },
    Committed {
        target: ResolvedTarget,
        report: CommitReport,
        /// Whether the terminal selected the client's session afterwards.
        focused: bool,
    },
}

pub struct OnClick<'a, M: ?Sized> {
    mux: &'a M,
    focus: &'a dyn TerminalFocus,
    hud: &'a dyn Hud,
    app_title: &'a str,
}

impl<'a, M: Multiplexer + ?Sized> OnClick<'a, M> {
    pub fn new(
        mux: &'a M,
        focus: &'a dyn TerminalFocus,
        hud: &'a dyn Hud,
        app_title: &'a str,
    ) -> Self {
        Self {
            mux,
            focus,
            hud,
            app_title,
        }
    }

    pub fn run(&self, args: &OnClickArgs) -> ClickOutcome {
        let requested_tty = args.requested_tty();
        let terminal_tty = match requested_tty.as_deref() {
            Some(tty) if self.focus.select_session_by_tty(tty) => Some(tty.to_string()),
            _ => self.focus.preferred_tty(),
        };
        let locator = args.to_locator(terminal_tty.clone());
        tracing::info!(
            client = locator.client_name.as_deref().unwrap_or(""),
            client_tty = requested_tty.as_deref().unwrap_or(""),
            terminal_tty = terminal_tty.as_deref().unwrap_or(""),
            target = %locator.describe(),
            "click received"
        );

        let target = match resolve(self.mux, &locator) {
            Ok(target) => target,
            Err(failure) => {
                let reason = failure.describe();
                tracing::warn!(reason = %failure, "click target not resolved");
                self.show_hud(args, &reason);
                return ClickOutcome::Unresolved { reason };
            }
        };
        tracing::info!(
            client = %target.client,
            session = %target.session,
            window_id = %target.window_id,
            pane_id = target.pane_id.as_deref().unwrap_or(""),
            "click target resolved"
        );

        let commands = target.commands();
        let rendered: Vec<String> = commands
            .iter()
            .map(|command| self.mux.render(command))
            .collect();
        tracing::info!(commands = %rendered.join(" ; "), "switching");
        if args.dry_run {
            return ClickOutcome::DryRun { commands: rendered };
        }

        let report = target.commit(self.mux);
        if !report.succeeded() {
            tracing::warn!(failed = %report.failures.join("; "), "click commands failed");
            let body = format!(
                "tmux commands failed\ntarget: {}\nfailed: {}",
                locator.describe(),
                report.failures.join("; ")
            );
            self.show_hud(args, &body);
            return ClickOutcome::Committed {
                target,
                report,
                focused: false,
            };
        }

        let focused = self.follow_up(args, &target, requested_tty, terminal_tty);
        ClickOutcome::Committed {
            target,
            report,
            focused,
        }
    }

    /// Ask the terminal to show the session attached to the switched
    /// client, else report it on the HUD and just bring the terminal forward.
    fn follow_up(
        &self,
        args: &OnClickArgs,
        target: &ResolvedTarget,
        requested_tty: Option<String>,
        terminal_tty: Option<String>,
    ) -> bool {
        let focus_tty = non_empty(target.client.tty.clone())
            .or(requested_tty)
            .or_else(|| non_empty(terminal_tty));
        if let Some(tty) = focus_tty.as_deref() {
            if self.focus.select_session_by_tty(tty) {
                tracing::info!(tty, "terminal session selected");
                return true;
            }
        }
        let tty = focus_tty.as_deref().unwrap_or("none");
        tracing::info!(tty, "terminal session not found");
        self.show_hud(args, &format!("could not focus terminal session\ntty: {tty}"));
        self.focus.activate();
        false
    }

    fn show_hud(&self, args: &OnClickArgs, body: &str) {
        show_hud(self.hud, args, self.app_title, body);
    }
}

/// Tell the user the click could not be followed.
pub fn show_hud(hud: &dyn Hud, args: &OnClickArgs, app_title: &str, body: &str) {
    let title = non_empty(args.notification_title.clone()).unwrap_or_else(|| app_title.to_string());
    if let Err(err) = hud.show(&title, body, args.requested_tty().as_deref()) {
        tracing::warn!(error = %err, "HUD failed");
    }
}

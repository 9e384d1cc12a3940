//! Budgeted follow-up commands requested by the agent itself.
//!
//! A turn may end with a line such as `[tmux] cargo test remaining=2`. The
//! text after the tag is typed into the originating pane, at most once per
//! turn and at most `remaining` times per thread.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use hop_core::{
    read_json, slugify, write_json_atomic, AutorunConfig, AutorunState, NotificationEvent,
    StoreError,
};
use hop_tmux::Multiplexer;
use regex_lite::Regex;

use crate::error::AutorunError;

static REMAINING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bremaining\s*=\s*(\d+)\b").unwrap_or_else(|_| std::process::abort())
});
static RESET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\breset\s*=\s*1\b").unwrap_or_else(|_| std::process::abort()));

/// Decides from captured pane text whether the agent is waiting for input.
pub trait IdlePredicate {
    fn is_idle(&self, capture: &str) -> bool;
}

/// Idle when the prompt marker is visible and no busy hint is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptIdle {
    pub prompt_marker: String,
    pub busy_hints: Vec<String>,
}

impl PromptIdle {
    pub fn from_config(config: &AutorunConfig) -> Self {
        Self {
            prompt_marker: config.prompt_marker.clone(),
            busy_hints: config.busy_hints.clone(),
        }
    }
}

impl IdlePredicate for PromptIdle {
    fn is_idle(&self, capture: &str) -> bool {
        if capture.is_empty() {
            return false;
        }
        if self
            .busy_hints
            .iter()
            .any(|hint| !hint.is_empty() && capture.contains(hint.as_str()))
        {
            return false;
        }
        capture.contains(self.prompt_marker.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Text typed into the pane: the line minus tag and control tokens.
    pub keys: String,
    pub remaining: Option<i64>,
    pub reset: bool,
}

/// Last line within the final `scan_lines` lines that starts with `tag` and
/// carries more than the tag. Lines inside fenced code blocks never count.
pub fn extract_directive(message: &str, tag: &str, scan_lines: usize) -> Option<String> {
    let lines: Vec<&str> = message.lines().collect();
    let mut in_fence = false;
    let fenced: Vec<bool> = lines
        .iter()
        .map(|line| {
            if line.trim().starts_with("```") {
                in_fence = !in_fence;
                true
            } else {
                in_fence
            }
        })
        .collect();

    let start = lines.len().saturating_sub(scan_lines);
    (start..lines.len())
        .rev()
        .filter(|&index| !fenced[index])
        .map(|index| lines[index].trim())
        .find(|line| line.starts_with(tag) && *line != tag)
        .map(str::to_string)
}

pub fn parse_directive(line: &str, tag: &str) -> Directive {
    let remaining = REMAINING_TOKEN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|value| value.as_str().parse::<i64>().ok());
    let reset = RESET_TOKEN.is_match(line);

    let body = line.trim().strip_prefix(tag).unwrap_or(line);
    let body = REMAINING_TOKEN.replace_all(body, "");
    let body = RESET_TOKEN.replace_all(&body, "");
    Directive {
        keys: body.trim().to_string(),
        remaining,
        reset,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutorunOutcome {
    NotTurnComplete,
    NoDirective,
    PaneMissing,
    /// This turn already triggered (or was refused) an autorun.
    AlreadyHandled,
    Exhausted,
    /// Idleness was required and never observed.
    NotIdle,
    DryRun { keys: String, remaining: i64 },
    Sent { keys: String, remaining: i64 },
}

pub struct Autorun<'a, M: ?Sized> {
    mux: &'a M,
    config: &'a AutorunConfig,
    idle: Box<dyn IdlePredicate + 'a>,
    sleep: fn(Duration),
}

impl<'a, M: Multiplexer + ?Sized> Autorun<'a, M> {
    pub fn new(mux: &'a M, config: &'a AutorunConfig) -> Self {
        Self {
            mux,
            config,
            idle: Box::new(PromptIdle::from_config(config)),
            sleep: std::thread::sleep,
        }
    }

    pub fn with_idle(mut self, idle: Box<dyn IdlePredicate + 'a>) -> Self {
        self.idle = idle;
        self
    }

    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn state_path(&self, thread_key: &str) -> PathBuf {
        self.config
            .state_dir
            .join(format!("{}.json", slugify(thread_key)))
    }

    pub fn process(
        &self,
        event: &NotificationEvent,
        pane_id: &str,
    ) -> Result<AutorunOutcome, AutorunError> {
        if !event.is_turn_complete() {
            return Ok(AutorunOutcome::NotTurnComplete);
        }
        let tag = self.config.directive_tag.as_str();
        let Some(line) = event
            .last_assistant_message
            .as_deref()
            .and_then(|message| extract_directive(message, tag, self.config.scan_lines))
        else {
            return Ok(AutorunOutcome::NoDirective);
        };
        let directive = parse_directive(&line, tag);
        if directive.keys.is_empty() {
            return Ok(AutorunOutcome::NoDirective);
        }
        if !self.mux.pane_exists(pane_id) {
            return Ok(AutorunOutcome::PaneMissing);
        }

        let thread = event.thread_key();
        let turn = event.turn_key();
        let path = self.state_path(thread);
        let state = self.load_state(&path)?;
        if state.handled_turn(turn) {
            return Ok(AutorunOutcome::AlreadyHandled);
        }

        let remaining = match (directive.reset, directive.remaining, state.remaining) {
            (true, Some(requested), _) => requested,
            (_, requested, None) => requested.unwrap_or(self.config.default_remaining),
            (_, _, Some(stored)) => stored,
        };
        if remaining <= 0 {
            write_json_atomic(&path, &AutorunState::settled(0, turn))?;
            tracing::info!(thread_id = thread, "autorun budget exhausted");
            return Ok(AutorunOutcome::Exhausted);
        }

        if !self.wait_for_idle(pane_id) {
            if self.config.require_idle {
                tracing::info!(pane_id, "pane never looked idle, skipping autorun");
                return Ok(AutorunOutcome::NotIdle);
            }
            tracing::debug!(pane_id, "pane not confirmed idle, sending anyway");
        }

        let remaining = remaining - 1;
        if self.config.dry_run {
            write_json_atomic(&path, &AutorunState::settled(remaining, turn))?;
            tracing::info!(pane_id, keys = %directive.keys, "autorun dry run");
            return Ok(AutorunOutcome::DryRun {
                keys: directive.keys,
                remaining,
            });
        }

        self.mux
            .send_literal_line(pane_id, &directive.keys)
            .map_err(|source| AutorunError::Inject {
                pane_id: pane_id.to_string(),
                source,
            })?;
        write_json_atomic(&path, &AutorunState::settled(remaining, turn))?;
        tracing::info!(pane_id, thread_id = thread, remaining, "autorun sent");
        Ok(AutorunOutcome::Sent {
            keys: directive.keys,
            remaining,
        })
    }

    fn load_state(&self, path: &Path) -> Result<AutorunState, AutorunError> {
        match read_json::<AutorunState>(path) {
            Ok(state) => Ok(state.unwrap_or_default()),
            Err(err @ StoreError::Parse { .. }) => {
                tracing::warn!(error = %err, "discarding unreadable autorun state");
                Ok(AutorunState::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Poll the pane until it looks idle, sleeping between attempts only.
    fn wait_for_idle(&self, pane_id: &str) -> bool {
        let attempts = self.config.prompt_check_attempts();
        for attempt in 1..=attempts {
            let idle = self
                .mux
                .capture_pane(pane_id, self.config.capture_lines)
                .is_some_and(|capture| self.idle.is_idle(&capture));
            if idle {
                return true;
            }
            if attempt < attempts {
                (self.sleep)(self.config.prompt_check_delay());
            }
        }
        false
    }
}

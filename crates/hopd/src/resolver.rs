//! Turn the hints carried by a notification click into one live pane.
//!
//! Every step re-queries the multiplexer. Hints recorded when the
//! notification was created are only used to choose between live
//! candidates, never trusted on their own.

use std::fmt;

use hop_core::{shell_join, Locator};
use hop_tmux::{tty_matches, Multiplexer, TmuxClient, TmuxSession};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("no matching tmux client")]
    NoClient { candidates: Vec<TmuxClient> },
    #[error("missing window/pane information")]
    MissingWindow,
    #[error("window {window_id} is not in any session")]
    NoSessionForWindow { window_id: String },
    #[error("window {window_id} belongs to several sessions and the original one is unknown")]
    AmbiguousSession {
        window_id: String,
        candidates: Vec<TmuxSession>,
    },
}

impl ResolutionFailure {
    /// Reason plus the candidates considered, for the HUD.
    pub fn describe(&self) -> String {
        match self {
            Self::NoClient { candidates } => format!("{self}\nattached: {}", list(candidates)),
            Self::AmbiguousSession { candidates, .. } => {
                format!("{self}\ncandidates: {}", list(candidates))
            }
            Self::NoSessionForWindow { .. } => format!("{self}\ncandidates: none"),
            Self::MissingWindow => self.to_string(),
        }
    }
}

fn list<T: fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub client: TmuxClient,
    pub session: TmuxSession,
    pub window_id: String,
    /// Only set when the hinted pane still exists.
    pub pane_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub attempted: usize,
    /// Shell form of every command that failed.
    pub failures: Vec<String>,
}

impl CommitReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

impl ResolvedTarget {
    pub fn commands(&self) -> Vec<Vec<String>> {
        let mut commands = vec![
            vec![
                "switch-client".to_string(),
                "-c".to_string(),
                self.client.name.clone(),
                "-t".to_string(),
                self.session.id.clone(),
            ],
            vec![
                "select-window".to_string(),
                "-t".to_string(),
                format!("{}:{}", self.session.id, self.window_id),
            ],
        ];
        if let Some(pane_id) = &self.pane_id {
            commands.push(vec![
                "select-pane".to_string(),
                "-t".to_string(),
                pane_id.clone(),
            ]);
        }
        commands
    }

    /// Run every command, even after a failure, and record which failed.
    pub fn commit<M: Multiplexer + ?Sized>(&self, mux: &M) -> CommitReport {
        let mut report = CommitReport::default();
        for command in self.commands() {
            report.attempted += 1;
            if let Err(err) = mux.execute(&command) {
                tracing::warn!(command = %mux.render(&command), error = %err, "tmux command failed");
                report.failures.push(shell_join(&command));
            }
        }
        report
    }
}

/// Client named by the hints, in order: the tty the terminal application
/// reports, the client name, the client tty. With no usable hint a lone
/// attached client is chosen.
pub fn resolve_client(clients: &[TmuxClient], locator: &Locator) -> Option<TmuxClient> {
    let by_tty = |tty: &str| {
        clients
            .iter()
            .find(|client| client.tty_matches(tty) || tty_matches(&client.name, tty))
    };

    locator
        .terminal_tty
        .as_deref()
        .and_then(by_tty)
        .or_else(|| {
            locator.client_name.as_deref().and_then(|name| {
                clients
                    .iter()
                    .find(|client| client.matches_name_hint(name))
            })
        })
        .or_else(|| locator.client_tty.as_deref().and_then(by_tty))
        .or_else(|| match clients {
            [only] => Some(only),
            _ => None,
        })
        .cloned()
}

/// Session hint by id, then by name, then the only candidate.
pub fn choose_session(
    window_id: &str,
    candidates: Vec<TmuxSession>,
    session_id: Option<&str>,
    session_name: Option<&str>,
) -> Result<TmuxSession, ResolutionFailure> {
    if let Some(session) = session_id.and_then(|id| candidates.iter().find(|s| s.id == id)) {
        return Ok(session.clone());
    }
    if let Some(session) = session_name.and_then(|name| candidates.iter().find(|s| s.name == name))
    {
        return Ok(session.clone());
    }
    let mut candidates = candidates;
    match candidates.len() {
        0 => Err(ResolutionFailure::NoSessionForWindow {
            window_id: window_id.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(ResolutionFailure::AmbiguousSession {
            window_id: window_id.to_string(),
            candidates,
        }),
    }
}

pub fn resolve<M: Multiplexer + ?Sized>(
    mux: &M,
    locator: &Locator,
) -> Result<ResolvedTarget, ResolutionFailure> {
    let locator = locator.clone().normalized();

    let clients = mux.list_clients();
    let client = resolve_client(&clients, &locator)
        .ok_or(ResolutionFailure::NoClient { candidates: clients })?;

    let pane_id = match locator.pane_id {
        Some(pane) if mux.pane_exists(&pane) => Some(pane),
        Some(pane) => {
            tracing::info!(pane_id = %pane, "hinted pane is gone");
            None
        }
        None => None,
    };

    let window_id = pane_id
        .as_deref()
        .and_then(|pane| mux.window_of_pane(pane))
        .or(locator.window_id)
        .ok_or(ResolutionFailure::MissingWindow)?;

    let session = choose_session(
        &window_id,
        mux.sessions_for_window(&window_id),
        locator.session_id.as_deref(),
        locator.session_name.as_deref(),
    )?;

    Ok(ResolvedTarget {
        client,
        session,
        window_id,
        pane_id,
    })
}

use std::fmt;

/// One attached tmux client, as reported by `list-clients`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxClient {
    pub name: String,
    pub tty: Option<String>,
    pub flags: Vec<String>,
    /// Active pane of the client's current window.
    pub pane_id: Option<String>,
}

impl TmuxClient {
    pub fn new(name: impl Into<String>, tty: Option<&str>) -> Self {
        Self {
            name: name.into(),
            tty: tty.map(str::to_string),
            flags: Vec::new(),
            pane_id: None,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.flags.iter().any(|flag| flag == "focused")
    }

    /// True when `hint` names this client, either directly or via its tty.
    pub fn matches_name_hint(&self, hint: &str) -> bool {
        self.name == hint || tty_matches(&self.name, hint) || self.tty_matches(hint)
    }

    pub fn tty_matches(&self, hint: &str) -> bool {
        self.tty
            .as_deref()
            .is_some_and(|tty| tty_matches(tty, hint))
    }
}

impl fmt::Display for TmuxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tty {
            Some(tty) => write!(f, "{}({tty})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TmuxSession {
    pub id: String,
    pub name: String,
}

impl fmt::Display for TmuxSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// A window listed under one session. Linked windows appear once per
/// session that contains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMembership {
    pub session: TmuxSession,
    pub window_id: String,
}

/// Strip a leading `/dev/` so `/dev/ttys003` and `ttys003` compare equal.
pub fn normalize_tty(value: &str) -> Option<&str> {
    let value = value.trim();
    let value = value.strip_prefix("/dev/").unwrap_or(value);
    (!value.is_empty()).then_some(value)
}

pub fn tty_matches(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    match (normalize_tty(a), normalize_tty(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub(crate) const CLIENT_FORMAT: &str =
    "#{client_name}\t#{client_tty}\t#{client_flags}\t#{pane_id}";
pub(crate) const WINDOW_FORMAT: &str = "#{session_id}\t#{session_name}\t#{window_id}";

pub fn parse_clients(raw: &str) -> Vec<TmuxClient> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split('\t').map(str::trim);
            let name = fields.next().filter(|name| !name.is_empty())?;
            let tty = fields.next().filter(|tty| !tty.is_empty());
            let flags = fields
                .next()
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect();
            let pane_id = fields.next().filter(|pane| !pane.is_empty());
            Some(TmuxClient {
                name: name.to_string(),
                tty: tty.map(str::to_string),
                flags,
                pane_id: pane_id.map(str::to_string),
            })
        })
        .collect()
}

pub fn parse_window_memberships(raw: &str) -> Vec<WindowMembership> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split('\t').map(str::trim);
            let session_id = fields.next().filter(|v| !v.is_empty())?;
            let session_name = fields.next().filter(|v| !v.is_empty())?;
            let window_id = fields.next().filter(|v| !v.is_empty())?;
            Some(WindowMembership {
                session: TmuxSession {
                    id: session_id.to_string(),
                    name: session_name.to_string(),
                },
                window_id: window_id.to_string(),
            })
        })
        .collect()
}

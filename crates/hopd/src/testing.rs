//! In-memory multiplexer for unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use hop_tmux::{Multiplexer, TmuxClient, TmuxError, TmuxSession, WindowMembership};

#[derive(Debug, Default)]
pub(crate) struct FakeMux {
    pub server_pid: Option<String>,
    /// pane id -> window id
    pub panes: BTreeMap<String, String>,
    pub pane_listing_fails: bool,
    pub clients: Vec<TmuxClient>,
    pub windows: Vec<WindowMembership>,
    /// Extra `display-message` answers keyed by (target, format).
    pub displays: HashMap<(Option<String>, String), String>,
    /// Successive `capture-pane` results; the last one repeats.
    pub captures: RefCell<VecDeque<String>>,
    /// Subcommands that fail when executed.
    pub failing: HashSet<String>,
    pub executed: RefCell<Vec<Vec<String>>>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self {
            server_pid: Some("4242".to_string()),
            ..Self::default()
        }
    }

    pub fn with_pane(mut self, pane_id: &str, window_id: &str) -> Self {
        self.panes
            .insert(pane_id.to_string(), window_id.to_string());
        self
    }

    pub fn with_client(mut self, name: &str, tty: Option<&str>, pane_id: Option<&str>) -> Self {
        let mut client = TmuxClient::new(name, tty);
        client.flags = vec!["attached".to_string()];
        client.pane_id = pane_id.map(str::to_string);
        self.clients.push(client);
        self
    }

    pub fn with_focused_client(mut self, name: &str, pane_id: &str) -> Self {
        let mut client = TmuxClient::new(name, None);
        client.flags = vec!["attached".to_string(), "focused".to_string()];
        client.pane_id = Some(pane_id.to_string());
        self.clients.push(client);
        self
    }

    pub fn with_window(mut self, session_id: &str, session_name: &str, window_id: &str) -> Self {
        self.windows.push(WindowMembership {
            session: TmuxSession {
                id: session_id.to_string(),
                name: session_name.to_string(),
            },
            window_id: window_id.to_string(),
        });
        self
    }

    pub fn with_display(mut self, target: Option<&str>, format: &str, value: &str) -> Self {
        self.displays.insert(
            (target.map(str::to_string), format.to_string()),
            value.to_string(),
        );
        self
    }

    pub fn with_captures(self, captures: &[&str]) -> Self {
        self.captures
            .borrow_mut()
            .extend(captures.iter().map(|capture| capture.to_string()));
        self
    }

    pub fn failing(mut self, subcommand: &str) -> Self {
        self.failing.insert(subcommand.to_string());
        self
    }

    pub fn executed(&self) -> Vec<Vec<String>> {
        self.executed.borrow().clone()
    }

    pub fn capture_count_left(&self) -> usize {
        self.captures.borrow().len()
    }
}

impl Multiplexer for FakeMux {
    fn display(&self, target: Option<&str>, format: &str) -> Option<String> {
        if let Some(value) = self
            .displays
            .get(&(target.map(str::to_string), format.to_string()))
        {
            return Some(value.clone());
        }
        match (target, format) {
            (None, "#{pid}") => self.server_pid.clone(),
            (Some(pane), "#{pane_id}") => self.panes.contains_key(pane).then(|| pane.to_string()),
            (Some(pane), "#{window_id}") => self.panes.get(pane).cloned(),
            _ => None,
        }
    }

    fn list_clients(&self) -> Vec<TmuxClient> {
        self.clients.clone()
    }

    fn list_pane_ids(&self) -> Option<HashSet<String>> {
        (!self.pane_listing_fails).then(|| self.panes.keys().cloned().collect())
    }

    fn list_window_memberships(&self) -> Vec<WindowMembership> {
        self.windows.clone()
    }

    fn capture_pane(&self, pane_id: &str, _lines: u32) -> Option<String> {
        if !self.panes.contains_key(pane_id) {
            return None;
        }
        let mut captures = self.captures.borrow_mut();
        if captures.len() > 1 {
            captures.pop_front()
        } else {
            captures.front().cloned()
        }
    }

    fn execute(&self, args: &[String]) -> Result<(), TmuxError> {
        self.executed.borrow_mut().push(args.to_vec());
        match args.first() {
            Some(subcommand) if self.failing.contains(subcommand) => {
                Err(TmuxError::CommandFailed {
                    command: self.render(args),
                    status: Some(1),
                })
            }
            _ => Ok(()),
        }
    }

    fn render(&self, args: &[String]) -> String {
        let mut argv = vec!["tmux".to_string()];
        argv.extend(args.iter().cloned());
        argv.join(" ")
    }
}

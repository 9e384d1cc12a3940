use std::path::{Path, PathBuf};
use std::time::Duration;

use hop_core::{find_program, is_executable};

use crate::command::TmuxCli;

const FALLBACK_LOCATIONS: &[&str] = &["/opt/homebrew/bin/tmux", "/usr/local/bin/tmux"];

/// Locate the tmux binary: explicit override, then `PATH`, then the
/// Homebrew locations. A configured path that is not executable yields
/// `None` rather than silently falling back.
pub fn find_tmux(configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(path) => is_executable(path).then(|| path.to_path_buf()),
        None => find_program("tmux", FALLBACK_LOCATIONS),
    }
}

impl TmuxCli {
    /// Client for the discovered binary, talking to `socket` when given.
    pub fn discover(
        configured: Option<&Path>,
        socket: Option<PathBuf>,
        timeout: Duration,
    ) -> Option<Self> {
        let binary = find_tmux(configured)?;
        Some(
            Self::new(binary)
                .with_socket(socket)
                .with_timeout(timeout),
        )
    }
}

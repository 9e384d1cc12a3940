use hop_core::StoreError;
use hop_tmux::TmuxError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("marker has no pane id")]
    MissingPane,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to list marker directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AutorunError {
    #[error(transparent)]
    State(#[from] StoreError),
    #[error("failed to type directive into pane {pane_id}: {source}")]
    Inject {
        pane_id: String,
        #[source]
        source: TmuxError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::{AutorunError, LogError, MarkerError};
    use hop_tmux::TmuxError;
    use std::error::Error;
    use std::path::PathBuf;

    #[test]
    fn marker_errors_render_context() {
        assert_eq!(MarkerError::MissingPane.to_string(), "marker has no pane id");
        let err = MarkerError::ListDir {
            path: PathBuf::from("/tmp/markers"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/markers"));
        assert!(err.source().is_some());
    }

    #[test]
    fn inject_error_names_pane_and_keeps_source() {
        let err = AutorunError::Inject {
            pane_id: "%4".to_string(),
            source: TmuxError::CommandFailed {
                command: "tmux send-keys".to_string(),
                status: Some(1),
            },
        };
        assert!(err.to_string().contains("pane %4"));
        assert!(err.source().is_some());
    }

    #[test]
    fn log_error_mentions_path() {
        let err = LogError::OpenFile {
            path: PathBuf::from("/nope/panehop.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope/panehop.log"));
    }
}

use hop_core::ProcessError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("git command returned non-zero exit ({command}) status={status:?}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
    },
    #[error("path is not inside a git repository: {path}")]
    NotARepository { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::GitError;
    use hop_core::ProcessError;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn command_failed_variant_mentions_command_and_status() {
        let err = GitError::CommandFailed {
            command: "git rev-parse HEAD".to_string(),
            status: Some(128),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("git command returned non-zero exit (git rev-parse HEAD)"));
        assert!(rendered.contains("status=Some(128)"));
    }

    #[test]
    fn timeout_is_reported_through_process_error() {
        let err = GitError::from(ProcessError::TimedOut {
            command: "git status".to_string(),
            timeout: Duration::from_secs(1),
        });
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn repository_variant_includes_path() {
        let err = GitError::NotARepository {
            path: PathBuf::from("/tmp/example"),
        };
        assert!(err
            .to_string()
            .contains("path is not inside a git repository: /tmp/example"));
    }
}

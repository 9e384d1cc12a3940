use hop_core::ProcessError;

#[derive(Debug, thiserror::Error)]
pub enum TmuxError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("tmux command returned non-zero exit ({command}) status={status:?}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
    },
    #[error("tmux command produced no output ({command})")]
    EmptyOutput { command: String },
}

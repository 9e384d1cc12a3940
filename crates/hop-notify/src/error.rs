use hop_core::ProcessError;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("notification sink failed: {sink} exited with status={status:?}")]
    SinkFailed { sink: String, status: Option<i32> },
    #[error("notification tool is unavailable: {tool}")]
    Unavailable { tool: String },
}

#[cfg(test)]
mod tests {
    use super::NotifyError;

    #[test]
    fn sink_failed_formats_sink_and_status() {
        let err = NotifyError::SinkFailed {
            sink: "terminal-notifier".to_string(),
            status: Some(2),
        };

        assert_eq!(
            err.to_string(),
            "notification sink failed: terminal-notifier exited with status=Some(2)"
        );
    }

    #[test]
    fn unavailable_names_the_tool() {
        let err = NotifyError::Unavailable {
            tool: "terminal-notifier".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "notification tool is unavailable: terminal-notifier"
        );
        assert!(matches!(err, NotifyError::Unavailable { ref tool } if tool == "terminal-notifier"));
    }
}

use std::path::PathBuf;

use hop_core::{load_config, NotificationEvent, TerminalContext};
use hop_tmux::TmuxCli;
use hopd::{init_logging, Autorun, AutorunError};

#[derive(Debug, thiserror::Error)]
enum MainError {
    #[error(transparent)]
    Autorun(#[from] AutorunError),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("panehop-autorun failed: {err}");
    }
}

fn run() -> Result<(), MainError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [payload] = args.as_slice() else {
        return Ok(());
    };

    let config = load_config();
    if let Err(err) = init_logging(&config.logging, false) {
        eprintln!("panehop-autorun: {err}");
    }

    let event = match NotificationEvent::parse(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(error = %err, "payload discarded");
            return Ok(());
        }
    };
    if !event.is_turn_complete() {
        return Ok(());
    }

    let context = TerminalContext::from_env();
    let Some(pane_id) = context.pane_id.as_deref() else {
        tracing::debug!("not running inside a tmux pane");
        return Ok(());
    };
    let Some(tmux) = TmuxCli::discover(
        config.tmux.binary.as_deref(),
        context.socket.clone().map(PathBuf::from),
        config.tmux.timeout(),
    ) else {
        tracing::info!("tmux not found, skipping autorun");
        return Ok(());
    };

    let outcome = Autorun::new(&tmux, &config.autorun).process(&event, pane_id)?;
    tracing::info!(
        thread_id = event.thread_key(),
        turn_id = event.turn_key(),
        pane_id,
        outcome = ?outcome,
        "autorun finished"
    );
    Ok(())
}

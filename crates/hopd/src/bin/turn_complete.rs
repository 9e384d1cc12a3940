use std::path::PathBuf;
use std::time::SystemTime;

use hop_core::{load_config, NotificationEvent, TerminalContext};
use hop_notify::select_sink;
use hop_tmux::TmuxCli;
use hopd::{builtin_dir, init_logging, select_focus, TurnComplete, ON_CLICK_BIN};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [payload] = args.as_slice() else {
        return;
    };

    let config = load_config();
    if let Err(err) = init_logging(&config.logging, false) {
        eprintln!("panehop-turn-complete: {err}");
    }

    let event = match NotificationEvent::parse(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(error = %err, "payload discarded");
            return;
        }
    };
    if !event.is_turn_complete() {
        return;
    }

    let context = TerminalContext::from_env();
    let tmux = TmuxCli::discover(
        config.tmux.binary.as_deref(),
        context.socket.clone().map(PathBuf::from),
        config.tmux.timeout(),
    );
    let sink = select_sink(config.notify.focus_timeout());
    let focus = select_focus(config.notify.focus_timeout());

    let mut handler = TurnComplete::new(&config, &context, sink.as_ref(), focus.as_ref());
    if let Some(tmux) = &tmux {
        handler = handler.with_tmux(tmux, tmux.binary.clone());
    } else {
        tracing::info!("tmux not found, notifying without a click target");
    }
    if let Some(dir) = builtin_dir(&config.dispatch) {
        handler = handler.with_on_click_bin(dir.join(ON_CLICK_BIN));
    }

    if let Some(report) = handler.handle(&event, SystemTime::now()) {
        tracing::info!(
            thread_id = event.thread_id.as_deref().unwrap_or(""),
            pane_id = context.pane_id.as_deref().unwrap_or(""),
            marker = ?report.marker,
            delivered = report.delivered,
            removal_scheduled = report.removal_scheduled,
            "turn complete handled"
        );
    }
}

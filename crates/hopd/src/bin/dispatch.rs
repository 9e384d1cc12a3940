use std::io::Read;

use hop_core::load_config;
use hopd::{init_logging, Dispatcher};

fn main() {
    let config = load_config();
    if let Err(err) = init_logging(&config.logging, false) {
        eprintln!("panehop-dispatch: {err}");
    }

    let payload = match std::env::args().nth(1) {
        Some(payload) => payload,
        None => {
            let mut payload = String::new();
            if let Err(err) = std::io::stdin().read_to_string(&mut payload) {
                tracing::warn!(error = %err, "failed to read payload from stdin");
                return;
            }
            payload
        }
    };

    match Dispatcher::from_config(&config.dispatch).dispatch(&payload) {
        Ok(report) => tracing::debug!(
            event_type = %report.event_type,
            handlers = report.executed(),
            "event dispatched"
        ),
        Err(err) => tracing::debug!(error = %err, "payload discarded"),
    }
}

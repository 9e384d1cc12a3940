use std::path::PathBuf;

use hop_core::{load_config, TerminalContext};
use hop_notify::select_hud;
use hop_tmux::TmuxCli;
use hopd::{init_logging, select_focus, show_hud, ClickOutcome, OnClick, OnClickArgs};

fn main() {
    let config = load_config();
    if let Err(err) = init_logging(&config.logging, true) {
        eprintln!("panehop-on-click: {err}");
    }

    let args = OnClickArgs::parse_lenient(std::env::args());
    let hud = select_hud(&config.notify.hud_script, config.notify.focus_timeout());

    let binary = args.tmux_bin.clone().or_else(|| config.tmux.binary.clone());
    let socket = args
        .tmux_socket
        .clone()
        .filter(|socket| !socket.as_os_str().is_empty())
        .or_else(|| TerminalContext::from_env().socket.map(PathBuf::from));
    let Some(tmux) = TmuxCli::discover(binary.as_deref(), socket, config.tmux.timeout()) else {
        tracing::warn!("tmux not found");
        show_hud(hud.as_ref(), &args, &config.notify.app_title, "tmux not found");
        return;
    };

    let focus = select_focus(config.notify.focus_timeout());
    let outcome = OnClick::new(&tmux, focus.as_ref(), hud.as_ref(), &config.notify.app_title)
        .run(&args);
    if let ClickOutcome::DryRun { commands } = &outcome {
        for command in commands {
            println!("{command}");
        }
    }
}


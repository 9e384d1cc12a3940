//! Whole-turn scenarios across the built-in handlers.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

use hop_core::{read_json, HopConfig, NotificationEvent, TerminalContext, TurnMarker};
use hop_notify::LogSink;
use hop_tmux::{send_enter_args, send_literal_args};
use pretty_assertions::assert_eq;

use crate::autorun::{Autorun, AutorunOutcome};
use crate::focus::NoFocus;
use crate::marker_store::MarkerWrite;
use crate::on_click::{ClickOutcome, OnClick, OnClickArgs};
use crate::testing::FakeMux;
use crate::turn_complete::TurnComplete;

const PAYLOAD: &str = r#"{"type":"agent-turn-complete","thread-id":"t1","turn-id":"u1","cwd":"/repo","last-assistant-message":"Done.\n[tmux] echo hi remaining=2"}"#;

fn no_sleep(_: Duration) {}

#[test]
fn completed_turn_notifies_records_and_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = HopConfig::default();
    config.markers.dir = dir.path().join("markers");
    config.autorun.state_dir = dir.path().join("autorun");
    config.dispatch.enable_autorun = true;
    let context = TerminalContext {
        socket: Some("/tmp/tmux-501/default".to_string()),
        pane_id: Some("%1".to_string()),
    };
    let mux = FakeMux::new()
        .with_pane("%1", "@1")
        .with_client("/dev/ttys001", Some("/dev/ttys001"), Some("%4"))
        .with_window("$0", "work", "@1")
        .with_captures(&["Done.\n› "]);
    let event = NotificationEvent::parse(PAYLOAD).expect("parse payload");
    let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    let report = TurnComplete::new(&config, &context, &LogSink, &NoFocus)
        .with_tmux(&mux, PathBuf::from("tmux"))
        .handle(&event, now)
        .expect("turn complete");
    let marker_path = dir.path().join("markers").join("%1");
    assert_eq!(
        report.marker,
        Some(MarkerWrite::Written {
            path: marker_path.clone()
        })
    );
    assert!(report.delivered);
    let marker: TurnMarker = read_json(&marker_path)
        .expect("read marker")
        .expect("marker exists");
    assert_eq!(marker.thread_id, "t1");
    assert_eq!(marker.turn_id, "u1");
    assert_eq!(marker.window_id, "@1");

    let outcome = Autorun::new(&mux, &config.autorun)
        .with_sleep(no_sleep)
        .process(&event, "%1")
        .expect("autorun");
    assert_eq!(
        outcome,
        AutorunOutcome::Sent {
            keys: "echo hi".to_string(),
            remaining: 1
        }
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("autorun").join("t1.json")).expect("state file"),
        r#"{"remaining":1,"last_turn_id":"u1"}"#
    );

    let executed = mux.executed();
    assert_eq!(
        executed,
        vec![
            vec![
                "set-option".to_string(),
                "-w".to_string(),
                "-t".to_string(),
                "@1".to_string(),
                "@panehop_done".to_string(),
                "1".to_string(),
            ],
            send_literal_args("%1", "echo hi"),
            send_enter_args("%1"),
        ]
    );
}

#[test]
fn click_returns_to_the_marked_pane() {
    let mux = FakeMux::new()
        .with_pane("%1", "@1")
        .with_client("/dev/ttys001", Some("/dev/ttys001"), Some("%4"))
        .with_window("$0", "work", "@1");
    let hud = hop_notify::LogHud;
    let args = OnClickArgs::parse_lenient([
        "panehop-on-click",
        "--client",
        "/dev/ttys001",
        "--session-id",
        "$0",
        "--window-id",
        "@1",
        "--pane-id",
        "%1",
    ]);

    let outcome = OnClick::new(&mux, &NoFocus, &hud, "Codex").run(&args);
    assert!(matches!(outcome, ClickOutcome::Committed { ref report, .. } if report.succeeded()));
    assert_eq!(
        mux.executed(),
        vec![
            vec!["switch-client", "-c", "/dev/ttys001", "-t", "$0"],
            vec!["select-window", "-t", "$0:@1"],
            vec!["select-pane", "-t", "%1"],
        ]
    );
}

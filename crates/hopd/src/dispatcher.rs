//! Fan one event payload out to every interested handler program.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hop_core::{slugify, DispatchConfig, EventError, NotificationEvent};
use wildmatch::WildMatch;

use crate::handler::{HandlerOutcome, HandlerTarget};

pub const TURN_COMPLETE_BIN: &str = "panehop-turn-complete";
pub const AUTORUN_BIN: &str = "panehop-autorun";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRun {
    pub path: PathBuf,
    pub outcome: HandlerOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_type: String,
    pub runs: Vec<HandlerRun>,
}

impl DispatchReport {
    pub fn executed(&self) -> usize {
        self.runs
            .iter()
            .filter(|run| {
                !matches!(
                    run.outcome,
                    HandlerOutcome::SkippedSelf | HandlerOutcome::Missing
                )
            })
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher {
    /// Always invoked, in this order, before anything discovered.
    pub builtins: Vec<PathBuf>,
    pub extra_dirs: Vec<PathBuf>,
    /// Catch-all, invoked last.
    pub user_handler: Option<PathBuf>,
    pub timeout: Duration,
    /// Canonical path of the running dispatcher, never invoked as a handler.
    pub self_exe: Option<PathBuf>,
}

impl Dispatcher {
    pub fn from_config(config: &DispatchConfig) -> Self {
        let mut builtins = Vec::new();
        if let Some(dir) = builtin_dir(config) {
            builtins.push(dir.join(TURN_COMPLETE_BIN));
            if config.enable_autorun {
                builtins.push(dir.join(AUTORUN_BIN));
            }
        }

        Self {
            builtins,
            extra_dirs: config.extra_handler_dirs.clone(),
            user_handler: config.user_handler.clone(),
            timeout: config.subhandler_timeout(),
            self_exe: current_exe(),
        }
    }

    /// Candidate paths in invocation order, before dedup.
    pub fn candidates(&self, slug: &str) -> Vec<PathBuf> {
        let mut paths = self.builtins.clone();
        for dir in &self.extra_dirs {
            paths.extend(discover_handlers(dir, slug));
        }
        paths.extend(self.user_handler.iter().cloned());
        paths
    }

    /// Run every handler for `payload`. Handler failures are recorded in the
    /// report and never stop the remaining handlers; only an unusable
    /// payload is an error, and then nothing runs.
    pub fn dispatch(&self, payload: &str) -> Result<DispatchReport, EventError> {
        let event = NotificationEvent::parse(payload)?;
        let slug = slugify(&event.kind);

        let mut seen = HashSet::new();
        let mut runs = Vec::new();
        for candidate in self.candidates(&slug) {
            let Some(target) = HandlerTarget::resolve(&candidate) else {
                tracing::debug!(handler = %candidate.display(), "handler not runnable");
                runs.push(HandlerRun {
                    path: candidate,
                    outcome: HandlerOutcome::Missing,
                });
                continue;
            };
            if !seen.insert(target.path.clone()) {
                continue;
            }
            if self.self_exe.as_deref() == Some(target.path.as_path()) {
                tracing::warn!(handler = %target.path.display(), "refusing to dispatch to self");
                runs.push(HandlerRun {
                    path: target.path,
                    outcome: HandlerOutcome::SkippedSelf,
                });
                continue;
            }

            let outcome = target.run(&event.raw, self.timeout);
            tracing::debug!(
                handler = %target.path.display(),
                event_type = %event.kind,
                outcome = %outcome,
                "handler finished"
            );
            runs.push(HandlerRun {
                path: target.path,
                outcome,
            });
        }

        Ok(DispatchReport {
            event_type: event.kind,
            runs,
        })
    }
}

fn current_exe() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.canonicalize().ok())
}

/// Where the built-in executables live: configured, else beside the
/// running executable.
pub fn builtin_dir(config: &DispatchConfig) -> Option<PathBuf> {
    config.builtin_dir.clone().or_else(|| {
        current_exe()
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    })
}

/// Files in `dir` named `*_<slug>.*` or `*_<slug>__*.*`, sorted. Hidden
/// files are ignored and a missing directory yields nothing.
pub fn discover_handlers(dir: &Path, slug: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), error = %err, "skipping handler dir");
            return Vec::new();
        }
    };
    let exact = WildMatch::new(&format!("*_{slug}.*"));
    let variant = WildMatch::new(&format!("*_{slug}__*.*"));

    let found: BTreeSet<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && (exact.matches(&name) || variant.matches(&name))
        })
        .map(|entry| entry.path())
        .collect();
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{discover_handlers, Dispatcher, AUTORUN_BIN, TURN_COMPLETE_BIN};
    use crate::handler::HandlerOutcome;
    use hop_core::{DispatchConfig, EventError};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const PAYLOAD: &str = r#"{"type":"agent-turn-complete","thread-id":"t1"}"#;

    /// Shell handler appending `tag` to `log` on every run.
    fn recording_handler(path: &Path, log: &Path, tag: &str) {
        fs::write(
            path,
            format!("printf '%s\\n' '{tag}' >> '{}'\n", log.display()),
        )
        .expect("write handler");
    }

    fn runs_logged(log: &Path) -> Vec<String> {
        fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher {
            builtins: Vec::new(),
            extra_dirs: Vec::new(),
            user_handler: None,
            timeout: Duration::from_secs(5),
            self_exe: None,
        }
    }

    #[test]
    fn from_config_gates_autorun_builtin() {
        let mut config = DispatchConfig {
            builtin_dir: Some(PathBuf::from("/opt/panehop/bin")),
            ..DispatchConfig::default()
        };
        assert_eq!(
            Dispatcher::from_config(&config).builtins,
            vec![PathBuf::from("/opt/panehop/bin").join(TURN_COMPLETE_BIN)]
        );

        config.enable_autorun = true;
        assert_eq!(
            Dispatcher::from_config(&config).builtins,
            vec![
                PathBuf::from("/opt/panehop/bin").join(TURN_COMPLETE_BIN),
                PathBuf::from("/opt/panehop/bin").join(AUTORUN_BIN),
            ]
        );
    }

    /// Executable stand-in for a built-in binary that logs its own name.
    fn builtin_stub(dir: &Path, name: &str, log: &Path) {
        let path = dir.join(name);
        fs::write(
            &path,
            format!("#!/bin/sh\nprintf '%s\\n' '{name}' >> '{}'\n", log.display()),
        )
        .expect("write stub");
        let mut perms = fs::metadata(&path).expect("stat").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod");
    }

    #[test]
    fn configured_builtins_run_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).expect("mkdir");
        let log = dir.path().join("runs.log");
        builtin_stub(&bin, TURN_COMPLETE_BIN, &log);
        builtin_stub(&bin, AUTORUN_BIN, &log);

        let mut config = DispatchConfig {
            builtin_dir: Some(bin.clone()),
            enable_autorun: true,
            ..DispatchConfig::default()
        };
        let report = Dispatcher::from_config(&config)
            .dispatch(PAYLOAD)
            .expect("dispatch");
        assert_eq!(report.executed(), 2);
        assert!(report.runs.iter().all(|run| run.outcome.succeeded()));
        assert_eq!(runs_logged(&log), vec![TURN_COMPLETE_BIN, AUTORUN_BIN]);

        fs::remove_file(&log).expect("reset log");
        config.enable_autorun = false;
        let report = Dispatcher::from_config(&config)
            .dispatch(PAYLOAD)
            .expect("dispatch");
        assert_eq!(report.executed(), 1);
        assert_eq!(runs_logged(&log), vec![TURN_COMPLETE_BIN]);
    }

    #[test]
    fn discovery_matches_type_patterns_in_sorted_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "b_agent_turn_complete.sh",
            "a_agent_turn_complete__extra.sh",
            "c_other_event.sh",
            "agent_turn_complete.sh",
            ".hidden_agent_turn_complete.sh",
            "README.md",
        ] {
            fs::write(dir.path().join(name), "exit 0\n").expect("write");
        }

        let found = discover_handlers(dir.path(), "agent_turn_complete");
        let names: Vec<_> = found
            .iter()
            .map(|path| path.file_name().expect("name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["a_agent_turn_complete__extra.sh", "b_agent_turn_complete.sh"]
        );
        assert!(discover_handlers(&dir.path().join("absent"), "x").is_empty());
    }

    #[test]
    fn same_handler_registered_three_ways_runs_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("runs.log");
        let handler = dir.path().join("10_agent_turn_complete.sh");
        recording_handler(&handler, &log, "h");

        let dispatcher = Dispatcher {
            builtins: vec![handler.clone()],
            extra_dirs: vec![dir.path().to_path_buf()],
            user_handler: Some(dir.path().join("./10_agent_turn_complete.sh")),
            ..dispatcher()
        };
        let report = dispatcher.dispatch(PAYLOAD).expect("dispatch");

        assert_eq!(report.event_type, "agent-turn-complete");
        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.executed(), 1);
        assert_eq!(runs_logged(&log), vec!["h"]);
    }

    #[test]
    fn dispatcher_never_invokes_itself() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("runs.log");
        let me = dir.path().join("dispatch.sh");
        recording_handler(&me, &log, "self");

        let dispatcher = Dispatcher {
            user_handler: Some(me.clone()),
            self_exe: Some(me.canonicalize().expect("canonical")),
            ..dispatcher()
        };
        let report = dispatcher.dispatch(PAYLOAD).expect("dispatch");

        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.runs[0].outcome, HandlerOutcome::SkippedSelf);
        assert_eq!(report.executed(), 0);
        assert!(runs_logged(&log).is_empty());
    }

    #[test]
    fn failing_and_slow_handlers_do_not_block_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("runs.log");
        let failing = dir.path().join("failing.sh");
        fs::write(&failing, "exit 7\n").expect("write failing");
        let slow = dir.path().join("slow.sh");
        fs::write(&slow, "sleep 5\n").expect("write slow");
        let last = dir.path().join("last.sh");
        recording_handler(&last, &log, "last");

        let dispatcher = Dispatcher {
            builtins: vec![failing, slow, dir.path().join("missing-builtin")],
            user_handler: Some(last),
            timeout: Duration::from_millis(200),
            ..dispatcher()
        };
        let report = dispatcher.dispatch(PAYLOAD).expect("dispatch");
        let outcomes: Vec<_> = report.runs.iter().map(|run| run.outcome.clone()).collect();

        assert_eq!(
            outcomes,
            vec![
                HandlerOutcome::Exited { code: Some(7) },
                HandlerOutcome::TimedOut,
                HandlerOutcome::Missing,
                HandlerOutcome::Exited { code: Some(0) },
            ]
        );
        assert_eq!(runs_logged(&log), vec!["last"]);
    }

    #[test]
    fn handlers_receive_the_payload_as_sole_argument() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("args.txt");
        let handler = dir.path().join("args.sh");
        fs::write(
            &handler,
            format!("printf '%s|%s' \"$#\" \"$1\" > '{}'\n", out.display()),
        )
        .expect("write handler");

        let dispatcher = Dispatcher {
            user_handler: Some(handler),
            ..dispatcher()
        };
        dispatcher
            .dispatch(&format!("  {PAYLOAD}\n"))
            .expect("dispatch");
        assert_eq!(
            fs::read_to_string(&out).expect("read args"),
            format!("1|{PAYLOAD}")
        );
    }

    #[test]
    fn unusable_payload_runs_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("runs.log");
        let handler = dir.path().join("h.sh");
        recording_handler(&handler, &log, "h");
        let dispatcher = Dispatcher {
            user_handler: Some(handler),
            ..dispatcher()
        };

        assert_eq!(
            dispatcher.dispatch(r#"{"thread-id":"t1"}"#),
            Err(EventError::MissingType)
        );
        assert!(matches!(
            dispatcher.dispatch("not json"),
            Err(EventError::Malformed { .. })
        ));
        assert!(runs_logged(&log).is_empty());
    }
}

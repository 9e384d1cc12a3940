//! One JSON marker per pane recording its last completed turn.
//!
//! Markers are a liveness record and audit trail. Nothing reads them back
//! except garbage collection, which drops entries whose pane or server is
//! gone or whose age exceeds the configured TTL.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hop_core::{safe_filename, write_json_atomic, MarkerConfig, TurnMarker};
use hop_tmux::Multiplexer;
use serde_json::Value;

use crate::error::MarkerError;

/// Collection stops once this many markers have been kept.
pub const GC_KEEP_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerWrite {
    Written { path: PathBuf },
    /// The pane is already in front of the user.
    SkippedFocused,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcReport {
    pub removed: Vec<PathBuf>,
    pub kept: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStore {
    pub dir: PathBuf,
    pub ttl: Option<Duration>,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn from_config(config: &MarkerConfig) -> Self {
        Self::new(config.dir.clone(), config.ttl())
    }

    pub fn path_for(&self, pane_id: &str) -> PathBuf {
        self.dir.join(safe_filename(pane_id))
    }

    /// Replace the marker for `marker.pane_id` and flag its window.
    pub fn write<M: Multiplexer + ?Sized>(
        &self,
        mux: &M,
        marker: &TurnMarker,
    ) -> Result<MarkerWrite, MarkerError> {
        let pane_id = marker.pane_id.trim();
        if pane_id.is_empty() {
            return Err(MarkerError::MissingPane);
        }
        if mux.pane_focused_in_any_client(pane_id) {
            tracing::debug!(pane_id, "pane focused, no marker");
            return Ok(MarkerWrite::SkippedFocused);
        }

        let path = write_json_atomic(&self.path_for(pane_id), marker)?;
        if !marker.window_id.is_empty() {
            if let Err(err) = mux.mark_window_done(&marker.window_id) {
                tracing::debug!(window_id = %marker.window_id, error = %err, "failed to flag window");
            }
        }
        Ok(MarkerWrite::Written { path })
    }

    /// Drop markers for dead panes, other server instances, or past the TTL.
    ///
    /// Does nothing without a current server id. Unreadable markers are aged
    /// by modification time instead of `created_at`.
    pub fn collect_garbage<M: Multiplexer + ?Sized>(
        &self,
        mux: &M,
        server_instance_id: &str,
        now: SystemTime,
    ) -> Result<GcReport, MarkerError> {
        let mut report = GcReport::default();
        if server_instance_id.is_empty() {
            return Ok(report);
        }

        let live_panes = mux.list_pane_ids();
        let mut entries: Vec<_> = match fs::read_dir(&self.dir) {
            Ok(entries) => entries.filter_map(Result::ok).collect(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(source) => {
                return Err(MarkerError::ListDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if name.is_empty() || name.starts_with('.') || !path.is_file() {
                continue;
            }

            let pane_from_name = name.starts_with('%').then_some(name.as_str());
            if let (Some(live), Some(pane)) = (&live_panes, pane_from_name) {
                if !live.contains(pane) {
                    remove(&path, "pane gone", &mut report);
                    continue;
                }
            }

            let expired = match read_marker(&path) {
                Some(marker) => {
                    let owner = marker
                        .get("server_instance_id")
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    if !owner.is_empty() && owner != server_instance_id {
                        remove(&path, "other server", &mut report);
                        continue;
                    }
                    let created_at = marker
                        .get("created_at")
                        .and_then(Value::as_i64)
                        .and_then(|secs| u64::try_from(secs).ok())
                        .filter(|secs| *secs > 0)
                        .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
                    self.older_than_ttl(created_at, now)
                }
                None => {
                    let modified = entry.metadata().and_then(|meta| meta.modified()).ok();
                    self.older_than_ttl(modified, now)
                }
            };
            if expired {
                remove(&path, "expired", &mut report);
                continue;
            }

            report.kept += 1;
            if report.kept >= GC_KEEP_LIMIT {
                break;
            }
        }
        Ok(report)
    }

    fn older_than_ttl(&self, stamp: Option<SystemTime>, now: SystemTime) -> bool {
        match (self.ttl, stamp) {
            (Some(ttl), Some(stamp)) => now
                .duration_since(stamp)
                .map(|age| age > ttl)
                .unwrap_or(false),
            _ => false,
        }
    }
}

fn read_marker(path: &Path) -> Option<serde_json::Map<String, Value>> {
    let body = fs::read(path).ok()?;
    match serde_json::from_slice(&body).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn remove(path: &Path, reason: &str, report: &mut GcReport) {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(marker = %path.display(), reason, "removed marker");
            report.removed.push(path.to_path_buf());
        }
        Err(err) => {
            tracing::debug!(marker = %path.display(), error = %err, "failed to remove marker");
        }
    }
}

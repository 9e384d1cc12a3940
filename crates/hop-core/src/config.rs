//! Process-wide configuration, assembled once at start-up.
//!
//! Precedence: built-in defaults, then the optional TOML file, then
//! `PANEHOP_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "PANEHOP_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HopConfig {
    pub dispatch: DispatchConfig,
    pub markers: MarkerConfig,
    pub autorun: AutorunConfig,
    pub tmux: TmuxConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub subhandler_timeout_secs: f64,
    pub enable_autorun: bool,
    /// Catch-all handler, always run last.
    pub user_handler: Option<PathBuf>,
    pub extra_handler_dirs: Vec<PathBuf>,
    /// Where the built-in handler executables live. Defaults to the
    /// directory of the running dispatcher.
    pub builtin_dir: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            subhandler_timeout_secs: 2.0,
            enable_autorun: false,
            user_handler: None,
            extra_handler_dirs: Vec::new(),
            builtin_dir: None,
        }
    }
}

impl DispatchConfig {
    pub fn subhandler_timeout(&self) -> Duration {
        secs(self.subhandler_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub dir: PathBuf,
    /// Zero or negative disables age-based collection.
    pub ttl_secs: i64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            dir: home().join(".config/tmux/run/panehop-turn-complete"),
            ttl_secs: 0,
        }
    }
}

impl MarkerConfig {
    pub fn ttl(&self) -> Option<Duration> {
        u64::try_from(self.ttl_secs)
            .ok()
            .filter(|ttl| *ttl > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutorunConfig {
    pub default_remaining: i64,
    pub state_dir: PathBuf,
    pub prompt_check_retries: u32,
    pub prompt_check_delay_secs: f64,
    pub require_idle: bool,
    pub dry_run: bool,
    pub directive_tag: String,
    /// How far back from the end of the message a directive may appear.
    pub scan_lines: usize,
    /// Lines of pane history inspected by the idle check.
    pub capture_lines: u32,
    pub prompt_marker: String,
    pub busy_hints: Vec<String>,
}

impl Default for AutorunConfig {
    fn default() -> Self {
        Self {
            default_remaining: 3,
            state_dir: home().join(".config/panehop/autorun-state"),
            prompt_check_retries: 5,
            prompt_check_delay_secs: 0.2,
            require_idle: false,
            dry_run: false,
            directive_tag: "[tmux]".to_string(),
            scan_lines: 30,
            capture_lines: 30,
            prompt_marker: "›".to_string(),
            busy_hints: vec![
                "esc to interrupt".to_string(),
                "again to interrupt".to_string(),
            ],
        }
    }
}

impl AutorunConfig {
    pub fn prompt_check_delay(&self) -> Duration {
        secs(self.prompt_check_delay_secs)
    }

    pub fn prompt_check_attempts(&self) -> u32 {
        self.prompt_check_retries.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    pub binary: Option<PathBuf>,
    pub timeout_secs: f64,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: 1.0,
        }
    }
}

impl TmuxConfig {
    pub fn timeout(&self) -> Duration {
        secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub app_title: String,
    pub max_message_chars: usize,
    pub activate_bundle_id: String,
    /// Replaces the generated click command when set.
    pub on_click_override: Option<String>,
    pub auto_remove_if_visible: bool,
    pub auto_remove_delay_secs: f64,
    pub hud_script: PathBuf,
    pub git_timeout_secs: f64,
    pub focus_timeout_secs: f64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            app_title: "Codex".to_string(),
            max_message_chars: 220,
            activate_bundle_id: "com.googlecode.iterm2".to_string(),
            on_click_override: None,
            auto_remove_if_visible: false,
            auto_remove_delay_secs: 4.0,
            hud_script: home().join(".config/tmux/scripts/tmux_btt_hud_notify.sh"),
            git_timeout_secs: 1.0,
            focus_timeout_secs: 1.5,
        }
    }
}

impl NotifyConfig {
    pub fn auto_remove_delay(&self) -> Duration {
        secs(self.auto_remove_delay_secs)
    }

    pub fn git_timeout(&self) -> Duration {
        secs(self.git_timeout_secs)
    }

    pub fn focus_timeout(&self) -> Duration {
        secs(self.focus_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    pub disable_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            disable_file: false,
        }
    }
}

impl LoggingConfig {
    pub fn default_file() -> PathBuf {
        home().join(".config/tmux/run/panehop.log")
    }
}

/// Values inherited from the tmux environment of the invoking process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalContext {
    pub socket: Option<String>,
    pub pane_id: Option<String>,
}

impl TerminalContext {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let socket = lookup("TMUX").and_then(|raw| {
            let socket = raw.split(',').next().unwrap_or("").trim().to_string();
            (!socket.is_empty()).then_some(socket)
        });
        let pane_id = lookup("TMUX_PANE")
            .map(|raw| raw.trim().to_string())
            .filter(|pane| !pane.is_empty());
        Self { socket, pane_id }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn inside_tmux(&self) -> bool {
        self.socket.is_some() || self.pane_id.is_some()
    }
}

pub fn parse_config(contents: &str) -> Result<HopConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// `Ok(None)` when no file exists at `path`.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<Option<HopConfig>, ConfigError> {
    let path_ref = path.as_ref();
    let body = match fs::read_to_string(path_ref) {
        Ok(body) => body,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path_ref.to_path_buf(),
                source,
            })
        }
    };
    parse_config(&body)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| home().join(".config"))
        .join("panehop")
        .join("config.toml")
}

/// Defaults, then `file` (if any), then environment overrides.
pub fn load_config_from(
    file: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> HopConfig {
    let mut config = match file.map(load_config_file) {
        Some(Ok(Some(config))) => config,
        Some(Ok(None)) | None => HopConfig::default(),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "ignoring unreadable config file");
            HopConfig::default()
        }
    };
    config.apply_overrides(lookup);
    config
}

pub fn load_config() -> HopConfig {
    let path = std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    load_config_from(Some(&path), |key| std::env::var(key).ok())
}

impl HopConfig {
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get("PANEHOP_SUBHANDLER_TIMEOUT_SECONDS") {
            set_parsed(
                &mut self.dispatch.subhandler_timeout_secs,
                "PANEHOP_SUBHANDLER_TIMEOUT_SECONDS",
                &value,
            );
        }
        if let Some(value) = get("PANEHOP_ENABLE_AUTORUN") {
            self.dispatch.enable_autorun = value == "1";
        }
        if let Some(value) = get("PANEHOP_USER_HANDLER") {
            self.dispatch.user_handler = Some(expand_home(&value));
        }
        if let Some(value) = get("PANEHOP_EXTRA_HANDLER_DIRS") {
            self.dispatch.extra_handler_dirs = split_paths(&value);
        }
        if let Some(value) = get("PANEHOP_BUILTIN_DIR") {
            self.dispatch.builtin_dir = Some(expand_home(&value));
        }

        if let Some(value) = get("PANEHOP_MARKER_DIR") {
            self.markers.dir = expand_home(&value);
        }
        if let Some(value) = get("PANEHOP_MARKER_TTL_SECONDS") {
            // Fractional values truncate; garbage disables the TTL.
            self.markers.ttl_secs = value.parse::<f64>().map(|ttl| ttl as i64).unwrap_or(0);
        }

        if let Some(value) = get("PANEHOP_AUTORUN_DEFAULT_REMAINING") {
            set_parsed(
                &mut self.autorun.default_remaining,
                "PANEHOP_AUTORUN_DEFAULT_REMAINING",
                &value,
            );
        }
        if let Some(value) = get("PANEHOP_AUTORUN_STATE_DIR") {
            self.autorun.state_dir = expand_home(&value);
        }
        if let Some(value) = get("PANEHOP_AUTORUN_PROMPT_CHECK_RETRIES") {
            set_parsed(
                &mut self.autorun.prompt_check_retries,
                "PANEHOP_AUTORUN_PROMPT_CHECK_RETRIES",
                &value,
            );
        }
        if let Some(value) = get("PANEHOP_AUTORUN_PROMPT_CHECK_DELAY_SECONDS") {
            set_parsed(
                &mut self.autorun.prompt_check_delay_secs,
                "PANEHOP_AUTORUN_PROMPT_CHECK_DELAY_SECONDS",
                &value,
            );
        }
        if let Some(value) = get("PANEHOP_AUTORUN_REQUIRE_IDLE") {
            self.autorun.require_idle = value == "1";
        }
        if let Some(value) = get("PANEHOP_AUTORUN_DRY_RUN") {
            self.autorun.dry_run = value == "1";
        }

        if let Some(value) = get("PANEHOP_TMUX_BIN") {
            self.tmux.binary = Some(expand_home(&value));
        }
        if let Some(value) = get("PANEHOP_TMUX_TIMEOUT_SECONDS") {
            set_parsed(&mut self.tmux.timeout_secs, "PANEHOP_TMUX_TIMEOUT_SECONDS", &value);
        }

        if let Some(value) = get("PANEHOP_ON_CLICK") {
            self.notify.on_click_override = Some(value);
        }
        if let Some(value) = get("PANEHOP_AUTO_REMOVE_IF_VISIBLE") {
            self.notify.auto_remove_if_visible = is_truthy(&value);
        }
        if let Some(value) = get("PANEHOP_AUTO_REMOVE_DELAY_SECONDS") {
            set_parsed(
                &mut self.notify.auto_remove_delay_secs,
                "PANEHOP_AUTO_REMOVE_DELAY_SECONDS",
                &value,
            );
        }

        if let Some(value) = get("PANEHOP_LOG").or_else(|| get("RUST_LOG")) {
            self.logging.level = value;
        }
        if let Some(value) = get("PANEHOP_LOG_FILE") {
            self.logging.file = Some(expand_home(&value));
        }
        if let Some(value) = get("PANEHOP_LOG_DISABLE") {
            self.logging.disable_file = value == "1";
        }
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!(key, value, "ignoring invalid configuration value"),
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

/// Longest wait any setting may ask for: one day.
const MAX_WAIT_SECS: f64 = 86_400.0;

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value.min(MAX_WAIT_SECS)).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return home();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home().join(rest),
        None => PathBuf::from(raw),
    }
}

/// Split a directory list on the platform path separator or commas.
pub fn split_paths(raw: &str) -> Vec<PathBuf> {
    let separator = if cfg!(windows) { ';' } else { ':' };
    raw.split([separator, ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(expand_home)
        .collect()
}

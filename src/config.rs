//! Process configuration loaded from environment variables

use crate::mailbox::FileMailbox;
use crate::rolling::SpinTiming;
use crate::state::DEFAULT_MAX_REPLICATED_POOL;
use std::path::PathBuf;
use std::time::Duration;

/// 6584 is ascii for "AT", as in "draw at random"
pub const DEFAULT_PORT: u16 = 6584;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Authority: operator console, replication, HTTP mailbox
    Server,
    /// Headless observer polling a remote server
    Display,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub port: u16,
    pub mailbox_path: PathBuf,
    /// Remote server whose `/api/draw-state` replaces the mailbox file
    pub mailbox_url: Option<String>,
    /// Base URL of the authority, used in display mode
    pub server_url: String,
    pub poll_interval: Duration,
    pub spin: SpinTiming,
    pub max_replicated_pool: usize,
    /// Load the generated demo pool at startup
    pub mock_pool: bool,
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Server,
            port: DEFAULT_PORT,
            mailbox_path: FileMailbox::default_path(),
            mailbox_url: None,
            server_url: format!("http://127.0.0.1:{}", DEFAULT_PORT),
            poll_interval: Duration::from_millis(1000),
            spin: SpinTiming::default(),
            max_replicated_pool: DEFAULT_MAX_REPLICATED_POOL,
            mock_pool: true,
            static_dir: PathBuf::from("static"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mode = match std::env::var("LUCKYDRAW_MODE").as_deref() {
            Ok("display") => Mode::Display,
            Ok("server") | Err(_) => Mode::Server,
            Ok(other) => {
                tracing::warn!("Unknown LUCKYDRAW_MODE '{}', falling back to server", other);
                Mode::Server
            }
        };

        let port = env_parse("LUCKYDRAW_PORT").unwrap_or(defaults.port);

        let mailbox_path = std::env::var("LUCKYDRAW_MAILBOX_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.mailbox_path);

        let mailbox_url = std::env::var("LUCKYDRAW_MAILBOX_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let server_url = std::env::var("LUCKYDRAW_SERVER_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.server_url);

        let poll_interval = env_parse::<u64>("LUCKYDRAW_POLL_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let spin = SpinTiming {
            tick: env_parse::<u64>("LUCKYDRAW_SPIN_TICK_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.spin.tick),
            grace: env_parse::<u64>("LUCKYDRAW_SPIN_GRACE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.spin.grace),
        };

        let max_replicated_pool = env_parse::<usize>("LUCKYDRAW_MAX_REPLICATED_POOL")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_replicated_pool);

        let mock_pool = env_flag("LUCKYDRAW_MOCK_POOL", defaults.mock_pool);

        let static_dir = std::env::var("LUCKYDRAW_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        tracing::info!(
            ?mode,
            port,
            mailbox = %mailbox_path.display(),
            mailbox_url = mailbox_url.as_deref().unwrap_or("-"),
            poll_ms = poll_interval.as_millis() as u64,
            max_replicated_pool,
            mock_pool,
            "Configuration loaded"
        );

        Self {
            mode,
            port,
            mailbox_path,
            mailbox_url,
            server_url,
            poll_interval,
            spin,
            max_replicated_pool,
            mock_pool,
            static_dir,
        }
    }
}

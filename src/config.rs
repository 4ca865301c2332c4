//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default allow-list location.
pub const DEFAULT_ALLOWLIST_PATH: &str = "allowed_users.json";
/// Default scratch root for conversion artifacts.
pub const DEFAULT_SCRATCH_DIR: &str = "downloads";
/// Default activity log file.
pub const DEFAULT_LOG_FILE: &str = "bot_activity.log";

/// Bot configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot API token.
    pub bot_token: SecretString,
    /// Users allowed to run admin commands. Admins are always authorized.
    pub admin_ids: Vec<i64>,
    /// Where the allow-list JSON lives.
    pub allowlist_path: PathBuf,
    /// Root for per-request scratch areas.
    pub scratch_dir: PathBuf,
    /// Activity log file, `None` to log to stderr only.
    pub log_file: Option<PathBuf>,
    /// Long-poll timeout for `getUpdates`.
    pub poll_timeout: Duration,
}

impl BotConfig {
    /// Build config from the process environment.
    ///
    /// Fails if no bot token is set: the bot cannot do anything without one.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("BOT_TOKEN".to_string()))?;

        let admin_ids = match lookup("BOT_ADMIN_IDS") {
            Some(raw) => parse_id_list("BOT_ADMIN_IDS", &raw)?,
            None => Vec::new(),
        };

        let allowlist_path = lookup("BOT_ALLOWLIST_PATH")
            .unwrap_or_else(|| DEFAULT_ALLOWLIST_PATH.to_string())
            .into();

        let scratch_dir = lookup("BOT_SCRATCH_DIR")
            .unwrap_or_else(|| DEFAULT_SCRATCH_DIR.to_string())
            .into();

        let log_file = match lookup("BOT_LOG_FILE") {
            Some(v) if v.eq_ignore_ascii_case("off") || v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        let poll_timeout_secs: u64 = match lookup("BOT_POLL_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "BOT_POLL_TIMEOUT_SECS".into(),
                    message: format!("{raw:?}: {e}"),
                })?,
            None => 30,
        };

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            admin_ids,
            allowlist_path,
            scratch_dir,
            log_file,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
        })
    }
}

/// Parse a comma-separated list of numeric user ids.
fn parse_id_list(key: &str, raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{s:?}: {e}"),
            })
        })
        .collect()
}

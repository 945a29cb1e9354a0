//! Configuration read once at startup from environment variables.
//!
//! Required:
//!   TELOXIDE_TOKEN   - Telegram Bot API token (consumed by teloxide)
//!   ADMIN_IDS        - comma-separated admin Telegram user IDs
//!
//! Optional:
//!   CHANNEL_USERNAME - public feed channel (with @), default @lostfound_feed
//!   DB_PATH          - SQLite database file, default lostfound.sqlite
//!   LOG_FILE_PATH    - log file, default lostfound.log

use once_cell::sync::Lazy;
use std::env;

/// Admin Telegram user IDs, parsed from comma-separated ADMIN_IDS.
/// Entries that fail to parse are skipped with a warning.
pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
    let raw = env::var("ADMIN_IDS").unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                log::warn!("Ignoring malformed ADMIN_IDS entry: {}", s);
                None
            }
        })
        .collect()
});

/// Public feed channel where confirmed reports are posted.
pub static CHANNEL_USERNAME: Lazy<String> =
    Lazy::new(|| env::var("CHANNEL_USERNAME").unwrap_or_else(|_| "@lostfound_feed".to_string()));

/// SQLite database file path.
pub static DB_PATH: Lazy<String> =
    Lazy::new(|| env::var("DB_PATH").unwrap_or_else(|_| "lostfound.sqlite".to_string()));

/// Log file path for the file half of the combined logger.
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "lostfound.log".to_string()));

/// The literal a user types in an editable text field to keep its value.
pub const SKIP_MARKER: &str = "-";

/// Returns true if the user may use moderation/admin commands.
pub fn is_admin(user_id: i64) -> bool {
    ADMIN_IDS.contains(&user_id)
}

/// Self-destruct delays for transient notices.
pub mod cleanup {
    use std::time::Duration;

    /// How long user-facing success notices stay on screen (in seconds).
    pub const NOTICE_DELAY_SECS: u64 = 15;

    /// How long admin action notices stay on screen (in seconds).
    pub const ADMIN_NOTICE_DELAY_SECS: u64 = 5;

    pub fn notice_delay() -> Duration {
        Duration::from_secs(NOTICE_DELAY_SECS)
    }

    pub fn admin_notice_delay() -> Duration {
        Duration::from_secs(ADMIN_NOTICE_DELAY_SECS)
    }
}

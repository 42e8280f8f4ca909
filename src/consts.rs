//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Kie.ai API root. Overridable with `KIE_BASE_URL`.
pub const DEFAULT_KIE_BASE_URL: &str = "https://api.kie.ai/api/v1";

/// Model name the watermark remover is registered under.
pub const WATERMARK_MODEL: &str = "sora-watermark-remover";

/// Poll budget: 60 attempts × 2s = 2 minutes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default chat command prefix.
pub const DEFAULT_PREFIX: &str = "!";

/// Attachment name used when relaying a clean video into chat.
pub const CLEAN_FILENAME: &str = "soragiri_clean.mp4";

/// Default history database path: `~/.soragiri/history.db`.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".soragiri").join("history.db"))
}

/// Format milliseconds for humans (e.g. `850ms`, `12.4s`, `2m 03s`).
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

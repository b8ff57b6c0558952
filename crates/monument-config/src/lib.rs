//! # monument-config
//!
//! The environment/CLI configuration surface (spec §6's "representative"
//! variable list, EXPANDED with the rest of what the server needs to
//! start). Every field has a `clap`-derived flag with an environment
//! variable fallback, following the connection/env-var fallback pattern
//! this workspace already uses for transport configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Server-wide configuration, parsed once at startup.
#[derive(Debug, Clone, Parser)]
#[command(name = "monument", about = "Multi-agent BSP simulation server over a shared 2-D pixel grid")]
pub struct Config {
    /// Directory holding one `{namespace}.db` file per namespace.
    #[arg(long, env = "DATA_DIR", default_value = "data/sims")]
    pub data_dir: PathBuf,

    /// Address the HTTP/WS server binds to.
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: SocketAddr,

    /// Per-tick COLLECT deadline, in milliseconds, before the engine
    /// synthesizes `TIMEOUT` rows for actors that have not submitted.
    #[arg(long, env = "MAX_COLLECT_TIMEOUT_MS", default_value_t = 30_000)]
    pub max_collect_timeout_ms: u64,

    /// How long a store write waits for `SQLITE_BUSY` to clear before
    /// surfacing `StoreError::Busy`.
    #[arg(long, env = "STORE_BUSY_TIMEOUT_MS", default_value_t = 5_000)]
    pub store_busy_timeout_ms: u64,

    /// Namespace pauses for scoring every `scoring_interval` ticks; `0`
    /// disables scoring pauses entirely.
    #[arg(long, env = "SCORING_INTERVAL", default_value_t = 50)]
    pub scoring_interval: u64,

    /// Grid width for a namespace created with no explicit dimensions.
    #[arg(long, env = "DEFAULT_GRID_W", default_value_t = 32)]
    pub default_grid_w: u32,

    /// Grid height for a namespace created with no explicit dimensions.
    #[arg(long, env = "DEFAULT_GRID_H", default_value_t = 32)]
    pub default_grid_h: u32,

    /// Tick at which a freshly created namespace auto-pauses.
    #[arg(long, env = "DEFAULT_EPOCH", default_value_t = 1_000_000)]
    pub default_epoch: u64,

    /// Default bound on the `RECENT CHAT` HUD section when a context
    /// fetch does not override it via `chat_length`.
    #[arg(long, env = "DEFAULT_CHAT_LENGTH", default_value_t = 20)]
    pub default_chat_length: usize,

    /// Default bound on the trailing tick-result history HUD section when
    /// a context fetch does not override it via `history_length`.
    #[arg(long, env = "DEFAULT_HISTORY_LENGTH", default_value_t = 1)]
    pub default_history_length: usize,

    /// Shared secret checked against `X-Admin-Secret` on every
    /// `/sim/{ns}/admin/...` request.
    #[arg(long, env = "ADMIN_SECRET")]
    pub admin_secret: String,
}

impl Config {
    #[must_use]
    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.max_collect_timeout_ms)
    }

    #[must_use]
    pub fn store_busy_timeout(&self) -> Duration {
        Duration::from_millis(self.store_busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_required_args() {
        let cfg = Config::parse_from(["monument", "--admin-secret", "s3cret"]);
        assert_eq!(cfg.default_grid_w, 32);
        assert_eq!(cfg.scoring_interval, 50);
        assert_eq!(cfg.collect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn explicit_flag_overrides_default() {
        let cfg = Config::parse_from([
            "monument",
            "--admin-secret",
            "s3cret",
            "--scoring-interval",
            "7",
        ]);
        assert_eq!(cfg.scoring_interval, 7);
    }
}

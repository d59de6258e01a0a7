//! Logging setup for embedding services.
//!
//! The library itself only emits `tracing` events under the `mathesis_core`
//! target. [`init`] installs a stderr subscriber for callers that have none.
//!
//! `log_level` values are `EnvFilter` directives. A bare level such as
//! `"debug"` is scoped to this crate, so HTTP client internals stay quiet;
//! anything else (`"mathesis_core=debug,reqwest=warn"`) is used as written.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::CoreError;

/// Log target of every event this crate emits.
pub const CRATE_TARGET: &str = "mathesis_core";

/// Directives used when neither the caller nor `RUST_LOG` supplies any.
pub const DEFAULT_DIRECTIVES: &str = "mathesis_core=info";

/// Install the global subscriber.
///
/// With `prefer_level` the given directives win and `RUST_LOG` is only
/// consulted when they are invalid; without it `RUST_LOG` wins when set and
/// valid. Fails if a subscriber is already installed.
pub fn init(level: &str, prefer_level: bool) -> Result<(), CoreError> {
    let configured = parse_filter(level);
    let from_env = EnvFilter::try_from_default_env();

    let filter = match (prefer_level, configured, from_env) {
        (true, Ok(filter), _) | (false, _, Ok(filter)) => filter,
        (true, Err(_), Ok(filter)) | (false, Ok(filter), Err(_)) => filter,
        (_, Err(e), Err(env_err)) => {
            return Err(CoreError::Logger(format!("{e}; RUST_LOG unusable: {env_err}")));
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CoreError::Logger(format!("subscriber already installed: {e}")))
}

/// Validate `directives` and build the filter [`init`] would install.
///
/// Config loading calls this so a file that loads is a file `init` accepts.
pub fn parse_filter(directives: &str) -> Result<EnvFilter, CoreError> {
    let directives = directives.trim();
    if directives.is_empty() {
        return Err(CoreError::Logger("log filter must not be empty".into()));
    }
    let scoped = match parse_level(directives) {
        Ok(_) => format!("{CRATE_TARGET}={}", directives.to_ascii_lowercase()),
        Err(_) => directives.to_string(),
    };
    EnvFilter::try_new(&scoped)
        .map_err(|e| CoreError::Logger(format!("invalid log filter '{directives}': {e}")))
}

/// Parse a bare level name (`error` … `trace`, or `off`).
pub fn parse_level(level: &str) -> Result<LevelFilter, CoreError> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| CoreError::Logger(format!("not a log level: '{level}'")))
}

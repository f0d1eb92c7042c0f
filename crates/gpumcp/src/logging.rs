//! Structured logging setup (ambient stack: `tracing` + `tracing-subscriber`,
//! initialised once from the CLI's verbosity count).

use tracing_subscriber::EnvFilter;

/// Initialise the global `tracing` subscriber.
///
/// `-v`/`-vv`/`-vvv` raise the default level past the crate's own `info`;
/// `RUST_LOG` always takes precedence when set, layering `EnvFilter` over
/// a hardcoded default.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

//! Terminal logging using env_logger
//!
//! Logs go to stderr so the fork table on stdout stays clean. The default
//! level is `warn`; `RUST_LOG` overrides it.

use env_logger::Env;

/// Initialize logging, `verbose` raises the default level to `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env = Env::default().default_filter_or(default_level);

    // A second initialization (tests) is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

//! Log setup for the CLI.
//!
//! Logs go to stderr so stdout only carries command output.
//!
//! - `TESSERA_LOG`: filter directives or a bare level (`debug`,
//!   `tessera_migrate=trace`); defaults to `warn`
//! - `TESSERA_LOG_FORMAT`: `compact` (default) or `pretty`

use std::env;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter environment variable.
pub const LOG_ENV: &str = "TESSERA_LOG";

/// Format environment variable.
pub const LOG_FORMAT_ENV: &str = "TESSERA_LOG_FORMAT";

/// Install the global subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let result = match env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("pretty") => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "tessera logging initialized");
    }
}

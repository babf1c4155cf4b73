//! Initialize tracing in tests.
//!
//! Logs are hidden unless the test fails or runs with `--nocapture`.
//! Control verbosity with `RUST_LOG`, e.g. `RUST_LOG=debug cargo test`.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

//! Logging setup
//!
//! The library only emits through the `log` facade. Binaries pick the backend
//! by calling [`init`]; tests call [`try_init`].

pub use log::{debug, error, info, trace, warn};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Install `env_logger`, honouring `RUST_LOG` and falling back to [`DEFAULT_FILTER`]
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
        .init();
}

/// Install a test logger, ignoring one that is already installed
///
/// Test cases race to set up the global logger, so only the first one wins.
pub fn try_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

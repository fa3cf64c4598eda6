pub use env_logger::Env;
pub use log::{debug, info};

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialises `env_logger` once per process. Used by tests; binaries
/// build their own logger.
pub fn init_logger() {
  INIT_LOGGER.call_once(|| {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
      .is_test(true)
      .try_init();
  });
}

pub mod config;
pub mod event_stream;
pub mod hub;
pub mod ledger;
pub mod supervisor;

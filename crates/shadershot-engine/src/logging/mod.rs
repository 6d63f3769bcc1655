//! Logging setup.
//!
//! Initialization for the standard `log` facade. Diagnostics the tool emits
//! for its callers (compiler output, fatal errors) go straight to stderr and
//! never pass through here; logging covers the operational trail only.

mod init;

pub use init::{init_logging, LoggingConfig};

//! The `logger` module installs the tracing subscriber and swaps its filter
//! once settings are known. See `bin/logger_demo.rs` for a manual check.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};

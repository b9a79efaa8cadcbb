//! The `settings` module loads the TOML settings file and the `FEEDGATE__*`
//! environment overlay. See `bin/settings_demo.rs` for a manual check.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

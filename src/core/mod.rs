//! Core application functionality
//!
//! Errors shared by the library, plus the configuration, CLI and runner
//! used by the binary.

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;
pub mod settings;

// Re-export commonly used items
pub use cli::CliArgs;
pub use errors::{Error, Result};
pub use runner::run_app;
pub use settings::Settings;

//! CLI command implementations for procstat-check.
//!
//! - `config`: Configuration file generation

pub mod config;

// Re-export command functions
pub use config::command_config;

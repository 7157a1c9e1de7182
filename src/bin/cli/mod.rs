//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: command execution
//! - output: tables, summaries and progress display

pub mod args;
pub mod commands;
pub mod output;

// Re-export commonly used items for convenience
pub use args::*;
pub use commands::*;

//! Application layer - use cases and presentation

pub mod commands;
pub mod status_display;

pub use commands::{Cli, Commands, CommandExecutor};
pub use status_display::StatusDisplay;

//! Command-line interface for media-intake.
//!
//! Commands for classifying, probing, scanning and importing media files,
//! plus the strategy and verification primitives on their own.

mod commands;

pub use commands::{Cli, Commands, run_command};

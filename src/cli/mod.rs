//! Command-line interface for unheard.
//!
//! This module provides commands for syncing the catalog mirror, reporting
//! statistics, and playing and rating unheard tracks.

mod commands;

pub use commands::{Cli, Commands, run_command};

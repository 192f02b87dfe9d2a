//! Unheard - find and rate the music you have never listened to.
//!
//! Mirrors the artists of your playlists, their albums, and (lazily) their
//! tracks into a local catalog, then plays random unrated tracks on your
//! active device and records how you rate them.

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod playback;
pub mod rating;
pub mod selector;
pub mod spotify;
pub mod stats;
pub mod sync;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("unheard=info".parse()?))
        .init();

    cli::run_command(&args)
}

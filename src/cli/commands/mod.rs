//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule for maintainability:
//! - `catalog`: Catalog sync, statistics, and track picking
//! - `play`: Playback, queueing, rating, and the interactive session

mod catalog;
mod play;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::auth::{self, AuthHandle, TokenRefresher};
use crate::config::{self, Config};
use crate::db;
use crate::error::Error;
use crate::playback::PlaybackController;
use crate::selector::TrackSelector;
use crate::spotify::SpotifyClient;
use crate::sync::CatalogSync;

pub use catalog::{cmd_pick, cmd_stats, cmd_sync};
pub use play::{cmd_play, cmd_queue, cmd_rate, cmd_recent, cmd_session};

/// Unheard CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/unheard/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Catalog database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Web API client ID (or set SPOTIFY_CLIENT_ID env var)
    #[arg(long, env = "SPOTIFY_CLIENT_ID", global = true, hide_env_values = true)]
    pub client_id: Option<String>,
    /// Web API client secret (or set SPOTIFY_CLIENT_SECRET env var)
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,
    /// Refresh token of the account (or set SPOTIFY_REFRESH_TOKEN env var)
    #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", global = true, hide_env_values = true)]
    pub refresh_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Discover artists from your playlists and list their albums
    Sync,
    /// Show rated/unrated counts and remaining listening time
    Stats,
    /// Print random unrated tracks without playing them
    Pick {
        /// Number of tracks
        #[arg(default_value = "5")]
        count: usize,
    },
    /// Play one random unrated track
    Play,
    /// Queue random unrated tracks and skip ahead to the first
    Queue {
        /// Number of tracks
        #[arg(default_value = "1")]
        count: usize,
    },
    /// Rate a track
    Rate {
        /// Track ID
        track_id: String,
        /// nope, maybeAnotherTime, mediocre, good, absolutely
        rating: String,
    },
    /// List unrated tracks played in the last 30 minutes
    Recent,
    /// Play and rate unheard tracks one after another
    Session,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Sync => cmd_sync(&rt, cli),
        Commands::Stats => cmd_stats(&rt, cli),
        Commands::Pick { count } => cmd_pick(&rt, cli, *count),
        Commands::Play => cmd_play(&rt, cli),
        Commands::Queue { count } => cmd_queue(&rt, cli, *count),
        Commands::Rate { track_id, rating } => cmd_rate(&rt, cli, track_id, rating),
        Commands::Recent => cmd_recent(&rt, cli),
        Commands::Session => cmd_session(&rt, cli),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the config file and apply command-line/env overrides.
pub(crate) fn load_config(cli: &Cli) -> Config {
    let mut config = match cli.config {
        Some(ref path) => config::load_from(path),
        None => config::load(),
    };

    let credentials = &mut config.credentials;
    if cli.client_id.is_some() {
        credentials.client_id = cli.client_id.clone();
    }
    if cli.client_secret.is_some() {
        credentials.client_secret = cli.client_secret.clone();
    }
    if cli.refresh_token.is_some() {
        credentials.refresh_token = cli.refresh_token.clone();
    }
    if cli.db.is_some() {
        config.database.path = cli.db.clone();
    }
    config
}

/// Open (and migrate) the catalog database.
pub(crate) async fn open_store(config: &Config) -> anyhow::Result<SqlitePool> {
    let path = config
        .database
        .path
        .clone()
        .unwrap_or_else(config::default_db_path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(Error::from)?;
    }

    debug!("Opening catalog at {:?}", path);
    Ok(db::init_db(&db::db_url(Some(&path))).await?)
}

/// Everything a remote-facing command needs.
pub(crate) struct Session {
    pub config: Config,
    pub pool: SqlitePool,
    pub sync: CatalogSync,
    pub selector: TrackSelector,
    pub controller: PlaybackController,
    refresh_task: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}

/// Authenticate, then wire the client into sync, selection, and playback.
pub(crate) async fn connect(config: Config) -> anyhow::Result<Session> {
    let credentials = &config.credentials;
    let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
        credentials.client_id.as_deref(),
        credentials.client_secret.as_deref(),
        credentials.refresh_token.as_deref(),
    ) else {
        return Err(Error::config(
            "client ID, client secret, and refresh token are required \
             (set SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET, SPOTIFY_REFRESH_TOKEN)",
        )
        .into());
    };

    let pool = open_store(&config).await?;

    let auth = AuthHandle::empty();
    let refresher = Arc::new(TokenRefresher::new(
        &config.api.accounts_url,
        client_id,
        client_secret,
        refresh_token,
    ));
    auth::refresh_now(refresher.as_ref(), &auth)
        .await
        .map_err(|e| Error::from(e).context("Initial token refresh"))?;
    let refresh_task =
        auth::spawn_refresh_task(refresher, auth.clone(), config.auth.refresh_interval());
    info!("Authenticated");

    let client = Arc::new(
        SpotifyClient::new(&config.api.base_url, auth)
            .with_device(config.playback.device_id.clone())
            .with_staging_playlist(config.playback.staging_playlist_id.clone()),
    );
    let sync = CatalogSync::new(pool.clone(), client.clone());
    let selector = TrackSelector::new(sync.clone(), &config.selector);
    let controller = PlaybackController::new(client, &config.playback);

    Ok(Session {
        config,
        pool,
        sync,
        selector,
        controller,
        refresh_task,
    })
}

//! Incremental catalog sync.
//!
//! Expands the local mirror one level at a time:
//! 1. Artists are discovered from the user's playlists
//! 2. An artist's albums are listed once (`albums_listed`)
//! 3. An album's tracks are listed lazily, the first time the album is needed
//!
//! A listed node is never crawled again. Saves are best-effort: a row that
//! fails to persist is logged, recorded in the [`BatchReport`], and skipped.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db;
use crate::error::{Result, ResultExt};
use crate::model::{Album, Artist, Track};
use crate::spotify::{CatalogApi, RemoteArtist, collect_pages};

/// A row that could not be saved during a bulk sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    /// Remote ID of the entity
    pub id: String,
    pub error: String,
}

/// Outcome of a best-effort bulk save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<T> {
    pub saved: Vec<T>,
    pub failures: Vec<SaveFailure>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            saved: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    /// Fold one save result into the report.
    fn record<E: std::fmt::Display>(&mut self, id: &str, result: std::result::Result<T, E>) {
        match result {
            Ok(item) => self.saved.push(item),
            Err(e) => {
                warn!("Failed to save {}: {}", id, e);
                self.failures.push(SaveFailure {
                    id: id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sync engine over a catalog store and a remote catalog.
#[derive(Clone)]
pub struct CatalogSync {
    pool: SqlitePool,
    api: Arc<dyn CatalogApi>,
}

impl CatalogSync {
    pub fn new(pool: SqlitePool, api: Arc<dyn CatalogApi>) -> Self {
        Self { pool, api }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Discover artists from the user's playlists.
    ///
    /// Each playlist track contributes its primary artist. Artists already
    /// stored are left as they are; only newly created ones are reported as
    /// saved. A playlist whose tracks cannot be listed is skipped.
    pub async fn sync_user_artists(&self) -> Result<BatchReport<RemoteArtist>> {
        let playlists = collect_pages(|cursor| self.api.user_playlists(cursor), |p| p.id.clone())
            .await
            .with_context("Listing playlists")?;
        info!("Found {} playlists", playlists.len());

        let mut seen_tracks = HashSet::new();
        let mut seen_artists = HashSet::new();
        let mut artists = Vec::new();

        for playlist in &playlists {
            let tracks = match collect_pages(
                |cursor| self.api.playlist_tracks(&playlist.id, cursor),
                |t| t.id.clone(),
            )
            .await
            {
                Ok(tracks) => tracks,
                Err(e) => {
                    warn!("Skipping playlist {} ({}): {}", playlist.name, playlist.id, e);
                    continue;
                }
            };

            for track in tracks {
                if !seen_tracks.insert(track.id) {
                    continue;
                }
                if let Some(artist) = track.artists.into_iter().next()
                    && seen_artists.insert(artist.id.clone())
                {
                    artists.push(artist);
                }
            }
        }
        debug!(
            "{} distinct tracks, {} distinct artists",
            seen_tracks.len(),
            artists.len()
        );

        let mut report = BatchReport::default();
        for artist in artists {
            match db::insert_artist(&self.pool, &artist).await {
                Ok(true) => report.saved.push(artist),
                Ok(false) => {}
                Err(e) => report.record(&artist.id, Err(e)),
            }
        }
        info!(
            "Discovered {} new artists ({} failed)",
            report.saved.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// List an artist's albums once.
    ///
    /// No-op for an artist whose albums are already listed. Albums are
    /// deduplicated by name so editions of the same release collapse.
    pub async fn sync_artist_albums(&self, artist: &Artist) -> Result<BatchReport<Album>> {
        if artist.albums_listed {
            return Ok(BatchReport::default());
        }

        let albums = collect_pages(
            |cursor| self.api.artist_albums(&artist.id, cursor),
            |a| a.name.clone(),
        )
        .await
        .with_context(format!("Listing albums of {}", artist.name))?;

        let mut report = BatchReport::default();
        for album in &albums {
            report.record(&album.id, db::insert_album(&self.pool, album, &artist.id).await);
        }

        db::mark_artist_albums_listed(&self.pool, &artist.id)
            .await
            .with_context(format!("Marking {} as listed", artist.name))?;

        info!(
            "Listed {} albums for {} ({} failed)",
            report.saved.len(),
            artist.name,
            report.failures.len()
        );
        Ok(report)
    }

    /// List albums of every artist not yet listed, then return all albums.
    ///
    /// Calling this again with no new artists makes no remote calls. An
    /// artist whose listing fails stays unlisted and is retried next time.
    pub async fn sync_all_artists(&self) -> Result<Vec<Album>> {
        let artists = db::get_all_artists(&self.pool).await?;
        let pending: Vec<_> = artists.iter().filter(|a| !a.albums_listed).collect();
        if !pending.is_empty() {
            info!("Listing albums for {} artists", pending.len());
        }

        for artist in pending {
            if let Err(e) = self.sync_artist_albums(artist).await {
                warn!("Skipping artist {} ({}): {}", artist.name, artist.id, e);
            }
        }

        Ok(db::get_all_albums(&self.pool).await?)
    }

    /// List an album's tracks once.
    ///
    /// No-op for an album whose tracks are already listed. The cached count
    /// is the remote track count; the duration covers the tracks saved.
    pub async fn sync_album_tracks(&self, album: &Album) -> Result<BatchReport<Track>> {
        if album.tracks_listed {
            return Ok(BatchReport::default());
        }

        let tracks = collect_pages(
            |cursor| self.api.album_tracks(&album.id, cursor),
            |t| t.id.clone(),
        )
        .await
        .with_context(format!("Listing tracks of {}", album.name))?;

        let mut report = BatchReport::default();
        for track in &tracks {
            report.record(
                &track.id,
                db::insert_track(&self.pool, track, &album.id, &album.artist_id).await,
            );
        }

        let count = tracks.len() as i64;
        let duration_ms: i64 = report.saved.iter().map(|t| t.duration_ms).sum();
        db::mark_album_tracks_listed(&self.pool, &album.id, count, duration_ms)
            .await
            .with_context(format!("Marking {} as listed", album.name))?;

        debug!(
            "Listed {} tracks for album {} ({} failed)",
            count,
            album.name,
            report.failures.len()
        );
        Ok(report)
    }
}

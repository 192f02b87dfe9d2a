//! Test utilities and fixtures for unheard tests.
//!
//! This module provides common test helpers, remote-entity factories, and
//! database seeding to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use unheard::test_utils::{temp_db, seed_listed_album};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     seed_listed_album(&pool, "al1", &["t1", "t2"]).await;
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::model::{Album, Artist};
use crate::spotify::{RemoteAlbum, RemoteArtist, RemoteTrack};

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// # Returns
///
/// A tuple of (connection pool, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// A remote artist with references derived from its ID.
pub fn remote_artist(id: &str, name: &str) -> RemoteArtist {
    RemoteArtist {
        id: id.to_string(),
        name: name.to_string(),
        href: format!("https://api.spotify.com/v1/artists/{}", id),
        uri: format!("spotify:artist:{}", id),
    }
}

pub fn remote_album(id: &str, name: &str) -> RemoteAlbum {
    RemoteAlbum {
        id: id.to_string(),
        name: name.to_string(),
        href: format!("https://api.spotify.com/v1/albums/{}", id),
        uri: format!("spotify:album:{}", id),
    }
}

/// A remote track credited to "Test Artist".
pub fn remote_track(id: &str, name: &str, duration_ms: i64) -> RemoteTrack {
    RemoteTrack {
        duration_ms,
        ..remote_track_by(id, name, &[&remote_artist("test-artist", "Test Artist")])
    }
}

/// A remote track credited to the given artists, primary first.
pub fn remote_track_by(id: &str, name: &str, artists: &[&RemoteArtist]) -> RemoteTrack {
    RemoteTrack {
        id: id.to_string(),
        name: name.to_string(),
        href: format!("https://api.spotify.com/v1/tracks/{}", id),
        uri: format!("spotify:track:{}", id),
        duration_ms: 180_000,
        artists: artists.iter().map(|a| (*a).clone()).collect(),
    }
}

/// Inserts an artist with albums not yet listed.
pub async fn seed_artist(pool: &SqlitePool, id: &str) -> Artist {
    crate::db::insert_artist(pool, &remote_artist(id, &format!("Artist {}", id)))
        .await
        .expect("Failed to insert artist");
    crate::db::get_artist(pool, id)
        .await
        .expect("Failed to load artist")
        .expect("Artist missing after insert")
}

/// Inserts an album with tracks not yet listed.
pub async fn seed_album(pool: &SqlitePool, id: &str, artist_id: &str) -> Album {
    crate::db::insert_album(pool, &remote_album(id, &format!("Album {}", id)), artist_id)
        .await
        .expect("Failed to insert album")
}

/// Inserts an artist, an album, and its tracks, then marks the album listed.
///
/// The artist ID is `"{album_id}-artist"`; every track lasts 3 minutes.
pub async fn seed_listed_album(pool: &SqlitePool, album_id: &str, track_ids: &[&str]) -> Album {
    let artist_id = format!("{}-artist", album_id);
    seed_artist(pool, &artist_id).await;
    seed_album(pool, album_id, &artist_id).await;

    for id in track_ids {
        crate::db::insert_track(pool, &remote_track(id, &format!("Song {}", id), 180_000), album_id, &artist_id)
            .await
            .expect("Failed to insert track");
    }
    crate::db::mark_album_tracks_listed(
        pool,
        album_id,
        track_ids.len() as i64,
        track_ids.len() as i64 * 180_000,
    )
    .await
    .expect("Failed to mark album listed");

    crate::db::get_album(pool, album_id)
        .await
        .expect("Failed to load album")
        .expect("Album missing after insert")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        // Should be able to query
        let albums = crate::db::get_all_albums(&pool).await.unwrap();
        assert!(albums.is_empty());
    }

    #[tokio::test]
    async fn test_seed_listed_album() {
        let (pool, _dir) = temp_db().await;

        let album = seed_listed_album(&pool, "al1", &["t1", "t2"]).await;
        assert!(album.tracks_listed);
        assert_eq!(album.tracks_count, Some(2));
        assert_eq!(album.artist_id, "al1-artist");

        let tracks = crate::db::get_album_tracks(&pool, "al1").await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].uri, "spotify:track:t1");
    }

    #[test]
    fn test_remote_track_defaults() {
        let track = remote_track("t1", "Song", 1234);
        assert_eq!(track.duration_ms, 1234);
        assert_eq!(track.artists[0].name, "Test Artist");
    }
}

//! Trait definitions for the remote API.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses [`SpotifyClient`](super::SpotifyClient), while tests
//! substitute the mock implementations below.
//!
//! # Example
//!
//! ```ignore
//! use unheard::spotify::traits::CatalogApi;
//!
//! // In production code:
//! async fn first_page(api: &dyn CatalogApi, artist_id: &str) {
//!     let page = api.artist_albums(artist_id, None).await?;
//! }
//!
//! // In tests:
//! let api = MockCatalog::new().with_artist_albums("ar1", albums);
//! ```

use async_trait::async_trait;

use super::client::SpotifyClient;
use super::domain::{NowPlaying, Page, RemoteAlbum, RemotePlaylist, RemoteTrack, SpotifyError};

/// Cursor-paginated catalog listings.
///
/// `cursor` is `None` for the first page and the previous page's `next`
/// afterwards.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn user_playlists(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RemotePlaylist>, SpotifyError>;

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteTrack>, SpotifyError>;

    async fn artist_albums(
        &self,
        artist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteAlbum>, SpotifyError>;

    async fn album_tracks(
        &self,
        album_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteTrack>, SpotifyError>;
}

/// Commands and state of the user's active device.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    /// Start playing the track now.
    async fn start_playback(&self, track_uri: &str) -> Result<(), SpotifyError>;

    /// Append the track to the device queue.
    async fn enqueue(&self, track_uri: &str) -> Result<(), SpotifyError>;

    /// Advance to the next queued item.
    async fn skip_to_next(&self) -> Result<(), SpotifyError>;

    /// The active track, or `None` when nothing is playing.
    async fn current_playback(&self) -> Result<Option<NowPlaying>, SpotifyError>;
}

// Implement traits for the real client

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn user_playlists(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RemotePlaylist>, SpotifyError> {
        self.user_playlists(cursor).await
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteTrack>, SpotifyError> {
        self.playlist_tracks(playlist_id, cursor).await
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteAlbum>, SpotifyError> {
        self.artist_albums(artist_id, cursor).await
    }

    async fn album_tracks(
        &self,
        album_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteTrack>, SpotifyError> {
        self.album_tracks(album_id, cursor).await
    }
}

#[async_trait]
impl PlaybackApi for SpotifyClient {
    async fn start_playback(&self, track_uri: &str) -> Result<(), SpotifyError> {
        self.start_playback(track_uri).await
    }

    async fn enqueue(&self, track_uri: &str) -> Result<(), SpotifyError> {
        self.enqueue(track_uri).await
    }

    async fn skip_to_next(&self) -> Result<(), SpotifyError> {
        self.skip_to_next().await
    }

    async fn current_playback(&self) -> Result<Option<NowPlaying>, SpotifyError> {
        self.current_playback().await
    }
}

/// Track ID from a `spotify:track:{id}` URI.
pub fn track_id_from_uri(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

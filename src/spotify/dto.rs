//! Web API Data Transfer Objects
//!
//! These types match what the Web API returns for the endpoints we call.
//! DO NOT use these types outside the spotify module - convert to domain types.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api

use serde::{Deserialize, Serialize};

/// Generic paging object wrapping every listing endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Full URL of the next page, null on the last page
    pub next: Option<String>,
    pub total: Option<u32>,
}

/// Simplified artist object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Simplified album object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub href: String,
    pub uri: String,
    pub album_group: Option<String>,
}

/// Simplified or full track object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    pub uri: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<Artist>,
    /// "track" or "episode" inside playlists
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

/// Simplified playlist object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub href: String,
    pub description: Option<String>,
}

/// Playlist item wrapper (`/playlists/{id}/tracks`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistItem {
    /// Null when the track is no longer available
    pub track: Option<Track>,
    #[serde(default)]
    pub is_local: bool,
}

/// Response of `GET /me/player`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    /// "track", "episode", "ad" or "unknown"
    pub currently_playing_type: Option<String>,
    pub item: Option<Track>,
}

/// Response of the accounts token endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Body of `PUT /me/player/play`
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StartPlaybackBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PlaybackOffset>,
}

/// Start position inside a playback context
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackOffset {
    pub uri: String,
}

/// Regular error object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}

//! Internal domain models for the remote catalog and playback state.
//!
//! These types are OUR types - they don't change when the Web API changes.
//! All API responses get converted into these types via the adapter.

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page (may be empty mid-stream)
    pub items: Vec<T>,
    /// Opaque cursor for the following page, absent on the last page
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// A final page with the given items.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// A page followed by `next`.
    pub fn with_next(items: Vec<T>, next: impl Into<String>) -> Self {
        Self {
            items,
            next: Some(next.into()),
        }
    }
}

/// An artist as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtist {
    pub id: String,
    pub name: String,
    pub href: String,
    pub uri: String,
}

/// An album as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAlbum {
    pub id: String,
    pub name: String,
    pub href: String,
    pub uri: String,
}

/// A track as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub name: String,
    pub href: String,
    pub uri: String,
    pub duration_ms: i64,
    /// Credited artists, primary artist first
    pub artists: Vec<RemoteArtist>,
}

/// A playlist owned or followed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
    pub href: String,
}

/// The track currently active on the user's device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub track_id: String,
    pub track_uri: String,
    pub name: String,
    pub is_playing: bool,
    pub progress_ms: Option<i64>,
    pub duration_ms: Option<i64>,
}

/// Tokens returned by the accounts service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in_secs: u64,
    /// Present when the service rotates the refresh token
    pub refresh_token: Option<String>,
}

/// Errors from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpotifyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Access token rejected")]
    Unauthorized,

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No access token available")]
    MissingToken,
}

impl SpotifyError {
    /// Build a status error from a code and message.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

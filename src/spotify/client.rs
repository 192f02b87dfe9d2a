//! Web API HTTP client
//!
//! Handles communication with the catalog and player endpoints.
//! See: https://developer.spotify.com/documentation/web-api
//!
//! Every request reads the bearer token from the shared [`AuthHandle`] at send
//! time, so a background refresh is picked up by the next call.

use serde::de::DeserializeOwned;

use super::domain::{NowPlaying, Page, RemoteAlbum, RemotePlaylist, RemoteTrack, SpotifyError};
use super::{adapter, dto};
use crate::auth::AuthHandle;

/// Largest page size the listing endpoints accept.
const PAGE_LIMIT: u32 = 50;

/// Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
    auth: AuthHandle,
    device_id: Option<String>,
    staging_playlist_id: Option<String>,
}

impl SpotifyClient {
    /// Create a new client
    pub fn new(base_url: impl Into<String>, auth: AuthHandle) -> Self {
        let http_client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            device_id: None,
            staging_playlist_id: None,
        }
    }

    /// Send playback commands to a specific device.
    pub fn with_device(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id.filter(|d| !d.is_empty());
        self
    }

    /// Play tracks inside this playlist's context instead of as a bare URI list.
    pub fn with_staging_playlist(mut self, playlist_id: Option<String>) -> Self {
        self.staging_playlist_id = playlist_id.filter(|p| !p.is_empty());
        self
    }

    // ------------------------------------------------------------------------
    // Catalog listings
    // ------------------------------------------------------------------------

    /// `GET /me/playlists`
    pub async fn user_playlists(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RemotePlaylist>, SpotifyError> {
        let url = cursor.unwrap_or_else(|| format!("{}/me/playlists?limit={}", self.base_url, PAGE_LIMIT));
        let paging: dto::Paging<dto::Playlist> = self.get_json(&url).await?;
        Ok(adapter::to_page(paging, adapter::to_playlist))
    }

    /// `GET /playlists/{id}/tracks`
    pub async fn playlist_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteTrack>, SpotifyError> {
        let url = cursor.unwrap_or_else(|| {
            format!(
                "{}/playlists/{}/tracks?limit={}",
                self.base_url, playlist_id, PAGE_LIMIT
            )
        });
        let paging: dto::Paging<dto::PlaylistItem> = self.get_json(&url).await?;
        Ok(adapter::to_page(paging, adapter::to_playlist_track))
    }

    /// `GET /artists/{id}/albums`, studio albums only
    pub async fn artist_albums(
        &self,
        artist_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteAlbum>, SpotifyError> {
        let url = cursor.unwrap_or_else(|| {
            format!(
                "{}/artists/{}/albums?include_groups=album&limit={}",
                self.base_url, artist_id, PAGE_LIMIT
            )
        });
        let paging: dto::Paging<dto::Album> = self.get_json(&url).await?;
        Ok(adapter::to_page(paging, adapter::to_album))
    }

    /// `GET /albums/{id}/tracks`
    pub async fn album_tracks(
        &self,
        album_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<RemoteTrack>, SpotifyError> {
        let url = cursor.unwrap_or_else(|| {
            format!(
                "{}/albums/{}/tracks?limit={}",
                self.base_url, album_id, PAGE_LIMIT
            )
        });
        let paging: dto::Paging<dto::Track> = self.get_json(&url).await?;
        Ok(adapter::to_page(paging, adapter::to_track))
    }

    // ------------------------------------------------------------------------
    // Player
    // ------------------------------------------------------------------------

    /// Start playing a track now.
    ///
    /// With a staging playlist configured, the track is appended to that
    /// playlist and playback starts inside it at the track; otherwise the
    /// track is played as a single-URI list.
    pub async fn start_playback(&self, track_uri: &str) -> Result<(), SpotifyError> {
        let body = match self.staging_playlist_id {
            Some(ref playlist_id) => {
                let url = format!(
                    "{}/playlists/{}/tracks?uris={}",
                    self.base_url,
                    playlist_id,
                    urlencoding::encode(track_uri)
                );
                self.send_command(self.http_client.post(&url).body("")).await?;
                dto::StartPlaybackBody {
                    context_uri: Some(format!("spotify:playlist:{}", playlist_id)),
                    offset: Some(dto::PlaybackOffset {
                        uri: track_uri.to_string(),
                    }),
                    ..Default::default()
                }
            }
            None => dto::StartPlaybackBody {
                uris: Some(vec![track_uri.to_string()]),
                ..Default::default()
            },
        };

        let url = self.player_url("play", &[]);
        self.send_command(self.http_client.put(&url).json(&body)).await?;
        tracing::debug!("Placed {} into active playback", track_uri);
        Ok(())
    }

    /// Append a track to the device's play queue.
    pub async fn enqueue(&self, track_uri: &str) -> Result<(), SpotifyError> {
        let url = self.player_url("queue", &[("uri", track_uri)]);
        self.send_command(self.http_client.post(&url).body("")).await
    }

    /// Skip to the next item in the queue.
    pub async fn skip_to_next(&self) -> Result<(), SpotifyError> {
        let url = self.player_url("next", &[]);
        self.send_command(self.http_client.post(&url).body("")).await
    }

    /// `GET /me/player`; `None` when nothing (or no track) is playing.
    pub async fn current_playback(&self) -> Result<Option<NowPlaying>, SpotifyError> {
        let url = format!("{}/me/player", self.base_url);
        let response = self.authorized(self.http_client.get(&url))?.send().await;
        let response = response.map_err(|e| SpotifyError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let state = response
            .json::<dto::PlaybackState>()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;
        Ok(adapter::to_now_playing(state))
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn player_url(&self, action: &str, params: &[(&str, &str)]) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        if let Some(ref device_id) = self.device_id {
            query.push(format!("device_id={}", urlencoding::encode(device_id)));
        }
        if query.is_empty() {
            format!("{}/me/player/{}", self.base_url, action)
        } else {
            format!("{}/me/player/{}?{}", self.base_url, action, query.join("&"))
        }
    }

    fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, SpotifyError> {
        let bearer = self.auth.bearer()?;
        Ok(request.header(reqwest::header::AUTHORIZATION, bearer))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SpotifyError> {
        tracing::debug!("GET {}", url);
        let response = self
            .authorized(self.http_client.get(url))?
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))
    }

    /// Any 2xx (typically 200/201/204) is success; everything else is fatal.
    ///
    /// Bodiless commands pass an empty body so a `Content-Length` is sent.
    async fn send_command(&self, request: reqwest::RequestBuilder) -> Result<(), SpotifyError> {
        let response = self
            .authorized(request)?
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;
        check_status(response).await.map(|_| ())
    }
}

/// Map non-success responses onto [`SpotifyError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(SpotifyError::Unauthorized);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(SpotifyError::RateLimited);
    }

    // Try to parse error response
    if let Ok(error) = response.json::<dto::ApiError>().await {
        return Err(SpotifyError::status(error.error.status, error.error.message));
    }
    Err(SpotifyError::status(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
    ))
}

//! Remote playback control.
//!
//! Commands go to the user's active device through [`PlaybackApi`]; success
//! of a command only means the service accepted it, so the controller then
//! polls the device until it reports the requested track.
//!
//! Two ways in:
//! - [`PlaybackController::play_and_confirm`] starts the track directly and
//!   re-issues the command when the confirmation window elapses, up to
//!   `max_attempts` in total.
//! - [`PlaybackController::enqueue_and_skip_to`] appends the track to the
//!   device queue and skips forward until it is active.

mod state;

pub use state::PlaybackState;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use sqlx::SqlitePool;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::db;
use crate::error::Result;
use crate::model::{Track, TrackWithArtist};
use crate::selector::TrackSelector;
use crate::spotify::{PlaybackApi, SpotifyError};

/// How far back "recently played" reaches.
pub const RECENT_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Playback failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The service rejected a command; never retried
    #[error("Playback command for {track_id} failed: {source}")]
    Command {
        track_id: String,
        source: SpotifyError,
    },

    /// The device never reported the track
    #[error("Track {track_id} did not start after {attempts} attempts")]
    ConfirmationTimeout { track_id: String, attempts: u32 },
}

/// Drives playback requests against one device.
pub struct PlaybackController {
    api: Arc<dyn PlaybackApi>,
    max_attempts: u32,
    poll_interval: Duration,
    confirm_timeout: Duration,
    skip_ceiling: u32,
    track_end_poll: Duration,
    state: Mutex<PlaybackState>,
}

impl PlaybackController {
    pub fn new(api: Arc<dyn PlaybackApi>, config: &PlaybackConfig) -> Self {
        Self {
            api,
            max_attempts: config.max_attempts.max(1),
            poll_interval: config.poll_interval(),
            confirm_timeout: config.confirm_timeout(),
            skip_ceiling: config.skip_ceiling,
            track_end_poll: config.track_end_poll_interval(),
            state: Mutex::new(PlaybackState::Idle),
        }
    }

    /// State of the most recent request.
    pub fn state(&self) -> PlaybackState {
        *self.state.lock()
    }

    fn set_state(&self, state: PlaybackState) {
        debug!("Playback: {}", state);
        *self.state.lock() = state;
    }

    /// Start a track and wait until the device reports it.
    ///
    /// Returns the number of play commands issued.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Command`] as soon as a play command is rejected
    /// - [`PlaybackError::ConfirmationTimeout`] once every attempt's
    ///   confirmation window has elapsed
    pub async fn play_and_confirm(
        &self,
        track_id: &str,
        track_uri: &str,
    ) -> std::result::Result<u32, PlaybackError> {
        for attempt in 1..=self.max_attempts {
            self.set_state(PlaybackState::Queuing { attempt });
            if let Err(source) = self.api.start_playback(track_uri).await {
                self.set_state(PlaybackState::Failed { attempts: attempt });
                return Err(PlaybackError::Command {
                    track_id: track_id.to_string(),
                    source,
                });
            }

            self.set_state(PlaybackState::AwaitingConfirmation { attempt });
            if self.await_active(track_id).await {
                self.set_state(PlaybackState::Playing { attempts: attempt });
                info!("Playing {} (attempt {})", track_id, attempt);
                return Ok(attempt);
            }

            if attempt < self.max_attempts {
                warn!(
                    "Track {} not confirmed within {:?}, retrying",
                    track_id, self.confirm_timeout
                );
                self.set_state(PlaybackState::Retrying { attempt });
            }
        }

        self.set_state(PlaybackState::Failed {
            attempts: self.max_attempts,
        });
        Err(PlaybackError::ConfirmationTimeout {
            track_id: track_id.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Poll until the device reports `track_id` or the window elapses.
    async fn await_active(&self, track_id: &str) -> bool {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            if self.current_track_id().await.as_deref() == Some(track_id) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Active track ID; read failures count as "unknown".
    async fn current_track_id(&self) -> Option<String> {
        match self.api.current_playback().await {
            Ok(now) => now.map(|n| n.track_id),
            Err(e) => {
                warn!("Failed to read playback state: {}", e);
                None
            }
        }
    }

    /// Append a track to the device queue without waiting for it.
    pub async fn enqueue(
        &self,
        track_id: &str,
        track_uri: &str,
    ) -> std::result::Result<(), PlaybackError> {
        self.set_state(PlaybackState::Queuing { attempt: 1 });
        self.api
            .enqueue(track_uri)
            .await
            .map_err(|source| PlaybackError::Command {
                track_id: track_id.to_string(),
                source,
            })
    }

    /// Enqueue a track, then skip forward until it is the active one.
    ///
    /// A read that still shows the track from before the last skip is
    /// taken as the service lagging, not as a failed skip, so no extra skip
    /// is issued for it. Gives up after `skip_ceiling` reads and returns
    /// `Ok(false)`.
    pub async fn enqueue_and_skip_to(
        &self,
        track_id: &str,
        track_uri: &str,
    ) -> std::result::Result<bool, PlaybackError> {
        self.enqueue(track_id, track_uri).await?;
        self.set_state(PlaybackState::AwaitingConfirmation { attempt: 1 });

        let mut before_skip: Option<Option<String>> = None;
        let mut skips = 0u32;
        for read in 1..=self.skip_ceiling {
            let current = self.current_track_id().await;
            if current.as_deref() == Some(track_id) {
                self.set_state(PlaybackState::Playing { attempts: skips + 1 });
                info!("Reached {} after {} skips", track_id, skips);
                return Ok(true);
            }

            if before_skip.as_ref() == Some(&current) {
                debug!("Read {}: still on {:?}, waiting for skip", read, current);
            } else {
                self.api
                    .skip_to_next()
                    .await
                    .map_err(|source| PlaybackError::Command {
                        track_id: track_id.to_string(),
                        source,
                    })?;
                skips += 1;
                before_skip = Some(current);
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        self.set_state(PlaybackState::Failed { attempts: skips });
        warn!(
            "Gave up reaching {} after {} reads ({} skips)",
            track_id, self.skip_ceiling, skips
        );
        Ok(false)
    }

    /// Wait until the device stops reporting `track_id`.
    ///
    /// Read failures are logged and polling continues.
    pub async fn wait_for_track_end(&self, track_id: &str) {
        loop {
            match self.api.current_playback().await {
                Ok(Some(now)) if now.track_id == track_id => {}
                Ok(_) => {
                    debug!("Track {} finished", track_id);
                    return;
                }
                Err(e) => warn!("Failed to read playback state: {}", e),
            }
            tokio::time::sleep(self.track_end_poll).await;
        }
    }
}

/// Pick one unrated track, play it, and record when it started.
///
/// Returns `None` when nothing is eligible.
pub async fn play_unrated_track(
    pool: &SqlitePool,
    selector: &TrackSelector,
    controller: &PlaybackController,
) -> Result<Option<Track>> {
    let Some(mut track) = selector.select_random_unrated_tracks(1).await?.into_iter().next()
    else {
        info!("No unrated tracks to play");
        return Ok(None);
    };

    info!("Playing \"{}\"", track.name);
    controller.play_and_confirm(&track.id, &track.uri).await?;

    let now = Utc::now().timestamp_millis();
    db::set_track_played(pool, &track.id, now).await?;
    track.played_timestamp = Some(now);
    Ok(Some(track))
}

/// Unrated tracks started within [`RECENT_WINDOW`], newest first.
pub async fn recently_played_unrated(pool: &SqlitePool) -> Result<Vec<TrackWithArtist>> {
    let since = Utc::now().timestamp_millis() - RECENT_WINDOW.as_millis() as i64;
    Ok(db::get_recently_played_unrated(pool, since).await?)
}

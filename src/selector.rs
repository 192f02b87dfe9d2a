//! Random unrated-track selection.
//!
//! Two-stage sampling: a uniformly random eligible album, then a uniformly
//! random unrated track of that album. Album tracks are listed on demand the
//! first time an album is drawn. Tracks matching an omission pattern are
//! rated [`Rating::AutomaticallyOmitted`] on the spot and never returned.
//!
//! Albums are assumed to be listed already (see
//! [`CatalogSync::sync_all_artists`]); the selector only expands tracks.

use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::config::SelectorConfig;
use crate::db;
use crate::error::Result;
use crate::model::{Album, Rating, Track};
use crate::rating;
use crate::sync::CatalogSync;

/// Case-insensitive substring filter on track names.
#[derive(Debug, Clone, Default)]
pub struct OmissionFilter {
    patterns: Vec<String>,
}

impl OmissionFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Whether the name contains any pattern.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

/// Picks unrated tracks for playback.
pub struct TrackSelector {
    sync: CatalogSync,
    omit: OmissionFilter,
}

impl TrackSelector {
    pub fn new(sync: CatalogSync, config: &SelectorConfig) -> Self {
        Self {
            sync,
            omit: OmissionFilter::new(&config.omit_patterns),
        }
    }

    /// Select up to `count` distinct unrated tracks.
    pub async fn select_random_unrated_tracks(&self, count: usize) -> Result<Vec<Track>> {
        let mut rng = StdRng::from_os_rng();
        self.select_random_unrated_tracks_with(count, &mut rng).await
    }

    /// Select up to `count` distinct unrated tracks using `rng`.
    ///
    /// Returns fewer tracks when the eligible albums run out, or when a
    /// drawn album turns out to have no tracks at all. The latter aborts the
    /// whole batch rather than retrying another album, as does any failure
    /// to list or omit tracks.
    pub async fn select_random_unrated_tracks_with<R: Rng + Send>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Track>> {
        let store = self.sync.pool();
        let mut albums: Vec<Album> = db::get_eligible_albums(store).await?;
        debug!("{} eligible albums", albums.len());

        let mut picked: Vec<Track> = Vec::with_capacity(count);
        let mut picked_ids = HashSet::new();

        while picked.len() < count {
            if albums.is_empty() {
                info!("No eligible albums left");
                break;
            }
            let index = rng.random_range(0..albums.len());

            let tracks = match self.load_tracks(&mut albums[index]).await {
                Ok(tracks) => tracks,
                Err(e) => {
                    warn!("Selection aborted at album {}: {}", albums[index].name, e);
                    break;
                }
            };
            if tracks.is_empty() {
                warn!(
                    "Album {} ({}) has no tracks, aborting selection",
                    albums[index].name, albums[index].id
                );
                break;
            }

            let candidates: Vec<&Track> = tracks
                .iter()
                .filter(|t| !t.rated && !picked_ids.contains(&t.id))
                .collect();
            let Some(&track) = candidates.choose(rng) else {
                // Nothing left to draw from this album in this batch
                albums.swap_remove(index);
                continue;
            };

            if self.omit.matches(&track.name) {
                info!("Omitting \"{}\"", track.name);
                if let Err(e) =
                    rating::rate_track(store, &track.id, Rating::AutomaticallyOmitted).await
                {
                    warn!("Selection aborted omitting {}: {}", track.id, e);
                    break;
                }
                continue;
            }

            picked_ids.insert(track.id.clone());
            picked.push(track.clone());
        }

        Ok(picked)
    }

    /// Tracks of an album, listing them first if needed.
    async fn load_tracks(&self, album: &mut Album) -> Result<Vec<Track>> {
        if !album.tracks_listed {
            self.sync.sync_album_tracks(album).await?;
            album.tracks_listed = true;
        }
        Ok(db::get_album_tracks(self.sync.pool(), &album.id).await?)
    }
}

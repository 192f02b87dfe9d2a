//! Catalog statistics.
//!
//! Estimates how much of the catalog is still unheard without forcing a
//! track listing of every album: listed albums contribute exact counts,
//! unlisted albums contribute configured averages.

use chrono::{DateTime, Days, Local, TimeZone};
use tracing::debug;

use crate::config::EstimatorConfig;
use crate::db;
use crate::error::Result;
use crate::model::Album;
use crate::sync::CatalogSync;

const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;
const WEEK_MS: f64 = 7.0 * DAY_MS;
const MONTH_MS: f64 = 30.0 * DAY_MS;
const YEAR_MS: f64 = 12.0 * MONTH_MS;

/// Approximate unrated-catalog size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogEstimate {
    /// Unrated tracks (exact for listed albums, assumed otherwise)
    pub unrated_tracks: i64,
    /// Listening time of unlisted albums, from the assumed averages
    pub unrated_duration_ms: i64,
    /// All tracks (exact for listed albums, assumed otherwise)
    pub total_tracks: i64,
    pub albums: i64,
    /// Albums whose tracks are not listed yet
    pub unlisted_albums: i64,
}

impl CatalogEstimate {
    /// Fold a set of albums into an estimate.
    pub fn from_albums<'a>(
        albums: impl IntoIterator<Item = &'a Album>,
        config: &EstimatorConfig,
    ) -> Self {
        let assumed_tracks = config.assumed_tracks_per_album as i64;
        let assumed_duration = config.assumed_track_duration_ms as i64;

        albums
            .into_iter()
            .fold(Self::default(), |mut estimate, album| {
                estimate.albums += 1;
                match album.tracks_count.zip(album.unrated_tracks_count()) {
                    Some((count, unrated)) => {
                        estimate.unrated_tracks += unrated;
                        estimate.total_tracks += count;
                    }
                    None => {
                        estimate.unlisted_albums += 1;
                        estimate.unrated_tracks += assumed_tracks;
                        estimate.unrated_duration_ms += assumed_tracks * assumed_duration;
                        estimate.total_tracks += assumed_tracks;
                    }
                }
                estimate
            })
    }
}

/// Estimate plus exact rating counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStatistics {
    pub estimate: CatalogEstimate,
    pub artists: i64,
    pub rated_tracks: i64,
    /// Tracks rated since local midnight
    pub rated_today: i64,
}

/// Bring album listings up to date, then estimate the unrated catalog.
pub async fn estimate_unrated_catalog(
    sync: &CatalogSync,
    config: &EstimatorConfig,
) -> Result<CatalogEstimate> {
    let albums = sync.sync_all_artists().await?;
    let estimate = CatalogEstimate::from_albums(&albums, config);
    debug!("{:?}", estimate);
    Ok(estimate)
}

/// Full statistics as shown by `stats`.
pub async fn catalog_statistics(
    sync: &CatalogSync,
    config: &EstimatorConfig,
) -> Result<CatalogStatistics> {
    let estimate = estimate_unrated_catalog(sync, config).await?;
    let artists = db::count_artists(sync.pool(), None).await?;
    let rated_tracks = db::count_rated_tracks(sync.pool()).await?;
    let (start, end) = day_bounds_ms(Local::now());
    let rated_today = db::count_rated_between(sync.pool(), start, end).await?;

    Ok(CatalogStatistics {
        estimate,
        artists,
        rated_tracks,
        rated_today,
    })
}

/// Epoch-millisecond bounds of the local day containing `now`.
pub fn day_bounds_ms<Tz: TimeZone>(now: DateTime<Tz>) -> (i64, i64) {
    let tz = now.timezone();
    let today = now.date_naive();
    let midnight = |date: chrono::NaiveDate| {
        date.and_hms_opt(0, 0, 0)
            .and_then(|dt| tz.from_local_datetime(&dt).earliest())
            .map(|dt| dt.timestamp_millis())
    };

    let start = midnight(today).unwrap_or_else(|| now.timestamp_millis());
    let end = today
        .checked_add_days(Days::new(1))
        .and_then(midnight)
        .unwrap_or(start + DAY_MS as i64);
    (start, end)
}

/// Human-readable listening time, e.g. `"3.5 hours"`.
///
/// Picks the largest unit the duration comfortably exceeds.
pub fn format_duration(duration_ms: i64) -> String {
    let ms = duration_ms as f64;
    let (value, unit) = if ms > 2.0 * YEAR_MS {
        (ms / YEAR_MS, "years")
    } else if ms > 2.0 * MONTH_MS {
        (ms / MONTH_MS, "months")
    } else if ms > 2.0 * WEEK_MS {
        (ms / WEEK_MS, "weeks")
    } else if ms > 3.0 * DAY_MS {
        (ms / DAY_MS, "days")
    } else if ms > 2.0 * HOUR_MS {
        (ms / HOUR_MS, "hours")
    } else {
        (ms / MINUTE_MS, "minutes")
    };
    format!("{:.1} {}", value, unit)
}

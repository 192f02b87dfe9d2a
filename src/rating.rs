//! Rating recorder.
//!
//! A track moves from unrated to rated at most once. The first rating bumps
//! the owning album's `rated_tracks_count` and settles `all_tracks_rated`;
//! later ratings only replace the label and timestamp.
//!
//! The track is written before the album aggregate. If the second write is
//! lost the aggregate lags by one, which only affects selection eligibility
//! and estimates.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::error::{Error, Result};
use crate::model::{Album, Rating, Track};

/// Rate a track now.
pub async fn rate_track(pool: &SqlitePool, track_id: &str, rating: Rating) -> Result<Track> {
    rate_track_at(pool, track_id, rating, Utc::now().timestamp_millis()).await
}

/// Rate a track with an explicit timestamp (epoch millis).
///
/// # Errors
///
/// - [`Error::Invalid`] when `rating` is [`Rating::Unrated`]
/// - [`Error::NotFound`] when the track or its album is unknown
pub async fn rate_track_at(
    pool: &SqlitePool,
    track_id: &str,
    rating: Rating,
    rated_timestamp: i64,
) -> Result<Track> {
    if rating == Rating::Unrated {
        return Err(Error::invalid("a track cannot be rated back to unrated"));
    }

    let track = db::get_track(pool, track_id)
        .await?
        .ok_or_else(|| Error::not_found("Track", track_id))?;
    let album = db::get_album(pool, &track.album_id)
        .await?
        .ok_or_else(|| Error::not_found("Album", &track.album_id))?;

    let was_unrated = !track.rated;
    db::save_track_rating(pool, track_id, rating, rated_timestamp).await?;

    if was_unrated {
        let album = Album {
            rated_tracks_count: album.rated_tracks_count + 1,
            ..album
        };
        let all_tracks_rated = album.is_fully_rated();
        db::update_album_rating_aggregate(
            pool,
            &album.id,
            album.rated_tracks_count,
            all_tracks_rated,
        )
        .await?;
        if all_tracks_rated {
            info!("Album {} is now fully rated", album.name);
        }
    }

    info!("Rated \"{}\" as {}", track.name, rating);
    Ok(Track {
        rated: true,
        rating,
        rated_timestamp: Some(rated_timestamp),
        ..track
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserRating;
    use crate::test_utils::{seed_listed_album, temp_db};

    #[tokio::test]
    async fn test_first_rating_counts_once() {
        let (pool, _dir) = temp_db().await;
        seed_listed_album(&pool, "al1", &["t1", "t2"]).await;

        let track = rate_track_at(&pool, "t1", Rating::User(UserRating::Good), 10)
            .await
            .unwrap();
        assert!(track.rated);
        assert_eq!(track.rated_timestamp, Some(10));

        let album = db::get_album(&pool, "al1").await.unwrap().unwrap();
        assert_eq!(album.rated_tracks_count, 1);
        assert!(!album.all_tracks_rated);

        // Re-rating changes the label but not the count
        rate_track_at(&pool, "t1", Rating::User(UserRating::Nope), 20)
            .await
            .unwrap();
        let album = db::get_album(&pool, "al1").await.unwrap().unwrap();
        assert_eq!(album.rated_tracks_count, 1);
        let stored = db::get_track(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(stored.rating, Rating::User(UserRating::Nope));
        assert_eq!(stored.rated_timestamp, Some(20));
    }

    #[tokio::test]
    async fn test_last_rating_completes_album() {
        let (pool, _dir) = temp_db().await;
        seed_listed_album(&pool, "al1", &["t1", "t2"]).await;

        rate_track(&pool, "t1", Rating::AutomaticallyOmitted).await.unwrap();
        rate_track(&pool, "t2", Rating::User(UserRating::Absolutely)).await.unwrap();

        let album = db::get_album(&pool, "al1").await.unwrap().unwrap();
        assert_eq!(album.rated_tracks_count, 2);
        assert!(album.all_tracks_rated);
        assert!(db::get_eligible_albums(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unrated() {
        let (pool, _dir) = temp_db().await;
        seed_listed_album(&pool, "al1", &["t1"]).await;

        let result = rate_track(&pool, "t1", Rating::Unrated).await;
        assert!(matches!(result, Err(Error::Invalid(_))));
        assert!(!db::get_track(&pool, "t1").await.unwrap().unwrap().rated);
    }

    #[tokio::test]
    async fn test_unknown_track() {
        let (pool, _dir) = temp_db().await;
        let result = rate_track(&pool, "nope", Rating::AutomaticallyOmitted).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Track", .. })));
    }
}

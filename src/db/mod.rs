//! Catalog store for artist, album, and track persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Creating catalog rows from remote listings (first write wins)
//! - Marking artists/albums as listed
//! - Rating and playback bookkeeping on tracks
//! - Simple predicate queries and counts for selection and statistics
//!
//! Each call is a single statement; callers sequence them.
//!
//! # Example
//!
//! ```ignore
//! use unheard::db::{init_db, get_eligible_albums};
//!
//! let pool = init_db("sqlite:unheard.db").await?;
//! let albums = get_eligible_albums(&pool).await?;
//! ```

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{Album, Artist, Rating, Track, TrackWithArtist};
use crate::spotify::{RemoteAlbum, RemoteArtist, RemoteTrack};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "unheard.db";

const ALBUM_COLUMNS: &str = "id, name, href, uri, artist_id, tracks_listed, tracks_count, \
     tracks_duration_ms, rated_tracks_count, all_tracks_rated";

const TRACK_COLUMNS: &str = "id, name, href, uri, duration_ms, album_id, artist_id, rated, \
     rating, rated_timestamp, played_timestamp";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

// ============================================================================
// Row Types
// ============================================================================

/// Database row for the tracks table.
#[derive(Debug, sqlx::FromRow)]
struct TrackRow {
    id: String,
    name: String,
    href: String,
    uri: String,
    duration_ms: i64,
    album_id: String,
    artist_id: String,
    rated: bool,
    rating: Option<String>,
    rated_timestamp: Option<i64>,
    played_timestamp: Option<i64>,
}

impl TryFrom<TrackRow> for Track {
    type Error = sqlx::Error;

    /// Fails on a stored rating label this build does not know.
    fn try_from(row: TrackRow) -> sqlx::Result<Self> {
        let rating = match row.rating.as_deref() {
            Some(label) => label
                .parse()
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            None => Rating::Unrated,
        };
        Ok(Track {
            id: row.id,
            name: row.name,
            href: row.href,
            uri: row.uri,
            duration_ms: row.duration_ms,
            album_id: row.album_id,
            artist_id: row.artist_id,
            rated: row.rated,
            rating,
            rated_timestamp: row.rated_timestamp,
            played_timestamp: row.played_timestamp,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrackWithArtistRow {
    #[sqlx(flatten)]
    track: TrackRow,
    artist_name: String,
}

// ============================================================================
// Artists
// ============================================================================

/// Insert an artist unless it already exists.
///
/// Existing rows are left untouched so `albums_listed` is never reset.
/// Returns `true` when a new row was created.
pub async fn insert_artist(pool: &SqlitePool, artist: &RemoteArtist) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO artists (id, name, href, uri) VALUES (?, ?, ?, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(&artist.id)
    .bind(&artist.name)
    .bind(&artist.href)
    .bind(&artist.uri)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Get all artists.
pub async fn get_all_artists(pool: &SqlitePool) -> sqlx::Result<Vec<Artist>> {
    sqlx::query_as::<_, Artist>(
        "SELECT id, name, href, uri, albums_listed FROM artists ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

/// Get an artist by remote ID.
pub async fn get_artist(pool: &SqlitePool, artist_id: &str) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>("SELECT id, name, href, uri, albums_listed FROM artists WHERE id = ?")
        .bind(artist_id)
        .fetch_optional(pool)
        .await
}

/// Mark an artist's albums as listed.
pub async fn mark_artist_albums_listed(pool: &SqlitePool, artist_id: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE artists SET albums_listed = 1 WHERE id = ?")
        .bind(artist_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Count artists, optionally only those whose albums are listed.
pub async fn count_artists(pool: &SqlitePool, albums_listed: Option<bool>) -> sqlx::Result<i64> {
    let row: (i64,) = match albums_listed {
        Some(listed) => {
            sqlx::query_as("SELECT COUNT(*) FROM artists WHERE albums_listed = ?")
                .bind(listed)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT COUNT(*) FROM artists")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(row.0)
}

// ============================================================================
// Albums
// ============================================================================

/// Insert an album for an artist and return the stored row.
///
/// An album already stored (e.g. a collaboration listed under another
/// artist) keeps its original owner.
pub async fn insert_album(
    pool: &SqlitePool,
    album: &RemoteAlbum,
    artist_id: &str,
) -> sqlx::Result<Album> {
    sqlx::query(
        "INSERT INTO albums (id, name, href, uri, artist_id) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(&album.id)
    .bind(&album.name)
    .bind(&album.href)
    .bind(&album.uri)
    .bind(artist_id)
    .execute(pool)
    .await?;

    get_album(pool, &album.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Get all albums.
pub async fn get_all_albums(pool: &SqlitePool) -> sqlx::Result<Vec<Album>> {
    let sql = format!("SELECT {} FROM albums", ALBUM_COLUMNS);
    sqlx::query_as::<_, Album>(&sql).fetch_all(pool).await
}

/// Get an album by remote ID.
pub async fn get_album(pool: &SqlitePool, album_id: &str) -> sqlx::Result<Option<Album>> {
    let sql = format!("SELECT {} FROM albums WHERE id = ?", ALBUM_COLUMNS);
    sqlx::query_as::<_, Album>(&sql)
        .bind(album_id)
        .fetch_optional(pool)
        .await
}

/// Get albums of one artist.
pub async fn get_artist_albums(pool: &SqlitePool, artist_id: &str) -> sqlx::Result<Vec<Album>> {
    let sql = format!("SELECT {} FROM albums WHERE artist_id = ?", ALBUM_COLUMNS);
    sqlx::query_as::<_, Album>(&sql)
        .bind(artist_id)
        .fetch_all(pool)
        .await
}

/// Albums with at least one unrated (or unlisted) track.
pub async fn get_eligible_albums(pool: &SqlitePool) -> sqlx::Result<Vec<Album>> {
    let sql = format!("SELECT {} FROM albums WHERE all_tracks_rated = 0", ALBUM_COLUMNS);
    sqlx::query_as::<_, Album>(&sql).fetch_all(pool).await
}

/// Mark an album's tracks as listed and cache its counts.
///
/// Also settles `all_tracks_rated` against the new count.
pub async fn mark_album_tracks_listed(
    pool: &SqlitePool,
    album_id: &str,
    tracks_count: i64,
    tracks_duration_ms: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE albums SET
            tracks_listed = 1,
            tracks_count = ?1,
            tracks_duration_ms = ?2,
            all_tracks_rated = (rated_tracks_count >= ?1)
        WHERE id = ?3
        "#,
    )
    .bind(tracks_count)
    .bind(tracks_duration_ms)
    .bind(album_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Store an album's rated-track aggregate.
pub async fn update_album_rating_aggregate(
    pool: &SqlitePool,
    album_id: &str,
    rated_tracks_count: i64,
    all_tracks_rated: bool,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE albums SET rated_tracks_count = ?, all_tracks_rated = ? WHERE id = ?")
        .bind(rated_tracks_count)
        .bind(all_tracks_rated)
        .bind(album_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ============================================================================
// Tracks
// ============================================================================

/// Insert a track for an album/artist pair and return the stored row.
pub async fn insert_track(
    pool: &SqlitePool,
    track: &RemoteTrack,
    album_id: &str,
    artist_id: &str,
) -> sqlx::Result<Track> {
    sqlx::query(
        r#"
        INSERT INTO tracks (id, name, href, uri, duration_ms, album_id, artist_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(&track.id)
    .bind(&track.name)
    .bind(&track.href)
    .bind(&track.uri)
    .bind(track.duration_ms)
    .bind(album_id)
    .bind(artist_id)
    .execute(pool)
    .await?;

    get_track(pool, &track.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Get a track by remote ID.
pub async fn get_track(pool: &SqlitePool, track_id: &str) -> sqlx::Result<Option<Track>> {
    let sql = format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS);
    let row = sqlx::query_as::<_, TrackRow>(&sql)
        .bind(track_id)
        .fetch_optional(pool)
        .await?;
    row.map(Track::try_from).transpose()
}

/// Get all stored tracks of an album.
pub async fn get_album_tracks(pool: &SqlitePool, album_id: &str) -> sqlx::Result<Vec<Track>> {
    let sql = format!("SELECT {} FROM tracks WHERE album_id = ? ORDER BY rowid", TRACK_COLUMNS);
    let rows = sqlx::query_as::<_, TrackRow>(&sql)
        .bind(album_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Track::try_from).collect()
}

/// Store a rating on a track and stamp the time.
pub async fn save_track_rating(
    pool: &SqlitePool,
    track_id: &str,
    rating: Rating,
    rated_timestamp: i64,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE tracks SET rated = 1, rating = ?, rated_timestamp = ? WHERE id = ?")
        .bind(rating.as_str())
        .bind(rated_timestamp)
        .bind(track_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record that a track was started.
pub async fn set_track_played(
    pool: &SqlitePool,
    track_id: &str,
    played_timestamp: i64,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE tracks SET played_timestamp = ? WHERE id = ?")
        .bind(played_timestamp)
        .bind(track_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Count rated tracks.
pub async fn count_rated_tracks(pool: &SqlitePool) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks WHERE rated = 1")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Count rated tracks of one album.
pub async fn count_rated_album_tracks(pool: &SqlitePool, album_id: &str) -> sqlx::Result<i64> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tracks WHERE rated = 1 AND album_id = ?")
            .bind(album_id)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

/// Count tracks rated within `[start_ms, end_ms)`.
pub async fn count_rated_between(
    pool: &SqlitePool,
    start_ms: i64,
    end_ms: i64,
) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM tracks WHERE rated = 1 AND rated_timestamp >= ? AND rated_timestamp < ?",
    )
    .bind(start_ms)
    .bind(end_ms)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Unrated tracks started at or after `since_ms`, newest first.
pub async fn get_recently_played_unrated(
    pool: &SqlitePool,
    since_ms: i64,
) -> sqlx::Result<Vec<TrackWithArtist>> {
    let rows = sqlx::query_as::<_, TrackWithArtistRow>(
        r#"
        SELECT
            t.id, t.name, t.href, t.uri, t.duration_ms, t.album_id, t.artist_id,
            t.rated, t.rating, t.rated_timestamp, t.played_timestamp,
            a.name AS artist_name
        FROM tracks t
        JOIN artists a ON t.artist_id = a.id
        WHERE t.rated = 0 AND t.played_timestamp >= ?
        ORDER BY t.played_timestamp DESC
        "#,
    )
    .bind(since_ms)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(TrackWithArtist {
                track: row.track.try_into()?,
                artist_name: row.artist_name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{remote_album, remote_artist, remote_track, temp_db};

    #[tokio::test]
    async fn test_init_db_creates_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite:{}", db_path.display());

        let pool = init_db(&db_url).await.expect("Failed to init db");
        assert!(db_path.exists());

        let artists = get_all_artists(&pool).await.expect("Failed to query artists");
        assert!(artists.is_empty());
    }

    #[tokio::test]
    async fn test_insert_artist_is_first_write_wins() {
        let (pool, _dir) = temp_db().await;
        let artist = remote_artist("ar1", "Artist");

        assert!(insert_artist(&pool, &artist).await.unwrap());
        mark_artist_albums_listed(&pool, "ar1").await.unwrap();

        // Re-discovering the artist must not reset the listed flag
        assert!(!insert_artist(&pool, &artist).await.unwrap());
        let stored = get_artist(&pool, "ar1").await.unwrap().unwrap();
        assert!(stored.albums_listed);
    }

    #[tokio::test]
    async fn test_album_defaults() {
        let (pool, _dir) = temp_db().await;
        insert_artist(&pool, &remote_artist("ar1", "Artist")).await.unwrap();

        let album = insert_album(&pool, &remote_album("al1", "Album"), "ar1")
            .await
            .unwrap();
        assert_eq!(album.artist_id, "ar1");
        assert!(!album.tracks_listed);
        assert_eq!(album.tracks_count, None);
        assert_eq!(album.rated_tracks_count, 0);
        assert!(!album.all_tracks_rated);
    }

    #[tokio::test]
    async fn test_album_keeps_first_owner() {
        let (pool, _dir) = temp_db().await;
        insert_artist(&pool, &remote_artist("ar1", "One")).await.unwrap();
        insert_artist(&pool, &remote_artist("ar2", "Two")).await.unwrap();

        insert_album(&pool, &remote_album("al1", "Duets"), "ar1").await.unwrap();
        let again = insert_album(&pool, &remote_album("al1", "Duets"), "ar2").await.unwrap();
        assert_eq!(again.artist_id, "ar1");
        assert_eq!(get_all_albums(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_album_tracks_listed_settles_aggregate() {
        let (pool, _dir) = temp_db().await;
        insert_artist(&pool, &remote_artist("ar1", "Artist")).await.unwrap();
        insert_album(&pool, &remote_album("full", "Full"), "ar1").await.unwrap();
        insert_album(&pool, &remote_album("empty", "Empty"), "ar1").await.unwrap();

        mark_album_tracks_listed(&pool, "full", 3, 540_000).await.unwrap();
        mark_album_tracks_listed(&pool, "empty", 0, 0).await.unwrap();

        let full = get_album(&pool, "full").await.unwrap().unwrap();
        assert!(full.tracks_listed);
        assert_eq!(full.tracks_count, Some(3));
        assert_eq!(full.tracks_duration_ms, Some(540_000));
        assert!(!full.all_tracks_rated);

        let empty = get_album(&pool, "empty").await.unwrap().unwrap();
        assert!(empty.all_tracks_rated);

        let eligible = get_eligible_albums(&pool).await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, "full");
    }

    #[tokio::test]
    async fn test_track_rating_roundtrip() {
        let (pool, _dir) = temp_db().await;
        insert_artist(&pool, &remote_artist("ar1", "Artist")).await.unwrap();
        insert_album(&pool, &remote_album("al1", "Album"), "ar1").await.unwrap();
        let track = insert_track(&pool, &remote_track("t1", "Song", 200_000), "al1", "ar1")
            .await
            .unwrap();
        assert!(!track.rated);
        assert_eq!(track.rating, Rating::Unrated);

        save_track_rating(&pool, "t1", Rating::AutomaticallyOmitted, 42).await.unwrap();
        let rated = get_track(&pool, "t1").await.unwrap().unwrap();
        assert!(rated.rated);
        assert_eq!(rated.rating, Rating::AutomaticallyOmitted);
        assert_eq!(rated.rated_timestamp, Some(42));
        assert_eq!(count_rated_tracks(&pool).await.unwrap(), 1);
        assert_eq!(count_rated_album_tracks(&pool, "al1").await.unwrap(), 1);
        assert_eq!(count_rated_between(&pool, 0, 100).await.unwrap(), 1);
        assert_eq!(count_rated_between(&pool, 43, 100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_stored_rating_is_a_decode_error() {
        let (pool, _dir) = temp_db().await;
        insert_artist(&pool, &remote_artist("ar1", "Artist")).await.unwrap();
        insert_album(&pool, &remote_album("al1", "Album"), "ar1").await.unwrap();
        insert_track(&pool, &remote_track("t1", "Song", 1000), "al1", "ar1").await.unwrap();
        sqlx::query("UPDATE tracks SET rated = 1, rating = 'loveIt' WHERE id = 't1'")
            .execute(&pool)
            .await
            .unwrap();

        let err = get_track(&pool, "t1").await.unwrap_err();
        assert!(matches!(err, sqlx::Error::Decode(_)));
        assert!(err.to_string().contains("loveIt"));
        assert!(get_album_tracks(&pool, "al1").await.is_err());
    }

    #[tokio::test]
    async fn test_recently_played_unrated_newest_first() {
        let (pool, _dir) = temp_db().await;
        insert_artist(&pool, &remote_artist("ar1", "Artist")).await.unwrap();
        insert_album(&pool, &remote_album("al1", "Album"), "ar1").await.unwrap();
        for id in ["old", "new", "rated", "stale"] {
            insert_track(&pool, &remote_track(id, id, 1000), "al1", "ar1").await.unwrap();
        }
        set_track_played(&pool, "old", 1_000).await.unwrap();
        set_track_played(&pool, "new", 2_000).await.unwrap();
        set_track_played(&pool, "rated", 3_000).await.unwrap();
        set_track_played(&pool, "stale", 10).await.unwrap();
        save_track_rating(&pool, "rated", Rating::AutomaticallyOmitted, 3_000).await.unwrap();

        let recent = get_recently_played_unrated(&pool, 500).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|t| t.track.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(recent[0].artist_name, "Artist");
    }
}

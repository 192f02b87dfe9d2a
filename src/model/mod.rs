//! Core data models for the mirrored catalog.
//!
//! Defines the primary entities: [`Artist`], [`Album`], and [`Track`],
//! plus the [`Rating`] taxonomy recorded against tracks.
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `artists` - Artists discovered from the user's playlists
//! - `albums` - Albums of an artist, created when the artist is listed
//! - `tracks` - Tracks of an album, created when the album is listed
//!
//! All primary keys are the remote service's IDs.

use std::fmt;

use sqlx::FromRow;

/// An artist in the mirrored catalog.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Artist {
    /// Remote ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Remote API reference
    pub href: String,
    /// Remote URI
    pub uri: String,
    /// Whether the artist's albums have been crawled at least once
    pub albums_listed: bool,
}

/// An album in the mirrored catalog.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Album {
    /// Remote ID
    pub id: String,
    /// Album title
    pub name: String,
    /// Remote API reference
    pub href: String,
    /// Remote URI
    pub uri: String,
    /// Owning artist
    pub artist_id: String,
    /// Whether the album's tracks have been crawled at least once
    pub tracks_listed: bool,
    /// Number of tracks, known once listed
    pub tracks_count: Option<i64>,
    /// Summed track duration, known once listed
    pub tracks_duration_ms: Option<i64>,
    /// Tracks rated through the rating recorder
    pub rated_tracks_count: i64,
    /// `tracks_listed && rated_tracks_count >= tracks_count`
    pub all_tracks_rated: bool,
}

impl Album {
    /// Whether every track of the album is rated, given the current counters.
    pub fn is_fully_rated(&self) -> bool {
        self.tracks_listed
            && self
                .tracks_count
                .is_some_and(|count| self.rated_tracks_count >= count)
    }

    /// Tracks of this album still awaiting a rating, if the album is listed.
    pub fn unrated_tracks_count(&self) -> Option<i64> {
        self.tracks_count
            .filter(|_| self.tracks_listed)
            .map(|count| (count - self.rated_tracks_count).max(0))
    }
}

/// A track in the mirrored catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Remote ID
    pub id: String,
    /// Track title
    pub name: String,
    /// Remote API reference
    pub href: String,
    /// Remote URI (used for playback commands)
    pub uri: String,
    /// Duration in milliseconds
    pub duration_ms: i64,
    /// Owning album
    pub album_id: String,
    /// Owning artist (always equal to the album's artist)
    pub artist_id: String,
    /// Whether the track has been rated
    pub rated: bool,
    /// Current rating
    pub rating: Rating,
    /// When the rating was last recorded (epoch millis)
    pub rated_timestamp: Option<i64>,
    /// When the track was last started by us (epoch millis)
    pub played_timestamp: Option<i64>,
}

/// A track joined with its artist name, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackWithArtist {
    pub track: Track,
    pub artist_name: String,
}

/// Labels a user can assign to a track.
///
/// The exact wording is presentation only; behavior depends on
/// [`UserRating::class`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRating {
    Nope,
    MaybeAnotherTime,
    Mediocre,
    Good,
    Absolutely,
}

impl UserRating {
    /// All labels in presentation order.
    pub const ALL: [UserRating; 5] = [
        UserRating::Nope,
        UserRating::MaybeAnotherTime,
        UserRating::Absolutely,
        UserRating::Good,
        UserRating::Mediocre,
    ];

    /// Stable key used on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            UserRating::Nope => "nope",
            UserRating::MaybeAnotherTime => "maybeAnotherTime",
            UserRating::Mediocre => "mediocre",
            UserRating::Good => "good",
            UserRating::Absolutely => "absolutely",
        }
    }

    /// Label stored in the database and shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            UserRating::Nope => "NOPE",
            UserRating::MaybeAnotherTime => "maybe",
            UserRating::Mediocre => "mediocre",
            UserRating::Good => "good",
            UserRating::Absolutely => "absolutely",
        }
    }

    /// What the player should do after the user picks this label.
    pub fn class(&self) -> RatingClass {
        match self {
            UserRating::Nope | UserRating::MaybeAnotherTime | UserRating::Mediocre => {
                RatingClass::AdvanceImmediately
            }
            UserRating::Good | UserRating::Absolutely => RatingClass::LetFinish,
        }
    }
}

/// Behavior following a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingClass {
    /// Skip to the next unrated track right away
    AdvanceImmediately,
    /// Let the current track play out before moving on
    LetFinish,
}

/// Rating state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rating {
    /// Initial state
    #[default]
    Unrated,
    /// Assigned by the selector's omission filter, never by the user
    AutomaticallyOmitted,
    /// Assigned by the user
    User(UserRating),
}

impl Rating {
    /// Convert to string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Unrated => "unrated",
            Rating::AutomaticallyOmitted => "automaticallyOmitted",
            Rating::User(rating) => rating.label(),
        }
    }

    /// Behavior following this rating.
    pub fn class(&self) -> RatingClass {
        match self {
            Rating::Unrated => RatingClass::LetFinish,
            Rating::AutomaticallyOmitted => RatingClass::AdvanceImmediately,
            Rating::User(rating) => rating.class(),
        }
    }

    /// Shorthand for `class() == AdvanceImmediately`.
    pub fn advances_immediately(&self) -> bool {
        self.class() == RatingClass::AdvanceImmediately
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a rating label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rating: {0}")]
pub struct UnknownRating(pub String);

impl std::str::FromStr for Rating {
    type Err = UnknownRating;

    /// Accepts storage labels and command-line keys, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if needle.eq_ignore_ascii_case("unrated") {
            return Ok(Rating::Unrated);
        }
        if needle.eq_ignore_ascii_case("automaticallyOmitted") {
            return Ok(Rating::AutomaticallyOmitted);
        }
        UserRating::ALL
            .iter()
            .find(|r| needle.eq_ignore_ascii_case(r.key()) || needle.eq_ignore_ascii_case(r.label()))
            .map(|r| Rating::User(*r))
            .ok_or_else(|| UnknownRating(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(listed: bool, count: Option<i64>, rated: i64) -> Album {
        Album {
            id: "al".into(),
            name: "Album".into(),
            href: String::new(),
            uri: String::new(),
            artist_id: "ar".into(),
            tracks_listed: listed,
            tracks_count: count,
            tracks_duration_ms: None,
            rated_tracks_count: rated,
            all_tracks_rated: false,
        }
    }

    #[test]
    fn test_rating_roundtrip_through_storage_label() {
        for rating in [
            Rating::Unrated,
            Rating::AutomaticallyOmitted,
            Rating::User(UserRating::Nope),
            Rating::User(UserRating::MaybeAnotherTime),
            Rating::User(UserRating::Absolutely),
        ] {
            assert_eq!(rating.as_str().parse::<Rating>().unwrap(), rating);
        }
    }

    #[test]
    fn test_rating_parses_cli_keys() {
        assert_eq!(
            "maybeAnotherTime".parse::<Rating>().unwrap(),
            Rating::User(UserRating::MaybeAnotherTime)
        );
        assert_eq!("NOPE".parse::<Rating>().unwrap(), Rating::User(UserRating::Nope));
        assert!("meh".parse::<Rating>().is_err());
    }

    #[test]
    fn test_rating_classes() {
        assert!(Rating::User(UserRating::Nope).advances_immediately());
        assert!(Rating::User(UserRating::Mediocre).advances_immediately());
        assert!(Rating::AutomaticallyOmitted.advances_immediately());
        assert!(!Rating::User(UserRating::Good).advances_immediately());
        assert!(!Rating::User(UserRating::Absolutely).advances_immediately());
    }

    #[test]
    fn test_album_fully_rated_requires_listing() {
        assert!(!album(false, None, 0).is_fully_rated());
        assert!(!album(true, Some(3), 2).is_fully_rated());
        assert!(album(true, Some(3), 3).is_fully_rated());
        assert!(album(true, Some(0), 0).is_fully_rated());
    }

    #[test]
    fn test_unrated_tracks_count() {
        assert_eq!(album(false, None, 0).unrated_tracks_count(), None);
        assert_eq!(album(true, Some(10), 4).unrated_tracks_count(), Some(6));
    }
}

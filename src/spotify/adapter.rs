//! Converts Web API DTOs into domain types.
//!
//! Items the catalog cannot key (local files, unavailable tracks, artists
//! without IDs) are dropped here so callers never see them.

use super::domain::{
    NowPlaying, Page, RemoteAlbum, RemoteArtist, RemotePlaylist, RemoteTrack, TokenGrant,
};
use super::dto;

/// Convert a paging object, keeping only items the converter accepts.
pub fn to_page<D, T>(paging: dto::Paging<D>, convert: impl Fn(D) -> Option<T>) -> Page<T> {
    Page {
        items: paging.items.into_iter().filter_map(convert).collect(),
        next: paging.next.filter(|next| !next.is_empty()),
    }
}

pub fn to_artist(artist: dto::Artist) -> Option<RemoteArtist> {
    let id = artist.id?;
    Some(RemoteArtist {
        href: artist
            .href
            .unwrap_or_else(|| format!("https://api.spotify.com/v1/artists/{}", id)),
        uri: artist.uri.unwrap_or_else(|| format!("spotify:artist:{}", id)),
        name: artist.name,
        id,
    })
}

pub fn to_album(album: dto::Album) -> Option<RemoteAlbum> {
    Some(RemoteAlbum {
        id: album.id,
        name: album.name,
        href: album.href,
        uri: album.uri,
    })
}

pub fn to_track(track: dto::Track) -> Option<RemoteTrack> {
    if track.item_type.as_deref().is_some_and(|t| t != "track") {
        return None;
    }
    let id = track.id?;
    Some(RemoteTrack {
        href: track
            .href
            .unwrap_or_else(|| format!("https://api.spotify.com/v1/tracks/{}", id)),
        id,
        name: track.name,
        uri: track.uri,
        duration_ms: track.duration_ms as i64,
        artists: track.artists.into_iter().filter_map(to_artist).collect(),
    })
}

pub fn to_playlist_track(item: dto::PlaylistItem) -> Option<RemoteTrack> {
    if item.is_local {
        return None;
    }
    item.track.and_then(to_track)
}

pub fn to_playlist(playlist: dto::Playlist) -> Option<RemotePlaylist> {
    Some(RemotePlaylist {
        id: playlist.id,
        name: playlist.name,
        href: playlist.href,
    })
}

/// Only tracks count as "now playing"; episodes and ads report nothing.
pub fn to_now_playing(state: dto::PlaybackState) -> Option<NowPlaying> {
    if state.currently_playing_type.as_deref() != Some("track") {
        return None;
    }
    let track = state.item?;
    let track_id = track.id?;
    Some(NowPlaying {
        track_id,
        track_uri: track.uri,
        name: track.name,
        is_playing: state.is_playing,
        progress_ms: state.progress_ms.map(|p| p as i64),
        duration_ms: Some(track.duration_ms as i64),
    })
}

pub fn to_token_grant(response: dto::TokenResponse) -> TokenGrant {
    TokenGrant {
        access_token: response.access_token,
        expires_in_secs: response.expires_in.unwrap_or(3600),
        refresh_token: response.refresh_token,
    }
}

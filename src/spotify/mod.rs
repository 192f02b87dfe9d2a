//! Remote streaming service integration.
//!
//! # Architecture
//!
//! Same split as any external API we talk to:
//! - **Domain models** (`domain.rs`) - Our types for artists, albums, tracks, playback state
//! - **API DTOs** (`dto.rs`) - Exact Web API response shapes
//! - **Adapter** (`adapter.rs`) - Converts DTOs to domain models
//! - **Client** (`client.rs`) - HTTP client for the Web API
//! - **Traits** (`traits.rs`) - Seams for the sync engine and playback controller
//! - **Paging** (`paging.rs`) - Cursor-following collector with deduplication

pub mod adapter;
mod client;
pub mod domain;
pub mod dto;
pub mod paging;
pub mod traits;

pub use client::SpotifyClient;
pub use domain::{
    NowPlaying, Page, RemoteAlbum, RemoteArtist, RemotePlaylist, RemoteTrack, SpotifyError,
    TokenGrant,
};
pub use paging::collect_pages;
pub use traits::{CatalogApi, PlaybackApi};

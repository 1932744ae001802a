//! # Spotify Integration Module
//!
//! The catalog adapter: a typed wrapper around the Spotify Web API endpoints
//! the queue engine needs. Everything above this layer talks to the
//! [`CatalogClient`] trait, never to HTTP directly, so the engine can be driven
//! by an in-memory double in tests.
//!
//! ```text
//! SpotifyService (command surface, queue engine)
//!          ↓
//! CatalogClient trait
//!          ↓
//! SpotifyClient (reqwest, JSON)
//!          ↓
//! Spotify Web API / Accounts service
//! ```
//!
//! ## Endpoints
//!
//! - `GET /me`
//! - `GET /me/playlists`, `POST /users/{user_id}/playlists`
//! - `GET /playlists/{id}`, `GET|POST|PUT /playlists/{id}/tracks`
//! - `GET /me/player`
//! - `GET /search`, `GET /albums/{id}`, `GET /albums/{id}/tracks`
//! - `POST /api/token` (authorization code and refresh grants)
//!
//! ## Errors
//!
//! Responses are narrowed into the structs in [`crate::types`] at this
//! boundary. Non-success statuses become [`CatalogError::Status`], and a 429
//! becomes [`CatalogError::RateLimited`] carrying the `Retry-After` value.
//! The adapter never retries on its own.

pub mod auth;
mod client;

use async_trait::async_trait;

use crate::{
    error::CatalogError,
    types::{
        AlbumDetail, CreatePlaylistRequest, Paging, Playlist, PlaylistItem, PlaybackState,
        PlaylistSummary, ReorderRequest, SearchResponse, SnapshotResponse, TokenResponse, Track,
        UserProfile,
    },
};

pub use client::SpotifyClient;

/// Maximum number of URIs accepted by one add-tracks call.
pub const ADD_TRACKS_LIMIT: usize = 100;
/// Maximum page size of the playlist items endpoint.
pub const PLAYLIST_ITEMS_PAGE_SIZE: usize = 100;
/// Maximum page size of the current user's playlists endpoint.
pub const USER_PLAYLISTS_PAGE_SIZE: usize = 50;
/// Maximum page size of the album tracks endpoint.
pub const ALBUM_TRACKS_PAGE_SIZE: usize = 50;

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Typed access to the catalog. Every call except the two token grants takes
/// the bearer token of the current session.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get_me(&self, token: &str) -> CatalogResult<UserProfile>;

    async fn get_user_playlists(
        &self,
        token: &str,
        limit: usize,
        offset: usize,
    ) -> CatalogResult<Paging<Playlist>>;

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> CatalogResult<Playlist>;

    /// Reads a playlist restricted to `fields` (e.g. `tracks.total`).
    async fn get_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        fields: Option<&str>,
    ) -> CatalogResult<PlaylistSummary>;

    /// Appends at most [`ADD_TRACKS_LIMIT`] URIs to the end of the playlist.
    async fn add_tracks_to_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> CatalogResult<SnapshotResponse>;

    async fn get_playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Paging<PlaylistItem>>;

    async fn reorder_tracks_in_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        request: &ReorderRequest,
    ) -> CatalogResult<SnapshotResponse>;

    /// `Ok(None)` when nothing is playing.
    async fn get_current_playback_state(
        &self,
        token: &str,
        additional_types: &[&str],
    ) -> CatalogResult<Option<PlaybackState>>;

    async fn search(
        &self,
        token: &str,
        query: &str,
        types: &[&str],
        limit: usize,
        market: Option<&str>,
    ) -> CatalogResult<SearchResponse>;

    async fn get_album(
        &self,
        token: &str,
        album_id: &str,
        market: Option<&str>,
    ) -> CatalogResult<AlbumDetail>;

    /// One page of an album's tracks, for albums longer than the first page
    /// embedded in [`AlbumDetail`].
    async fn get_album_tracks(
        &self,
        token: &str,
        album_id: &str,
        offset: usize,
        limit: usize,
        market: Option<&str>,
    ) -> CatalogResult<Paging<Track>>;

    async fn refresh_access_token(&self, refresh_token: &str) -> CatalogResult<TokenResponse>;

    async fn authorization_code_grant(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> CatalogResult<TokenResponse>;
}

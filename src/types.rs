use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

// --- Session ---------------------------------------------------------------

/// Token endpoint response, shared by the code grant and the refresh grant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: HashSet<String>,
}

/// Code and state captured from the OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub state: String,
}

/// PKCE verifier and state nonce for one login attempt.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

// --- Catalog responses ------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    #[serde(default)]
    pub total: usize,
}

/// Subset of the playlist object requested through the `fields` filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistSummary {
    #[serde(default)]
    pub tracks: PlaylistTracksRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub range_start: usize,
    pub insert_before: usize,
    pub range_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Album reference. Local files carry an album without `id` or `uri`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A track or episode as returned by search, album and playlist endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub linked_from: Option<LinkedTrack>,
    #[serde(default)]
    pub is_playable: Option<bool>,
}

impl Track {
    /// True when either the track's own URI or the URI it was relinked from
    /// equals `uri`.
    pub fn matches_uri(&self, uri: &str) -> bool {
        self.uri == uri
            || self
                .linked_from
                .as_ref()
                .is_some_and(|linked| linked.uri == uri)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<String>,
    /// Null for items that are no longer available.
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumDetail {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub tracks: Paging<Track>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub tracks: Option<Paging<Track>>,
    #[serde(default)]
    pub albums: Option<Paging<Album>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackContextRef {
    pub uri: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Current playback state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub context: Option<PlaybackContextRef>,
    #[serde(default)]
    pub item: Option<Track>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub currently_playing_type: Option<String>,
    #[serde(default)]
    pub device: Option<Device>,
}

// --- Queue engine values ----------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePlaylistHandle {
    pub playlist_id: String,
    pub playlist_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendResult {
    pub playlist_id: String,
    pub appended_count: usize,
    /// Index of the first appended item, `None` when nothing was appended.
    pub range_start: Option<usize>,
    pub range_length: usize,
    pub snapshot_id: Option<String>,
}

/// Why the playback state could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackFetchError {
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackContext {
    pub context_uri: Option<String>,
    pub current_track_uri: Option<String>,
    /// URI the current track was relinked from, if the catalog substituted it.
    pub current_track_linked_uri: Option<String>,
    pub state: Option<PlaybackState>,
    pub error: Option<PlaybackFetchError>,
}

impl PlaybackContext {
    pub fn from_state(state: PlaybackState) -> Self {
        Self {
            context_uri: state.context.as_ref().map(|c| c.uri.clone()),
            current_track_uri: state.item.as_ref().map(|t| t.uri.clone()),
            current_track_linked_uri: state
                .item
                .as_ref()
                .and_then(|t| t.linked_from.as_ref())
                .map(|l| l.uri.clone()),
            state: Some(state),
            error: None,
        }
    }

    pub fn unavailable(error: PlaybackFetchError) -> Self {
        Self {
            context_uri: None,
            current_track_uri: None,
            current_track_linked_uri: None,
            state: None,
            error: Some(error),
        }
    }
}

/// Payload of a play-next request. Fields stay signed and optional so that
/// malformed input can be rejected with a precise message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub range_start: Option<i64>,
    #[serde(default)]
    pub range_length: Option<i64>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

impl MoveRequest {
    pub fn new(range_start: usize, range_length: usize, snapshot_id: Option<String>) -> Self {
        Self {
            range_start: Some(range_start as i64),
            range_length: Some(range_length as i64),
            snapshot_id,
        }
    }
}

impl From<&AppendResult> for MoveRequest {
    fn from(appended: &AppendResult) -> Self {
        Self {
            range_start: appended.range_start.map(|s| s as i64),
            range_length: Some(appended.range_length as i64),
            snapshot_id: appended.snapshot_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderResult {
    pub playlist_id: String,
    pub range_start: usize,
    pub range_length: usize,
    pub insert_before: usize,
    pub snapshot_id: String,
}

// --- CLI tables -------------------------------------------------------------

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    pub name: String,
    pub artists: String,
    pub released: String,
    pub id: String,
}

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use reqwest::Url;

use yfitops::{
    config::Config,
    error::{CatalogError, Result},
    service::{AuthorizationCodeSource, SpotifyService},
    spotify::{CatalogClient, CatalogResult},
    types::{
        Album, AlbumDetail, AuthorizationCode, CreatePlaylistRequest, LinkedTrack, Paging,
        Playlist, PlaylistItem, PlaylistOwner, PlaylistSummary, PlaylistTracksRef,
        PlaybackContextRef, PlaybackState, ReorderRequest, SearchResponse, SnapshotResponse,
        TokenResponse, Track, UserProfile,
    },
};

pub const USER_ID: &str = "listener";

/// Calls recorded by [`FakeCatalog`], in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetMe,
    GetUserPlaylists { limit: usize, offset: usize },
    CreatePlaylist { user_id: String, name: String, public: bool, collaborative: bool },
    GetPlaylist { playlist_id: String, fields: Option<String> },
    AddTracks { playlist_id: String, uris: Vec<String> },
    GetPlaylistTracks { playlist_id: String, offset: usize, limit: usize },
    Reorder { playlist_id: String, request: ReorderRequest },
    GetPlaybackState,
    Search { query: String },
    GetAlbum { album_id: String },
    GetAlbumTracks { album_id: String, offset: usize, limit: usize },
    Refresh { refresh_token: String },
    CodeGrant { code: String, code_verifier: String },
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Call::CreatePlaylist { .. } | Call::AddTracks { .. } | Call::Reorder { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub user: Option<UserProfile>,
    /// Playlists listed by `get_user_playlists`, in the user's order.
    pub playlists: Vec<Playlist>,
    pub items: HashMap<String, Vec<PlaylistItem>>,
    pub playback: Option<PlaybackState>,
    /// When set, the playback endpoint fails with this status.
    pub playback_failure: Option<u16>,
    /// Zero-based index of the add-tracks call that fails, and its status.
    pub fail_add_call: Option<(usize, u16)>,
    /// When set, the reorder endpoint fails with this status.
    pub reorder_failure: Option<u16>,
    /// Number of 429 responses `search` returns before succeeding.
    pub search_rate_limits: usize,
    pub retry_after: Option<u64>,
    pub search_response: SearchResponse,
    /// Track count of every album; zero serves a single-track album.
    pub album_tracks: usize,
    pub refresh_fails: bool,
    pub calls: Vec<Call>,
    add_calls: usize,
    snapshots: usize,
}

/// In-memory catalog with a mutable playlist store.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    pub state: Mutex<FakeState>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        let catalog = Self::default();
        catalog.with_state(|s| s.user = Some(profile(USER_ID)));
        catalog
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn add_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddTracks { uris, .. } => Some(uris),
                _ => None,
            })
            .collect()
    }

    fn album_tracks(&self) -> Vec<Track> {
        match self.with_state(|s| s.album_tracks) {
            0 => vec![track("spotify:track:one-more-time")],
            n => uris("album", n).iter().map(|u| track(u)).collect(),
        }
    }

    /// Registers a playlist owned by `owner` with the given track URIs.
    pub fn add_playlist(&self, id: &str, name: &str, owner: &str, uris: &[String]) {
        self.with_state(|s| {
            s.playlists.push(playlist(id, name, owner));
            s.items
                .insert(id.to_string(), uris.iter().map(|u| item(track(u))).collect());
        });
    }

    pub fn set_items(&self, playlist_id: &str, items: Vec<PlaylistItem>) {
        self.with_state(|s| {
            s.items.insert(playlist_id.to_string(), items);
        });
    }

    pub fn playlist_uris(&self, playlist_id: &str) -> Vec<String> {
        self.with_state(|s| {
            s.items
                .get(playlist_id)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.track.as_ref().map(|t| t.uri.clone()))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub fn set_playback(&self, context_uri: Option<&str>, track: Option<Track>) {
        self.with_state(|s| {
            s.playback = Some(PlaybackState {
                context: context_uri.map(|uri| PlaybackContextRef {
                    uri: uri.to_string(),
                    kind: Some("playlist".to_string()),
                }),
                item: track,
                is_playing: true,
                ..Default::default()
            });
        });
    }

    fn record(&self, call: Call) {
        self.with_state(|s| s.calls.push(call));
    }

    fn next_snapshot(state: &mut FakeState) -> String {
        state.snapshots += 1;
        format!("snapshot-{}", state.snapshots)
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn get_me(&self, _token: &str) -> CatalogResult<UserProfile> {
        self.record(Call::GetMe);
        self.with_state(|s| s.user.clone()).ok_or(CatalogError::Status {
            status: 401,
            message: "no user".to_string(),
        })
    }

    async fn get_user_playlists(
        &self,
        _token: &str,
        limit: usize,
        offset: usize,
    ) -> CatalogResult<Paging<Playlist>> {
        self.record(Call::GetUserPlaylists { limit, offset });
        Ok(self.with_state(|s| page(&s.playlists, offset, limit)))
    }

    async fn create_playlist(
        &self,
        _token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> CatalogResult<Playlist> {
        self.record(Call::CreatePlaylist {
            user_id: user_id.to_string(),
            name: request.name.clone(),
            public: request.public,
            collaborative: request.collaborative,
        });
        Ok(self.with_state(|s| {
            let id = format!("created{}", s.playlists.len() + 1);
            let created = playlist(&id, &request.name, user_id);
            s.playlists.push(created.clone());
            s.items.insert(id, Vec::new());
            created
        }))
    }

    async fn get_playlist(
        &self,
        _token: &str,
        playlist_id: &str,
        fields: Option<&str>,
    ) -> CatalogResult<PlaylistSummary> {
        self.record(Call::GetPlaylist {
            playlist_id: playlist_id.to_string(),
            fields: fields.map(str::to_string),
        });
        self.with_state(|s| {
            let items = s.items.get(playlist_id).ok_or_else(|| not_found(playlist_id))?;
            Ok(PlaylistSummary {
                tracks: PlaylistTracksRef { total: items.len() },
            })
        })
    }

    async fn add_tracks_to_playlist(
        &self,
        _token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> CatalogResult<SnapshotResponse> {
        self.record(Call::AddTracks {
            playlist_id: playlist_id.to_string(),
            uris: uris.to_vec(),
        });
        self.with_state(|s| {
            let call = s.add_calls;
            s.add_calls += 1;
            if let Some((failing, status)) = s.fail_add_call {
                if failing == call {
                    return Err(failure(status, "add failed"));
                }
            }
            let items = s
                .items
                .get_mut(playlist_id)
                .ok_or_else(|| not_found(playlist_id))?;
            items.extend(uris.iter().map(|u| item(track(u))));
            Ok(SnapshotResponse {
                snapshot_id: Self::next_snapshot(s),
            })
        })
    }

    async fn get_playlist_tracks(
        &self,
        _token: &str,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Paging<PlaylistItem>> {
        self.record(Call::GetPlaylistTracks {
            playlist_id: playlist_id.to_string(),
            offset,
            limit,
        });
        self.with_state(|s| {
            let items = s.items.get(playlist_id).ok_or_else(|| not_found(playlist_id))?;
            Ok(page(items, offset, limit))
        })
    }

    async fn reorder_tracks_in_playlist(
        &self,
        _token: &str,
        playlist_id: &str,
        request: &ReorderRequest,
    ) -> CatalogResult<SnapshotResponse> {
        self.record(Call::Reorder {
            playlist_id: playlist_id.to_string(),
            request: request.clone(),
        });
        self.with_state(|s| {
            if let Some(status) = s.reorder_failure {
                return Err(failure(status, "snapshot id does not match"));
            }
            let items = s
                .items
                .get_mut(playlist_id)
                .ok_or_else(|| not_found(playlist_id))?;
            let end = request.range_start + request.range_length;
            let block: Vec<_> = items.drain(request.range_start..end).collect();
            let at = request.insert_before.min(items.len());
            items.splice(at..at, block);
            Ok(SnapshotResponse {
                snapshot_id: Self::next_snapshot(s),
            })
        })
    }

    async fn get_current_playback_state(
        &self,
        _token: &str,
        _additional_types: &[&str],
    ) -> CatalogResult<Option<PlaybackState>> {
        self.record(Call::GetPlaybackState);
        self.with_state(|s| match s.playback_failure {
            Some(status) => Err(CatalogError::Status {
                status,
                message: "player unavailable".to_string(),
            }),
            None => Ok(s.playback.clone()),
        })
    }

    async fn search(
        &self,
        _token: &str,
        query: &str,
        _types: &[&str],
        _limit: usize,
        _market: Option<&str>,
    ) -> CatalogResult<SearchResponse> {
        self.record(Call::Search {
            query: query.to_string(),
        });
        self.with_state(|s| {
            if s.search_rate_limits > 0 {
                s.search_rate_limits -= 1;
                return Err(CatalogError::RateLimited {
                    retry_after: s.retry_after,
                });
            }
            Ok(s.search_response.clone())
        })
    }

    async fn get_album(
        &self,
        _token: &str,
        album_id: &str,
        _market: Option<&str>,
    ) -> CatalogResult<AlbumDetail> {
        self.record(Call::GetAlbum {
            album_id: album_id.to_string(),
        });
        let tracks = self.album_tracks();
        Ok(AlbumDetail {
            id: album_id.to_string(),
            name: "Discovery".to_string(),
            uri: format!("spotify:album:{album_id}"),
            album_type: Some("album".to_string()),
            release_date: Some("2001-03-12".to_string()),
            label: None,
            artists: Vec::new(),
            images: Vec::new(),
            tracks: page(&tracks, 0, 50),
        })
    }

    async fn get_album_tracks(
        &self,
        _token: &str,
        album_id: &str,
        offset: usize,
        limit: usize,
        _market: Option<&str>,
    ) -> CatalogResult<Paging<Track>> {
        self.record(Call::GetAlbumTracks {
            album_id: album_id.to_string(),
            offset,
            limit,
        });
        Ok(page(&self.album_tracks(), offset, limit))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> CatalogResult<TokenResponse> {
        self.record(Call::Refresh {
            refresh_token: refresh_token.to_string(),
        });
        if self.with_state(|s| s.refresh_fails) {
            return Err(CatalogError::Status {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        Ok(TokenResponse {
            access_token: "refreshed-token".to_string(),
            expires_in: Some(3600),
            ..Default::default()
        })
    }

    async fn authorization_code_grant(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> CatalogResult<TokenResponse> {
        self.record(Call::CodeGrant {
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
        });
        Ok(TokenResponse {
            access_token: "granted-token".to_string(),
            refresh_token: Some("granted-refresh".to_string()),
            expires_in: Some(3600),
            scope: Some("playlist-modify-private user-read-playback-state".to_string()),
            ..Default::default()
        })
    }
}

/// Answers the authorize URL with a fixed code, echoing its state unless told
/// to tamper with it.
pub struct FakeAuthorizer {
    pub code: String,
    pub tamper_state: bool,
    pub seen_urls: Mutex<Vec<String>>,
}

impl FakeAuthorizer {
    pub fn new() -> Self {
        Self {
            code: "auth-code".to_string(),
            tamper_state: false,
            seen_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn tampering() -> Self {
        Self {
            tamper_state: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl AuthorizationCodeSource for FakeAuthorizer {
    async fn obtain_authorization_code(&self, authorize_url: &str) -> Result<AuthorizationCode> {
        self.seen_urls.lock().unwrap().push(authorize_url.to_string());
        let url = Url::parse(authorize_url).unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        Ok(AuthorizationCode {
            code: self.code.clone(),
            state: if self.tamper_state {
                format!("{state}-forged")
            } else {
                state
            },
        })
    }
}

pub fn configured() -> Config {
    Config::from_lookup(|key| match key {
        "SPOTIFY_CLIENT_ID" => Some("client-id".to_string()),
        "SPOTIFY_CLIENT_SECRET" => Some("client-secret".to_string()),
        "SPOTIFY_REDIRECT_URI" => Some("http://localhost:4350/callback".to_string()),
        _ => None,
    })
}

pub fn unconfigured() -> Config {
    Config::from_lookup(|_| None)
}

/// Service without a session.
pub fn service_with(config: Config, catalog: &Arc<FakeCatalog>) -> SpotifyService {
    SpotifyService::new(config, catalog.clone(), Arc::new(FakeAuthorizer::new()))
}

/// Configured service holding a fresh session.
pub async fn logged_in(catalog: &Arc<FakeCatalog>) -> SpotifyService {
    let service = service_with(configured(), catalog);
    service
        .store_token(TokenResponse {
            access_token: "access-token".to_string(),
            refresh_token: Some("refresh-token".to_string()),
            expires_in: Some(3600),
            ..Default::default()
        })
        .await;
    service
}

pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        display_name: Some("Listener".to_string()),
        email: None,
        country: Some("DE".to_string()),
        product: Some("premium".to_string()),
        uri: Some(format!("spotify:user:{id}")),
    }
}

pub fn playlist(id: &str, name: &str, owner: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        uri: Some(format!("spotify:playlist:{id}")),
        owner: PlaylistOwner {
            id: owner.to_string(),
            display_name: None,
        },
        description: None,
        public: Some(false),
        collaborative: false,
        snapshot_id: None,
    }
}

pub fn track(uri: &str) -> Track {
    Track {
        id: uri.rsplit(':').next().map(str::to_string),
        name: format!("Track {uri}"),
        uri: uri.to_string(),
        duration_ms: Some(200_000),
        artists: Vec::new(),
        album: None::<Album>,
        linked_from: None,
        is_playable: Some(true),
    }
}

/// A regional substitute of `original_uri` served under `uri`.
pub fn relinked(uri: &str, original_uri: &str) -> Track {
    Track {
        linked_from: Some(LinkedTrack {
            id: original_uri.rsplit(':').next().map(str::to_string),
            uri: original_uri.to_string(),
        }),
        ..track(uri)
    }
}

pub fn item(track: Track) -> PlaylistItem {
    PlaylistItem {
        added_at: None,
        track: Some(track),
    }
}

pub fn uris(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("spotify:track:{prefix}{i}")).collect()
}

fn page<T: Clone>(all: &[T], offset: usize, limit: usize) -> Paging<T> {
    let items: Vec<T> = all.iter().skip(offset).take(limit).cloned().collect();
    let next = (offset + items.len() < all.len()).then(|| format!("offset={}", offset + limit));
    Paging {
        items,
        total: all.len(),
        limit,
        offset,
        next,
    }
}

/// Error the real adapter produces for `status`.
fn failure(status: u16, message: &str) -> CatalogError {
    if status == 429 {
        CatalogError::RateLimited {
            retry_after: Some(3),
        }
    } else {
        CatalogError::Status {
            status,
            message: message.to_string(),
        }
    }
}

fn not_found(playlist_id: &str) -> CatalogError {
    CatalogError::Status {
        status: 404,
        message: format!("playlist {playlist_id} not found"),
    }
}

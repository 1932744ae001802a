use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{CatalogClient, CatalogResult};
use crate::{
    config::{Config, Credentials},
    error::CatalogError,
    types::{
        AddTracksRequest, AlbumDetail, CreatePlaylistRequest, Paging, Playlist, PlaylistItem,
        PlaybackState, PlaylistSummary, ReorderRequest, SearchResponse, SnapshotResponse,
        TokenResponse, Track, UserProfile,
    },
};

/// reqwest-backed [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    pub(super) http: Client,
    pub(super) api_url: String,
    pub(super) token_url: String,
    pub(super) credentials: Option<Credentials>,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.clone(),
            token_url: config.token_url.clone(),
            credentials: config.credentials.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> CatalogResult<T> {
        let response = check_status(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

/// Turns non-success responses into [`CatalogError`]s.
pub(super) async fn check_status(response: Response) -> CatalogResult<Response> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        return Err(CatalogError::RateLimited { retry_after });
    }

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CatalogError::Status {
        status: status.as_u16(),
        message: error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
    })
}

/// Extracts the message from either the Web API error envelope
/// (`{"error": {"message": ..}}`) or the accounts service one
/// (`{"error": .., "error_description": ..}`).
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json["error"]["message"]
        .as_str()
        .or_else(|| json["error_description"].as_str())
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn get_me(&self, token: &str) -> CatalogResult<UserProfile> {
        Self::send_json(self.http.get(self.endpoint("/me")).bearer_auth(token)).await
    }

    async fn get_user_playlists(
        &self,
        token: &str,
        limit: usize,
        offset: usize,
    ) -> CatalogResult<Paging<Playlist>> {
        let request = self
            .http
            .get(self.endpoint("/me/playlists"))
            .query(&[("limit", limit), ("offset", offset)])
            .bearer_auth(token);
        Self::send_json(request).await
    }

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> CatalogResult<Playlist> {
        let request = self
            .http
            .post(self.endpoint(&format!("/users/{user_id}/playlists")))
            .bearer_auth(token)
            .json(request);
        Self::send_json(request).await
    }

    async fn get_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        fields: Option<&str>,
    ) -> CatalogResult<PlaylistSummary> {
        let mut request = self
            .http
            .get(self.endpoint(&format!("/playlists/{playlist_id}")))
            .bearer_auth(token);
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }
        Self::send_json(request).await
    }

    async fn add_tracks_to_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> CatalogResult<SnapshotResponse> {
        let request = self
            .http
            .post(self.endpoint(&format!("/playlists/{playlist_id}/tracks")))
            .bearer_auth(token)
            .json(&AddTracksRequest {
                uris: uris.to_vec(),
            });
        Self::send_json(request).await
    }

    async fn get_playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Paging<PlaylistItem>> {
        let request = self
            .http
            .get(self.endpoint(&format!("/playlists/{playlist_id}/tracks")))
            .query(&[("offset", offset), ("limit", limit)])
            .query(&[(
                "fields",
                "items(track(id,name,uri,linked_from(id,uri))),total,limit,offset,next",
            )])
            .bearer_auth(token);
        Self::send_json(request).await
    }

    async fn reorder_tracks_in_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        request: &ReorderRequest,
    ) -> CatalogResult<SnapshotResponse> {
        let request = self
            .http
            .put(self.endpoint(&format!("/playlists/{playlist_id}/tracks")))
            .bearer_auth(token)
            .json(request);
        Self::send_json(request).await
    }

    async fn get_current_playback_state(
        &self,
        token: &str,
        additional_types: &[&str],
    ) -> CatalogResult<Option<PlaybackState>> {
        let response = self
            .http
            .get(self.endpoint("/me/player"))
            .query(&[("additional_types", additional_types.join(","))])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<PlaybackState>(&body)
            .map(Some)
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }

    async fn search(
        &self,
        token: &str,
        query: &str,
        types: &[&str],
        limit: usize,
        market: Option<&str>,
    ) -> CatalogResult<SearchResponse> {
        let types = types.join(",");
        let mut request = self
            .http
            .get(self.endpoint("/search"))
            .query(&[("q", query), ("type", types.as_str())])
            .query(&[("limit", limit)])
            .bearer_auth(token);
        if let Some(market) = market {
            request = request.query(&[("market", market)]);
        }
        Self::send_json(request).await
    }

    async fn get_album(
        &self,
        token: &str,
        album_id: &str,
        market: Option<&str>,
    ) -> CatalogResult<AlbumDetail> {
        let mut request = self
            .http
            .get(self.endpoint(&format!("/albums/{album_id}")))
            .bearer_auth(token);
        if let Some(market) = market {
            request = request.query(&[("market", market)]);
        }
        Self::send_json(request).await
    }

    async fn get_album_tracks(
        &self,
        token: &str,
        album_id: &str,
        offset: usize,
        limit: usize,
        market: Option<&str>,
    ) -> CatalogResult<Paging<Track>> {
        let mut request = self
            .http
            .get(self.endpoint(&format!("/albums/{album_id}/tracks")))
            .query(&[("offset", offset), ("limit", limit)])
            .bearer_auth(token);
        if let Some(market) = market {
            request = request.query(&[("market", market)]);
        }
        Self::send_json(request).await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> CatalogResult<TokenResponse> {
        let request = self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])?;
        Self::send_json(request).await
    }

    async fn authorization_code_grant(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> CatalogResult<TokenResponse> {
        let redirect_uri = self
            .credentials
            .as_ref()
            .map(|c| c.redirect_uri.clone())
            .ok_or(CatalogError::MissingCredentials)?;
        let request = self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri.as_str()),
        ])?;
        Self::send_json(request).await
    }
}

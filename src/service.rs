//! The command surface consumed by the CLI (or any other front end).
//!
//! [`SpotifyService`] is constructed explicitly with its collaborators: the
//! configuration, a [`CatalogClient`] and an [`AuthorizationCodeSource`]. It
//! owns all mutable state of a running process: the session, the cached user
//! profile and the cached queue playlist handle. Each of those sits behind its
//! own async mutex, so concurrent callers are serialized per cache.
//!
//! The queue operations live in [`crate::queue`] as further `impl` blocks on
//! this type.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config::Config,
    error::{CatalogError, Result, ServiceError},
    management::SessionManager,
    spotify::{ALBUM_TRACKS_PAGE_SIZE, CatalogClient, auth},
    types::{
        AlbumDetail, AppendResult, AuthorizationCode, MoveRequest, QueuePlaylistHandle,
        ReorderResult, SearchResults, Session, TokenResponse, UserProfile,
    },
    utils,
};

const SEARCH_TYPES: [&str; 2] = ["track", "album"];
const SEARCH_LIMIT: usize = 20;
/// Retries granted to a rate-limited search before giving up.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 2;
const MAX_BACKOFF_SECS: u64 = 120;

/// Produces an authorization code for a prepared authorize URL, typically by
/// sending the user to a browser and capturing the redirect.
#[async_trait]
pub trait AuthorizationCodeSource: Send + Sync {
    async fn obtain_authorization_code(&self, authorize_url: &str) -> Result<AuthorizationCode>;
}

pub struct SpotifyService {
    pub(crate) config: Config,
    pub(crate) catalog: Arc<dyn CatalogClient>,
    authorizer: Arc<dyn AuthorizationCodeSource>,
    session: Mutex<SessionManager>,
    pub(crate) profile: Mutex<Option<UserProfile>>,
    pub(crate) queue_handle: Mutex<Option<QueuePlaylistHandle>>,
}

impl SpotifyService {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogClient>,
        authorizer: Arc<dyn AuthorizationCodeSource>,
    ) -> Self {
        Self {
            config,
            catalog,
            authorizer,
            session: Mutex::new(SessionManager::new()),
            profile: Mutex::new(None),
            queue_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub(crate) fn require_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ServiceError::NotConfigured)
        }
    }

    /// True when a session exists and its token is valid or was refreshed.
    pub async fn is_authenticated(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        self.ensure_access_token().await
    }

    pub async fn ensure_access_token(&self) -> bool {
        self.session
            .lock()
            .await
            .ensure_access_token(self.catalog.as_ref())
            .await
    }

    /// Current bearer token, refreshed if needed.
    pub(crate) async fn access_token(&self) -> Result<String> {
        self.require_configured()?;
        let mut session = self.session.lock().await;
        if !session.ensure_access_token(self.catalog.as_ref()).await {
            return Err(ServiceError::NotAuthenticated(
                "log in to Spotify first".to_string(),
            ));
        }
        session
            .access_token()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::NotAuthenticated("no access token".to_string()))
    }

    pub async fn store_token(&self, token: TokenResponse) {
        self.session.lock().await.store_token(token);
    }

    pub async fn restore_session(&self, session: Session) {
        *self.session.lock().await = SessionManager::with_session(session);
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.lock().await.session().cloned()
    }

    /// Drops the session together with everything cached for that user.
    pub async fn logout(&self) {
        self.session.lock().await.clear();
        self.forget_user().await;
    }

    async fn forget_user(&self) {
        *self.profile.lock().await = None;
        *self.queue_handle.lock().await = None;
    }

    /// Runs the interactive authorization flow and returns the new user's
    /// profile.
    pub async fn login(&self) -> Result<UserProfile> {
        self.require_configured()?;

        let challenge = utils::generate_pkce_challenge();
        let authorize_url = auth::authorize_url(&self.config, &challenge)?;

        tracing::info!("waiting for authorization");
        let grant = self
            .authorizer
            .obtain_authorization_code(&authorize_url)
            .await?;

        if grant.state != challenge.state {
            tracing::warn!("authorization redirect carried an unexpected state");
            return Err(ServiceError::NotAuthenticated(
                "authorization state mismatch".to_string(),
            ));
        }

        let token = self
            .catalog
            .authorization_code_grant(&grant.code, &challenge.code_verifier)
            .await
            .map_err(upstream("authorizationCodeGrant", "-"))?;

        self.store_token(token).await;
        self.forget_user().await;

        self.get_current_user().await
    }

    /// Fetches the profile of the logged in user and refreshes the cache.
    pub async fn get_current_user(&self) -> Result<UserProfile> {
        let token = self.access_token().await?;
        let profile = self
            .catalog
            .get_me(&token)
            .await
            .map_err(upstream("getMe", "-"))?;
        *self.profile.lock().await = Some(profile.clone());
        Ok(profile)
    }

    fn require_search_enabled(&self) -> Result<()> {
        if self.config.enable_search {
            Ok(())
        } else {
            Err(ServiceError::InvalidOperation(
                "Global search is currently disabled.".to_string(),
            ))
        }
    }

    /// Searches tracks and albums.
    ///
    /// A rate-limited search is retried at most [`MAX_RATE_LIMIT_RETRIES`]
    /// times, waiting as long as [`rate_limit_delay`] says between attempts.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        self.require_configured()?;
        self.require_search_enabled()?;

        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            let token = self.access_token().await?;
            let result = self
                .catalog
                .search(
                    &token,
                    query,
                    &SEARCH_TYPES,
                    SEARCH_LIMIT,
                    Some(self.config.market.as_str()),
                )
                .await;

            match result {
                Ok(response) => {
                    return Ok(SearchResults {
                        tracks: response.tracks.map(|p| p.items).unwrap_or_default(),
                        albums: response.albums.map(|p| p.items).unwrap_or_default(),
                    });
                }
                Err(CatalogError::RateLimited { retry_after }) if attempt < MAX_RATE_LIMIT_RETRIES => {
                    let delay = rate_limit_delay(retry_after, attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        "search rate limited, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(CatalogError::RateLimited { retry_after }) => {
                    tracing::error!(
                        operation = "search",
                        subject = query,
                        retries = attempt,
                        "search still rate limited, giving up"
                    );
                    return Err(ServiceError::RateLimited { retry_after });
                }
                Err(e) => return Err(upstream("search", query)(e)),
            }
        }
    }

    pub async fn get_album(&self, album_id: &str) -> Result<AlbumDetail> {
        self.require_configured()?;
        self.require_search_enabled()?;

        let album_id = album_id.trim();
        if album_id.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "album id must not be empty".to_string(),
            ));
        }
        let album_id = album_id.rsplit(':').next().unwrap_or(album_id);

        let token = self.access_token().await?;
        let market = Some(self.config.market.as_str());
        let mut album = self
            .catalog
            .get_album(&token, album_id, market)
            .await
            .map_err(upstream("getAlbum", album_id))?;

        // The album object embeds only the first page of tracks.
        while album.tracks.items.len() < album.tracks.total {
            let page = self
                .catalog
                .get_album_tracks(
                    &token,
                    album_id,
                    album.tracks.items.len(),
                    ALBUM_TRACKS_PAGE_SIZE,
                    market,
                )
                .await
                .map_err(upstream("getAlbumTracks", album_id))?;
            if page.items.is_empty() {
                break;
            }
            album.tracks.items.extend(page.items);
        }
        album.tracks.next = None;
        Ok(album)
    }

    /// Resolves (finding or creating) the queue playlist.
    pub async fn ensure_queue(&self) -> Result<QueuePlaylistHandle> {
        tracing::info!("ensure queue invoked");
        let handle = self.ensure_queue_playlist().await?;
        tracing::info!(playlist_id = %handle.playlist_id, "ensure queue completed");
        Ok(handle)
    }

    /// Appends tracks to the end of the queue playlist.
    pub async fn queue_append<S: AsRef<str>>(&self, uris: &[S]) -> Result<AppendResult> {
        tracing::info!(track_count = uris.len(), "queue append invoked");
        let handle = self.ensure_queue_playlist().await?;
        let result = self.append_tracks(&handle.playlist_id, uris).await?;
        tracing::info!(
            playlist_id = %result.playlist_id,
            appended_count = result.appended_count,
            "queue append completed"
        );
        Ok(result)
    }

    /// Moves a block of the queue playlist right behind the current track.
    pub async fn queue_play_next(&self, request: &MoveRequest) -> Result<ReorderResult> {
        tracing::info!(?request, "queue play next invoked");
        let result = self.move_block_after_current(request).await?;
        tracing::info!(
            playlist_id = %result.playlist_id,
            range_start = result.range_start,
            range_length = result.range_length,
            "queue play next completed"
        );
        Ok(result)
    }
}

/// Wait before retry number `attempt + 1` of a rate-limited request:
/// the server's `Retry-After` (at least one second) doubled per attempt,
/// capped at two minutes.
pub fn rate_limit_delay(retry_after: Option<u64>, attempt: u32) -> Duration {
    let base = retry_after.unwrap_or(1).max(1);
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(base.saturating_mul(factor).min(MAX_BACKOFF_SECS))
}

/// Logs a failed catalog call and converts it into a [`ServiceError`].
pub(crate) fn upstream<'a>(
    operation: &'static str,
    subject: &'a str,
) -> impl FnOnce(CatalogError) -> ServiceError + 'a {
    move |err| {
        tracing::error!(
            operation,
            subject,
            status = ?err.status(),
            error = %err,
            "catalog request failed"
        );
        ServiceError::upstream(operation, err)
    }
}

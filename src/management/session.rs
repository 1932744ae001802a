use std::path::Path;

use chrono::{Duration, Utc};

use crate::{
    spotify::CatalogClient,
    types::{Session, TokenResponse},
};

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Sole owner of the current session.
///
/// Created empty, filled by [`store_token`](Self::store_token) after a
/// successful code grant or refresh, and cleared when a refresh fails.
#[derive(Debug, Default)]
pub struct SessionManager {
    session: Option<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub async fn load(path: &Path) -> Result<Self, String> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;
        let session: Session = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self::with_session(session))
    }

    /// Writes the session to `path`, or removes the file when there is none.
    pub async fn persist(&self, path: &Path) -> Result<(), String> {
        let Some(session) = &self.session else {
            if path.is_file() {
                async_fs::remove_file(path)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(session).map_err(|e| e.to_string())?;
        async_fs::write(path, json)
            .await
            .map_err(|e| e.to_string())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// Stores a token response as the current session.
    ///
    /// A response without a refresh token keeps the one already held, and a
    /// missing `expires_in` counts as one hour.
    pub fn store_token(&mut self, token: TokenResponse) {
        let refresh_token = token
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| self.session.as_ref().and_then(|s| s.refresh_token.clone()));
        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let scope = match token.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => self
                .session
                .as_ref()
                .map(|s| s.scope.clone())
                .unwrap_or_default(),
        };

        self.session = Some(Session {
            access_token: token.access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in as i64),
            scope,
        });
    }

    pub fn clear(&mut self) {
        self.session = None;
    }

    pub fn needs_refresh(&self) -> bool {
        self.session.as_ref().is_some_and(|s| {
            Utc::now() >= s.expires_at - Duration::seconds(REFRESH_MARGIN_SECS)
        })
    }

    /// Makes sure a usable access token is held, refreshing it if it is about
    /// to expire. Returns `false` when there is no session or the refresh
    /// failed, in which case the session is dropped.
    pub async fn ensure_access_token(&mut self, catalog: &dyn CatalogClient) -> bool {
        let Some(session) = &self.session else {
            return false;
        };

        if !self.needs_refresh() {
            return true;
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            tracing::warn!("session expired and no refresh token is available");
            self.clear();
            return false;
        };

        tracing::info!("access token expiring soon, refreshing");
        match catalog.refresh_access_token(&refresh_token).await {
            Ok(token) => {
                self.store_token(token);
                tracing::info!("access token refreshed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh access token");
                self.clear();
                false
            }
        }
    }
}

//! Configuration management for yfitops.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the platform-specific local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in `<data_local_dir>/yfitops/`
//! 4. Built-in defaults for everything except the client credentials
//!
//! The client id, client secret and redirect URI are required together. If
//! any of them is missing the service still starts, but every catalog
//! operation fails with [`ServiceError::NotConfigured`](crate::error::ServiceError).

use std::{env, path::PathBuf};

use reqwest::Url;

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SCOPE: &str = "playlist-read-private playlist-modify-private user-read-playback-state user-read-private user-read-email";
pub const DEFAULT_MARKET: &str = "from_token";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:4350";

/// Loads environment variables from `.env` files.
///
/// Creates `<data_local_dir>/yfitops/` if needed and loads `.env` from the
/// working directory and from that directory. Neither file has to exist;
/// variables already present in the process environment are never overridden.
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    // dotenv never overrides variables that are already set, so the working
    // directory file takes precedence over the data directory one.
    let _ = dotenv::dotenv();
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Returns `<data_local_dir>/yfitops`, falling back to `./yfitops`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("yfitops");
    path
}

/// Path of the persisted session used by the CLI between invocations.
pub fn session_path() -> PathBuf {
    data_dir().join("cache/session.json")
}

/// OAuth client credentials. Only ever constructed with all three present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Option<Credentials>,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
    pub market: String,
    pub server_address: String,
    pub enable_search: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let credentials = match (
            get("SPOTIFY_CLIENT_ID"),
            get("SPOTIFY_CLIENT_SECRET"),
            get("SPOTIFY_REDIRECT_URI"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(Credentials {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        };

        let server_address = get("SERVER_ADDRESS")
            .or_else(|| {
                credentials
                    .as_ref()
                    .and_then(|c| server_address_from_redirect(&c.redirect_uri))
            })
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());

        let enable_search = get("ENABLE_SEARCH")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Self {
            credentials,
            api_url: get("SPOTIFY_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            scope: get("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            market: get("SPOTIFY_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            server_address,
            enable_search,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Path component of the redirect URI, used as the callback route.
    pub fn callback_path(&self) -> String {
        self.credentials
            .as_ref()
            .and_then(|c| Url::parse(&c.redirect_uri).ok())
            .map(|u| u.path().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/callback".to_string())
    }
}

fn server_address_from_redirect(redirect_uri: &str) -> Option<String> {
    let url = Url::parse(redirect_uri).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    let host = if host == "localhost" { "127.0.0.1" } else { host };
    Some(format!("{host}:{port}"))
}

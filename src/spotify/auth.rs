use reqwest::{RequestBuilder, Url};

use super::{CatalogResult, SpotifyClient};
use crate::{
    config::Config,
    error::{CatalogError, ServiceError},
    types::PkceChallenge,
};

impl SpotifyClient {
    /// Builds a form POST against the token endpoint, authenticated with the
    /// client id and secret in a Basic authorization header.
    pub(super) fn token_request(&self, form: &[(&str, &str)]) -> CatalogResult<RequestBuilder> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(CatalogError::MissingCredentials)?;

        Ok(self
            .http
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(form))
    }
}

/// Builds the URL the user visits to grant access.
///
/// The URL carries the PKCE challenge (S256) and the state nonce that the
/// redirect must echo back.
///
/// # Errors
///
/// `NotConfigured` without credentials, `InvalidArgument` if the configured
/// authorization URL does not parse.
pub fn authorize_url(config: &Config, challenge: &PkceChallenge) -> Result<String, ServiceError> {
    let credentials = config
        .credentials
        .as_ref()
        .ok_or(ServiceError::NotConfigured)?;

    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", credentials.redirect_uri.as_str()),
            ("code_challenge", challenge.code_challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("state", challenge.state.as_str()),
            ("scope", config.scope.as_str()),
        ],
    )
    .map_err(|e| ServiceError::InvalidArgument(format!("invalid authorization URL: {e}")))?;

    Ok(url.into())
}

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::types::{ArtistRef, AuthorizationCode, PkceChallenge};

pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random nonce echoed back by the authorization redirect.
pub fn generate_state() -> String {
    random_alphanumeric(32)
}

pub fn generate_pkce_challenge() -> PkceChallenge {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    PkceChallenge {
        code_verifier,
        code_challenge,
        state: generate_state(),
    }
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Trims every URI and drops blank ones. Order and repeats are kept.
pub fn normalize_uris<S: AsRef<str>>(uris: &[S]) -> Vec<String> {
    uris.iter()
        .map(|uri| uri.as_ref().trim())
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn playlist_uri(playlist_id: &str) -> String {
    format!("spotify:playlist:{playlist_id}")
}

/// Kinds of items the queue playlist accepts.
const QUEUEABLE_KINDS: [&str; 2] = ["track", "episode"];

/// Accepts a bare track id, a `spotify:track:` (or `spotify:episode:`) URI or
/// an `https://open.spotify.com/[intl-xx/]track/..` link and returns the URI.
///
/// Albums, playlists, artists and malformed input yield `None`.
pub fn to_track_uri(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(rest) = input.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        let (kind, id) = (parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        return queueable_uri(kind, id);
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).ok()?;
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let position = segments
            .iter()
            .position(|segment| QUEUEABLE_KINDS.contains(segment))?;
        return queueable_uri(segments[position], segments.get(position + 1)?);
    }

    queueable_uri("track", input)
}

fn queueable_uri(kind: &str, id: &str) -> Option<String> {
    let valid_id = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric());
    (QUEUEABLE_KINDS.contains(&kind) && valid_id).then(|| format!("spotify:{kind}:{id}"))
}

/// Parses the URL the browser was redirected to after authorization.
///
/// Returns `Err` with a human-readable reason when the URL does not start with
/// `redirect_uri`, when the provider reported an error, or when `code` or
/// `state` is missing.
pub fn parse_authorization_redirect(
    url: &str,
    redirect_uri: &str,
) -> Result<AuthorizationCode, String> {
    let url = url.trim();
    if !url.starts_with(redirect_uri) {
        return Err(format!("redirect does not match {redirect_uri}"));
    }

    let parsed = Url::parse(url).map_err(|e| e.to_string())?;
    let param = |name: &str| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(format!("authorization was denied: {error}"));
    }

    let code = param("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| "redirect is missing the authorization code".to_string())?;
    let state = param("state").ok_or_else(|| "redirect is missing the state parameter".to_string())?;

    Ok(AuthorizationCode { code, state })
}

pub fn summarize_artists(artists: &[ArtistRef]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_duration(duration_ms: Option<u64>) -> String {
    match duration_ms {
        Some(ms) => {
            let secs = ms / 1000;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => "-".to_string(),
    }
}

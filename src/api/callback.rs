use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};

use crate::{server::CallbackState, types::AuthorizationCode, warning};

/// Receives the OAuth redirect and hands `code` and `state` to the waiting
/// authorizer. Only the first redirect is accepted.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<CallbackState>,
) -> Html<&'static str> {
    let Some(sender) = shared_state.lock().await.take() else {
        return Html("<h4>No login is in progress.</h4>");
    };

    if let Some(error) = params.get("error") {
        warning!("Authorization was denied: {}", error);
        let _ = sender.send(Err(format!("authorization was denied: {error}")));
        return Html("<h4>Login failed.</h4>");
    }

    match (params.get("code"), params.get("state")) {
        (Some(code), Some(state)) if !code.is_empty() => {
            let _ = sender.send(Ok(AuthorizationCode {
                code: code.clone(),
                state: state.clone(),
            }));
            Html("<h2>Authentication successful.</h2><p>You can close this window.</p>")
        }
        _ => {
            let _ = sender.send(Err("redirect is missing code or state".to_string()));
            Html("<h4>Missing authorization code.</h4>")
        }
    }
}

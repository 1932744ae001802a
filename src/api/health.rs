use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::server::CallbackState;

pub async fn health(Extension(shared_state): Extension<CallbackState>) -> Json<Value> {
    let awaiting_callback = shared_state.lock().await.is_some();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "awaiting_callback": awaiting_callback
    }))
}

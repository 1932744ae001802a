//! # API Module
//!
//! HTTP endpoints served by the short-lived local server that captures the
//! OAuth redirect during `yfitops login`.
//!
//! - [`callback`] - receives `code` and `state` from the authorization
//!   redirect and forwards them to the waiting login
//! - [`health`] - reports the server version and whether a login is pending
//!
//! Both handlers share a [`CallbackState`](crate::server::CallbackState)
//! passed in as an axum `Extension`.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;

//! yfitops Library
//!
//! A Spotify queue that the Web API does not offer natively: queued tracks are
//! appended to a private playlist owned by the user and moved right behind the
//! track that is playing.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration from environment variables and `.env` files
//! - `error` - Service and catalog error types
//! - `logging` - `tracing` subscriber setup
//! - `management` - Session ownership and token refresh
//! - `queue` - Queue playlist resolution, batch append, playback lookup, reorder
//! - `server` - Authorization code capture (browser callback or pasted URL)
//! - `service` - The command surface tying everything together
//! - `spotify` - Spotify Web API client behind the `CatalogClient` trait
//! - `types` - Request, response and result types
//! - `utils` - PKCE, URI and formatting helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use yfitops::{config::Config, server::BrowserAuthorizer, service::SpotifyService, spotify::SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> yfitops::error::Result<()> {
//!     let config = Config::from_env();
//!     let service = SpotifyService::new(
//!         config.clone(),
//!         Arc::new(SpotifyClient::new(&config)),
//!         Arc::new(BrowserAuthorizer::new(&config)),
//!     );
//!     service.login().await?;
//!     let appended = service.queue_append(&["spotify:track:4uLU6hMCjMI75M1A2tKUQC"]).await?;
//!     service.queue_play_next(&(&appended).into()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod queue;
pub mod server;
pub mod service;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Found {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors: the process terminates with exit code 1 right after
/// printing.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

//! # CLI Module
//!
//! User-facing commands. Each function drives one operation of
//! [`SpotifyService`](crate::service::SpotifyService) and renders the result
//! with coloured status lines and `tabled` tables.
//!
//! ```bash
//! yfitops login                         # authorize in the browser
//! yfitops search "daft punk"            # find tracks and albums
//! yfitops queue add <uri>... --next     # queue tracks right after the current one
//! yfitops queue context                 # what is playing, and from where
//! ```
//!
//! Failures are returned to `main`, which reports them and exits non-zero
//! after saving the session.

mod auth;
mod queue;
mod search;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::{login, logout, status, whoami};
pub use queue::{queue_add, queue_context, queue_ensure, queue_play_next};
pub use search::{album, search};

/// Spinner shown while a command waits on the network.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

//! # Queue reconciliation
//!
//! Spotify has no writable per-user queue, so yfitops keeps one in a private
//! playlist owned by the user and reorders it relative to whatever is
//! currently playing:
//!
//! ```text
//! ensure_queue_playlist ─▶ append_tracks ─▶ get_playback_context ─▶ move_block_after_current
//!   (find or create)        (100 per call)    (locate current index)    (guarded reorder)
//! ```
//!
//! Every step re-reads the live playlist where it matters and threads the
//! playlist snapshot id from the append into the reorder, so edits made from
//! another device make the reorder fail upstream instead of moving the wrong
//! tracks.

mod append;
mod playback;
mod playlist;
mod reorder;

pub use reorder::plan_insert_before;

/// Name of the hidden queue playlist.
pub const QUEUE_PLAYLIST_NAME: &str = "Yfitops Queue";
pub const QUEUE_PLAYLIST_DESCRIPTION: &str =
    "Queue managed by Yfitops. Tracks queued in the app are played from here.";

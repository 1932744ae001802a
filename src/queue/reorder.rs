use crate::{
    error::{Result, ServiceError},
    service::{SpotifyService, upstream},
    types::{MoveRequest, PlaybackContext, QueuePlaylistHandle, ReorderRequest, ReorderResult},
};

/// Where a block `[range_start, range_start + range_length)` has to be
/// inserted so that it plays right after `current_index`.
///
/// With no current index the block goes to the front. When the block sits
/// before the current track, removing it shifts the current track down by
/// `range_length`, which is compensated here. The result is clamped to
/// `[0, total]`.
pub fn plan_insert_before(
    range_start: usize,
    range_length: usize,
    current_index: Option<usize>,
    total: usize,
) -> usize {
    let Some(current) = current_index else {
        return 0;
    };

    let target = current + 1;
    let target = if range_start < current {
        target.saturating_sub(range_length)
    } else {
        target
    };
    target.min(total)
}

fn validate(request: &MoveRequest) -> Result<(usize, usize)> {
    let range_start = match request.range_start {
        Some(start) if start >= 0 => start as usize,
        Some(start) => {
            return Err(ServiceError::InvalidArgument(format!(
                "range_start must be zero or greater, got {start}"
            )));
        }
        None => {
            return Err(ServiceError::InvalidArgument(
                "range_start is required".to_string(),
            ));
        }
    };

    let range_length = match request.range_length {
        Some(length) if length >= 1 => length as usize,
        Some(length) => {
            return Err(ServiceError::InvalidArgument(format!(
                "range_length must be at least 1, got {length}"
            )));
        }
        None => {
            return Err(ServiceError::InvalidArgument(
                "range_length is required".to_string(),
            ));
        }
    };

    Ok((range_start, range_length))
}

impl SpotifyService {
    /// Moves `[range_start, range_start + range_length)` of the queue playlist
    /// right behind the track that is playing now.
    ///
    /// The current track only counts when playback runs from the queue
    /// playlist itself; otherwise the block is moved to the front. The
    /// caller's snapshot id, if any, is sent along so the reorder fails if the
    /// playlist changed in the meantime.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a negative start or a length below one
    /// - `OutOfBounds` when the range does not fit the live playlist
    /// - `InvalidOperation` when the range contains the current track
    /// - `Upstream` for snapshot mismatches and other catalog failures
    pub async fn move_block_after_current(&self, request: &MoveRequest) -> Result<ReorderResult> {
        self.require_configured()?;
        let (range_start, range_length) = validate(request)?;

        let handle = self.ensure_queue_playlist().await?;
        let token = self.access_token().await?;

        let total = self.playlist_total(&token, &handle.playlist_id).await?;
        if range_start >= total || range_start + range_length > total {
            return Err(ServiceError::OutOfBounds {
                range_start,
                range_length,
                total,
            });
        }

        let playback = self.get_playback_context().await?;
        let current_index = self
            .current_index_in_queue(&token, &handle, playback.as_ref())
            .await?;

        if let Some(current) = current_index {
            if (range_start..range_start + range_length).contains(&current) {
                return Err(ServiceError::InvalidOperation(format!(
                    "cannot move the block {range_start}..{} because it contains the track that is playing (index {current})",
                    range_start + range_length
                )));
            }
        }

        let insert_before = plan_insert_before(range_start, range_length, current_index, total);
        tracing::info!(
            playlist_id = %handle.playlist_id,
            range_start,
            range_length,
            ?current_index,
            insert_before,
            "reordering queue playlist"
        );

        let response = self
            .catalog
            .reorder_tracks_in_playlist(
                &token,
                &handle.playlist_id,
                &ReorderRequest {
                    range_start,
                    insert_before,
                    range_length,
                    snapshot_id: request.snapshot_id.clone(),
                },
            )
            .await
            .map_err(upstream("reorderTracksInPlaylist", &handle.playlist_id))?;

        Ok(ReorderResult {
            playlist_id: handle.playlist_id,
            range_start,
            range_length,
            insert_before,
            snapshot_id: response.snapshot_id,
        })
    }

    /// Index of the current track in the queue playlist, if playback runs
    /// from it and the track can be found.
    async fn current_index_in_queue(
        &self,
        token: &str,
        handle: &QueuePlaylistHandle,
        playback: Option<&PlaybackContext>,
    ) -> Result<Option<usize>> {
        let Some(playback) = playback else {
            tracing::info!("no playback context, moving block to the front");
            return Ok(None);
        };

        if playback.context_uri.as_deref() != Some(handle.playlist_uri.as_str()) {
            tracing::info!(
                context_uri = ?playback.context_uri,
                queue_uri = %handle.playlist_uri,
                "playback is not running from the queue playlist, moving block to the front"
            );
            return Ok(None);
        }

        let targets: Vec<&str> = playback
            .current_track_uri
            .iter()
            .chain(playback.current_track_linked_uri.iter())
            .map(String::as_str)
            .collect();
        if targets.is_empty() {
            tracing::info!("nothing is playing from the queue playlist");
            return Ok(None);
        }

        let index = self
            .scan_playlist_for(token, &handle.playlist_id, &targets)
            .await?;
        if index.is_none() {
            tracing::info!(
                track_uri = ?playback.current_track_uri,
                "current track not found in the queue playlist"
            );
        }
        Ok(index)
    }
}

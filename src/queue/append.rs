use crate::{
    error::Result,
    service::{SpotifyService, upstream},
    spotify::ADD_TRACKS_LIMIT,
    types::AppendResult,
    utils,
};

impl SpotifyService {
    /// Appends `uris` to the end of `playlist_id` in order.
    ///
    /// URIs are trimmed and blanks dropped; repeats are kept. Batches of at
    /// most [`ADD_TRACKS_LIMIT`] are sent one after another and the snapshot
    /// id of the last one is returned. A failing batch aborts the append
    /// without undoing the batches before it.
    pub async fn append_tracks<S: AsRef<str>>(
        &self,
        playlist_id: &str,
        uris: &[S],
    ) -> Result<AppendResult> {
        let uris = utils::normalize_uris(uris);
        if uris.is_empty() {
            return Ok(AppendResult {
                playlist_id: playlist_id.to_string(),
                appended_count: 0,
                range_start: None,
                range_length: 0,
                snapshot_id: None,
            });
        }

        let token = self.access_token().await?;
        let range_start = self.playlist_total(&token, playlist_id).await?;

        let mut snapshot_id = None;
        for (index, chunk) in uris.chunks(ADD_TRACKS_LIMIT).enumerate() {
            let response = self
                .catalog
                .add_tracks_to_playlist(&token, playlist_id, chunk)
                .await
                .map_err(|e| {
                    tracing::error!(
                        playlist_id,
                        chunk = index,
                        appended = index * ADD_TRACKS_LIMIT,
                        "append aborted, earlier batches stay in the playlist"
                    );
                    upstream("addTracksToPlaylist", playlist_id)(e)
                })?;
            tracing::debug!(playlist_id, chunk = index, size = chunk.len(), "batch appended");
            snapshot_id = Some(response.snapshot_id);
        }

        Ok(AppendResult {
            playlist_id: playlist_id.to_string(),
            appended_count: uris.len(),
            range_start: Some(range_start),
            range_length: uris.len(),
            snapshot_id,
        })
    }

    /// Live number of items in the playlist.
    pub(crate) async fn playlist_total(&self, token: &str, playlist_id: &str) -> Result<usize> {
        let summary = self
            .catalog
            .get_playlist(token, playlist_id, Some("tracks.total"))
            .await
            .map_err(upstream("getPlaylist", playlist_id))?;
        Ok(summary.tracks.total)
    }
}

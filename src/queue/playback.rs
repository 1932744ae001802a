use crate::{
    error::Result,
    service::{SpotifyService, upstream},
    spotify::PLAYLIST_ITEMS_PAGE_SIZE,
    types::{PlaybackContext, PlaybackFetchError},
};

const PLAYBACK_TYPES: [&str; 2] = ["track", "episode"];

impl SpotifyService {
    /// Reads the current playback state.
    ///
    /// `Ok(None)` means nothing is playing. A failed fetch does not fail the
    /// call: it comes back as a context whose `error` is set and whose URIs
    /// are empty, so queue operations can carry on without it.
    pub async fn get_playback_context(&self) -> Result<Option<PlaybackContext>> {
        let token = self.access_token().await?;

        match self
            .catalog
            .get_current_playback_state(&token, &PLAYBACK_TYPES)
            .await
        {
            Ok(Some(state)) => Ok(Some(PlaybackContext::from_state(state))),
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!(status = ?e.status(), error = %e, "playback state unavailable");
                Ok(Some(PlaybackContext::unavailable(PlaybackFetchError {
                    status: e.status(),
                    message: e.to_string(),
                })))
            }
        }
    }

    /// Zero-based index of the first item of `playlist_id` whose track URI,
    /// or relinked-from URI, equals `target_uri`.
    pub async fn locate_track_in_playlist(
        &self,
        playlist_id: &str,
        target_uri: &str,
    ) -> Result<Option<usize>> {
        let token = self.access_token().await?;
        self.scan_playlist_for(&token, playlist_id, &[target_uri])
            .await
    }

    /// Pages through the playlist in order and stops at the first item that
    /// matches any of `targets`.
    pub(crate) async fn scan_playlist_for(
        &self,
        token: &str,
        playlist_id: &str,
        targets: &[&str],
    ) -> Result<Option<usize>> {
        let mut offset = 0;

        loop {
            let page = self
                .catalog
                .get_playlist_tracks(token, playlist_id, offset, PLAYLIST_ITEMS_PAGE_SIZE)
                .await
                .map_err(upstream("getPlaylistTracks", playlist_id))?;

            let position = page.items.iter().position(|item| {
                item.track
                    .as_ref()
                    .is_some_and(|track| targets.iter().any(|t| track.matches_uri(t)))
            });
            if let Some(position) = position {
                return Ok(Some(offset + position));
            }

            let fetched = page.items.len();
            offset += fetched;
            if fetched == 0 || fetched < PLAYLIST_ITEMS_PAGE_SIZE || offset >= page.total {
                return Ok(None);
            }
        }
    }
}

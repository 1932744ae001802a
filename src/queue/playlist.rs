use super::{QUEUE_PLAYLIST_DESCRIPTION, QUEUE_PLAYLIST_NAME};
use crate::{
    error::Result,
    service::{SpotifyService, upstream},
    spotify::USER_PLAYLISTS_PAGE_SIZE,
    types::{CreatePlaylistRequest, Playlist, QueuePlaylistHandle},
    utils,
};

impl SpotifyService {
    /// Returns the queue playlist, finding or creating it on first use.
    ///
    /// The handle is cached for the lifetime of the service. The cache lock is
    /// held for the whole lookup so two callers cannot both create a playlist.
    ///
    /// Across restarts the lookup relies on the name and owner match, which
    /// prevents duplicates on a best-effort basis only. When several playlists
    /// match, the first one in the user's playlist order wins.
    pub async fn ensure_queue_playlist(&self) -> Result<QueuePlaylistHandle> {
        self.require_configured()?;

        let mut cached = self.queue_handle.lock().await;
        if let Some(handle) = cached.as_ref() {
            return Ok(handle.clone());
        }

        let token = self.access_token().await?;
        let user_id = self.current_user_id(&token).await?;

        let handle = match self.find_queue_playlist(&token, &user_id).await? {
            Some(playlist) => {
                tracing::info!(playlist_id = %playlist.id, "found existing queue playlist");
                handle_for(&playlist)
            }
            None => {
                let request = CreatePlaylistRequest {
                    name: QUEUE_PLAYLIST_NAME.to_string(),
                    description: QUEUE_PLAYLIST_DESCRIPTION.to_string(),
                    public: false,
                    collaborative: false,
                };
                let playlist = self
                    .catalog
                    .create_playlist(&token, &user_id, &request)
                    .await
                    .map_err(upstream("createPlaylist", &user_id))?;
                tracing::info!(playlist_id = %playlist.id, "created queue playlist");
                handle_for(&playlist)
            }
        };

        *cached = Some(handle.clone());
        Ok(handle)
    }

    /// The cached handle, without any network access.
    pub async fn cached_queue_playlist(&self) -> Option<QueuePlaylistHandle> {
        self.queue_handle.lock().await.clone()
    }

    pub(crate) async fn current_user_id(&self, token: &str) -> Result<String> {
        let mut profile = self.profile.lock().await;
        if let Some(profile) = profile.as_ref() {
            return Ok(profile.id.clone());
        }

        let me = self
            .catalog
            .get_me(token)
            .await
            .map_err(upstream("getMe", "-"))?;
        let id = me.id.clone();
        *profile = Some(me);
        Ok(id)
    }

    /// Pages through the user's playlists until a queue playlist owned by
    /// `user_id` turns up or the listing is exhausted.
    async fn find_queue_playlist(&self, token: &str, user_id: &str) -> Result<Option<Playlist>> {
        let mut offset = 0;

        loop {
            let page = self
                .catalog
                .get_user_playlists(token, USER_PLAYLISTS_PAGE_SIZE, offset)
                .await
                .map_err(upstream("getUserPlaylists", user_id))?;

            let fetched = page.items.len();
            if let Some(found) = page
                .items
                .into_iter()
                .find(|p| p.name == QUEUE_PLAYLIST_NAME && p.owner.id == user_id)
            {
                return Ok(Some(found));
            }

            offset += fetched;
            if fetched < USER_PLAYLISTS_PAGE_SIZE || offset >= page.total {
                tracing::debug!(scanned = offset, "no queue playlist found");
                return Ok(None);
            }
        }
    }
}

fn handle_for(playlist: &Playlist) -> QueuePlaylistHandle {
    QueuePlaylistHandle {
        playlist_id: playlist.id.clone(),
        playlist_uri: playlist
            .uri
            .clone()
            .unwrap_or_else(|| utils::playlist_uri(&playlist.id)),
    }
}

use super::spinner;
use crate::{
    error::{Result, ServiceError},
    info,
    service::SpotifyService,
    success,
    types::{AppendResult, MoveRequest},
    utils, warning,
};

pub async fn queue_ensure(service: &SpotifyService) -> Result<()> {
    let pb = spinner("Looking for the queue playlist...");
    let handle = service.ensure_queue().await;
    pb.finish_and_clear();
    let handle = handle?;

    success!("Queue playlist ready: {}", handle.playlist_uri);
    Ok(())
}

/// Appends tracks to the queue playlist; with `next` the appended block is
/// moved right behind the current track.
pub async fn queue_add(service: &SpotifyService, inputs: &[String], next: bool) -> Result<()> {
    let mut uris = Vec::with_capacity(inputs.len());
    for input in inputs {
        match utils::to_track_uri(input) {
            Some(uri) => uris.push(uri),
            None => warning!("Skipping \"{}\": not a track or episode", input.trim()),
        }
    }
    if uris.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "no track URIs given".to_string(),
        ));
    }

    let pb = spinner("Adding tracks to the queue...");
    let appended = service.queue_append(&uris).await;
    pb.finish_and_clear();
    let appended = appended?;
    print_appended(&appended);

    if next && appended.appended_count > 0 {
        let pb = spinner("Moving tracks behind the current one...");
        let moved = service.queue_play_next(&MoveRequest::from(&appended)).await;
        pb.finish_and_clear();
        let moved = moved?;
        success!(
            "Moved {} track(s) to position {}",
            moved.range_length,
            moved.insert_before
        );
    }
    Ok(())
}

pub async fn queue_play_next(
    service: &SpotifyService,
    range_start: i64,
    range_length: i64,
    snapshot_id: Option<String>,
) -> Result<()> {
    let request = MoveRequest {
        range_start: Some(range_start),
        range_length: Some(range_length),
        snapshot_id,
    };

    let pb = spinner("Reordering the queue...");
    let moved = service.queue_play_next(&request).await;
    pb.finish_and_clear();
    let moved = moved?;

    success!(
        "Moved {} track(s) from {} to {}",
        moved.range_length,
        moved.range_start,
        moved.insert_before
    );
    info!("Snapshot: {}", moved.snapshot_id);
    Ok(())
}

pub async fn queue_context(service: &SpotifyService) -> Result<()> {
    let Some(context) = service.get_playback_context().await? else {
        info!("Nothing is playing right now.");
        return Ok(());
    };

    if let Some(err) = &context.error {
        warning!("Playback state unavailable: {}", err.message);
        return Ok(());
    }

    match context.state.as_ref().and_then(|s| s.item.as_ref()) {
        Some(track) => info!(
            "Now playing: {} - {}",
            track.name,
            utils::summarize_artists(&track.artists)
        ),
        None => info!("Now playing: {}", context.current_track_uri.as_deref().unwrap_or("-")),
    }
    info!("Context: {}", context.context_uri.as_deref().unwrap_or("none"));
    if let Some(linked) = &context.current_track_linked_uri {
        info!("Relinked from: {}", linked);
    }
    Ok(())
}

fn print_appended(appended: &AppendResult) {
    match appended.range_start {
        Some(start) => success!(
            "Added {} track(s) at position {}",
            appended.appended_count,
            start
        ),
        None => info!("Nothing to add."),
    }
}

use tabled::Table;

use super::spinner;
use crate::{
    error::Result,
    info,
    service::SpotifyService,
    types::{Album, AlbumTableRow, Track, TrackTableRow},
    utils,
};

pub async fn search(service: &SpotifyService, query: &str) -> Result<()> {
    let pb = spinner("Searching Spotify...");
    let results = service.search(query).await;
    pb.finish_and_clear();
    let results = results?;

    if results.tracks.is_empty() && results.albums.is_empty() {
        info!("No results for \"{}\"", query.trim());
        return Ok(());
    }

    if !results.tracks.is_empty() {
        info!("Tracks");
        println!("{}", Table::new(results.tracks.iter().map(track_row)));
    }
    if !results.albums.is_empty() {
        info!("Albums");
        println!("{}", Table::new(results.albums.iter().map(album_row)));
    }
    Ok(())
}

pub async fn album(service: &SpotifyService, album_id: &str) -> Result<()> {
    let pb = spinner("Fetching album...");
    let album = service.get_album(album_id).await;
    pb.finish_and_clear();
    let album = album?;

    info!(
        "{} by {} ({})",
        album.name,
        utils::summarize_artists(&album.artists),
        album.release_date.as_deref().unwrap_or("unknown date")
    );
    let rows = album.tracks.items.iter().enumerate().map(|(i, track)| {
        let mut row = track_row(track);
        row.name = format!("{:>2}. {} ({})", i + 1, track.name, utils::format_duration(track.duration_ms));
        row.album = album.name.clone();
        row
    });
    println!("{}", Table::new(rows));
    Ok(())
}

fn track_row(track: &Track) -> TrackTableRow {
    TrackTableRow {
        name: track.name.clone(),
        artists: utils::summarize_artists(&track.artists),
        album: track
            .album
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        uri: track.uri.clone(),
    }
}

fn album_row(album: &Album) -> AlbumTableRow {
    AlbumTableRow {
        name: album.name.clone(),
        artists: utils::summarize_artists(&album.artists),
        released: album.release_date.clone().unwrap_or_default(),
        id: album.id.clone().unwrap_or_default(),
    }
}

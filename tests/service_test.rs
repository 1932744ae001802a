mod common;

use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::Utc;
use common::*;
use yfitops::{
    config::Config,
    error::ServiceError,
    service::{MAX_RATE_LIMIT_RETRIES, SpotifyService, rate_limit_delay},
    types::{MoveRequest, Paging, SearchResponse, Session},
};

fn expired_session(refresh_token: Option<&str>) -> Session {
    Session {
        access_token: "stale-token".to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_at: Utc::now() - chrono::Duration::minutes(5),
        scope: HashSet::new(),
    }
}

fn search_calls(catalog: &FakeCatalog) -> usize {
    catalog
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Search { .. }))
        .count()
}

#[test]
fn test_config_requires_all_credentials() {
    let partial = Config::from_lookup(|key| match key {
        "SPOTIFY_CLIENT_ID" => Some("id".to_string()),
        "SPOTIFY_CLIENT_SECRET" => Some("  ".to_string()),
        "SPOTIFY_REDIRECT_URI" => Some("http://localhost:4350/callback".to_string()),
        _ => None,
    });
    assert!(!partial.is_configured());

    let config = configured();
    assert!(config.is_configured());
    assert_eq!(config.server_address, "127.0.0.1:4350");
    assert_eq!(config.callback_path(), "/callback");
    assert!(config.enable_search);
}

#[test]
fn test_config_search_can_be_disabled() {
    let config = Config::from_lookup(|key| (key == "ENABLE_SEARCH").then(|| "false".to_string()));
    assert!(!config.enable_search);
}

#[tokio::test]
async fn test_unconfigured_service_rejects_everything() {
    let catalog = Arc::new(FakeCatalog::new());
    let service = service_with(unconfigured(), &catalog);

    assert!(!service.is_configured());
    assert!(!service.is_authenticated().await);
    assert!(matches!(service.login().await, Err(ServiceError::NotConfigured)));
    assert!(matches!(
        service.get_current_user().await,
        Err(ServiceError::NotConfigured)
    ));
    assert!(matches!(
        service.search("daft punk").await,
        Err(ServiceError::NotConfigured)
    ));
    assert!(matches!(
        service.ensure_queue().await,
        Err(ServiceError::NotConfigured)
    ));
    assert!(matches!(
        service.queue_append(&["spotify:track:a"]).await,
        Err(ServiceError::NotConfigured)
    ));
    assert!(matches!(
        service.queue_play_next(&MoveRequest::new(0, 1, None)).await,
        Err(ServiceError::NotConfigured)
    ));
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn test_login_exchanges_code_and_loads_profile() {
    let catalog = Arc::new(FakeCatalog::new());
    let authorizer = Arc::new(FakeAuthorizer::new());
    let service = SpotifyService::new(configured(), catalog.clone(), authorizer.clone());

    let profile = service.login().await.unwrap();

    assert_eq!(profile.id, USER_ID);
    assert!(service.is_authenticated().await);
    let session = service.session().await.unwrap();
    assert_eq!(session.access_token, "granted-token");
    assert_eq!(session.refresh_token.as_deref(), Some("granted-refresh"));
    assert!(session.scope.contains("playlist-modify-private"));

    let urls = authorizer.seen_urls.lock().unwrap().clone();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("client_id=client-id"));
    assert!(urls[0].contains("code_challenge_method=S256"));

    match &catalog.calls()[..] {
        [Call::CodeGrant { code, code_verifier }, Call::GetMe] => {
            assert_eq!(code, "auth-code");
            assert_eq!(code_verifier.len(), 128);
        }
        other => panic!("unexpected calls {other:?}"),
    }
}

#[tokio::test]
async fn test_login_rejects_state_mismatch() {
    let catalog = Arc::new(FakeCatalog::new());
    let service = SpotifyService::new(
        configured(),
        catalog.clone(),
        Arc::new(FakeAuthorizer::tampering()),
    );

    let err = service.login().await.unwrap_err();

    assert!(matches!(err, ServiceError::NotAuthenticated(_)));
    assert!(catalog.calls().is_empty());
    assert!(service.session().await.is_none());
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_before_use() {
    let catalog = Arc::new(FakeCatalog::new());
    let service = service_with(configured(), &catalog);
    service
        .restore_session(expired_session(Some("refresh-token")))
        .await;

    service.get_current_user().await.unwrap();

    assert_eq!(
        catalog.calls(),
        vec![
            Call::Refresh {
                refresh_token: "refresh-token".to_string()
            },
            Call::GetMe,
        ]
    );
    let session = service.session().await.unwrap();
    assert_eq!(session.access_token, "refreshed-token");
    // The refresh response carried no refresh token, so the old one stays.
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-token"));
    assert!(session.expires_at > Utc::now());
}

#[tokio::test]
async fn test_failed_refresh_drops_session() {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.with_state(|s| s.refresh_fails = true);
    let service = service_with(configured(), &catalog);
    service
        .restore_session(expired_session(Some("refresh-token")))
        .await;

    let err = service.get_current_user().await.unwrap_err();

    assert!(matches!(err, ServiceError::NotAuthenticated(_)));
    assert!(service.session().await.is_none());
    assert!(!catalog.calls().contains(&Call::GetMe));
}

#[tokio::test]
async fn test_expired_session_without_refresh_token() {
    let catalog = Arc::new(FakeCatalog::new());
    let service = service_with(configured(), &catalog);
    service.restore_session(expired_session(None)).await;

    assert!(!service.is_authenticated().await);
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn test_search_validates_query_and_flag() {
    let catalog = Arc::new(FakeCatalog::new());
    let service = logged_in(&catalog).await;
    assert!(matches!(
        service.search("   ").await,
        Err(ServiceError::InvalidArgument(_))
    ));

    let mut config = configured();
    config.enable_search = false;
    let disabled = service_with(config, &catalog);
    let err = disabled.search("daft punk").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid operation: Global search is currently disabled.");

    assert!(catalog.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_search_retries_after_rate_limit() {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.with_state(|s| {
        s.search_rate_limits = 2;
        s.retry_after = Some(3);
        s.search_response = SearchResponse {
            tracks: Some(Paging {
                items: vec![track("spotify:track:around-the-world")],
                total: 1,
                limit: 20,
                offset: 0,
                next: None,
            }),
            albums: None,
        };
    });
    let service = logged_in(&catalog).await;
    let started = tokio::time::Instant::now();

    let results = service.search("  around the world ").await.unwrap();

    assert_eq!(results.tracks.len(), 1);
    assert!(results.albums.is_empty());
    assert_eq!(search_calls(&catalog), 3);
    // 3s, then 6s
    assert!(started.elapsed() >= Duration::from_secs(9));
    assert!(catalog.calls().contains(&Call::Search {
        query: "around the world".to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_search_gives_up_after_bounded_retries() {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.with_state(|s| s.search_rate_limits = 10);
    let service = logged_in(&catalog).await;

    let err = service.search("daft punk").await.unwrap_err();

    assert!(matches!(err, ServiceError::RateLimited { .. }));
    assert_eq!(search_calls(&catalog), MAX_RATE_LIMIT_RETRIES as usize + 1);
}

#[test]
fn test_rate_limit_delay() {
    assert_eq!(rate_limit_delay(Some(3), 0), Duration::from_secs(3));
    assert_eq!(rate_limit_delay(Some(3), 1), Duration::from_secs(6));
    assert_eq!(rate_limit_delay(None, 0), Duration::from_secs(1));
    assert_eq!(rate_limit_delay(Some(0), 2), Duration::from_secs(4));
    assert_eq!(rate_limit_delay(Some(100), 1), Duration::from_secs(120));
}

#[tokio::test]
async fn test_get_album_accepts_uri() {
    let catalog = Arc::new(FakeCatalog::new());
    let service = logged_in(&catalog).await;

    let album = service
        .get_album(" spotify:album:2noRn2Aes5aoNVsU6iWThc ")
        .await
        .unwrap();

    assert_eq!(album.id, "2noRn2Aes5aoNVsU6iWThc");
    assert_eq!(
        catalog.calls(),
        vec![Call::GetAlbum {
            album_id: "2noRn2Aes5aoNVsU6iWThc".to_string()
        }]
    );
    assert!(matches!(
        service.get_album("").await,
        Err(ServiceError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_get_album_collects_every_track_page() {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.with_state(|s| s.album_tracks = 120);
    let service = logged_in(&catalog).await;

    let album = service.get_album("2noRn2Aes5aoNVsU6iWThc").await.unwrap();

    let tracks: Vec<_> = album.tracks.items.iter().map(|t| t.uri.clone()).collect();
    assert_eq!(tracks, uris("album", 120));
    assert_eq!(album.tracks.next, None);
    assert_eq!(
        catalog.calls(),
        vec![
            Call::GetAlbum {
                album_id: "2noRn2Aes5aoNVsU6iWThc".to_string()
            },
            Call::GetAlbumTracks {
                album_id: "2noRn2Aes5aoNVsU6iWThc".to_string(),
                offset: 50,
                limit: 50,
            },
            Call::GetAlbumTracks {
                album_id: "2noRn2Aes5aoNVsU6iWThc".to_string(),
                offset: 100,
                limit: 50,
            },
        ]
    );
}

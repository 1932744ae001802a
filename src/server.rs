use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{Extension, Router, routing::get};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{Mutex, oneshot},
};

use crate::{
    api,
    config::Config,
    error::{Result, ServiceError},
    info,
    service::AuthorizationCodeSource,
    types::AuthorizationCode,
    utils, warning,
};

/// One-shot slot the callback handler fills with the redirect outcome.
pub type CallbackState =
    Arc<Mutex<Option<oneshot::Sender<std::result::Result<AuthorizationCode, String>>>>>;

const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

pub fn router(state: CallbackState, callback_path: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(callback_path, get(api::callback))
        .layer(Extension(state))
}

/// Opens the authorize URL in the default browser and captures the redirect
/// with a local HTTP server that lives only for the duration of the login.
pub struct BrowserAuthorizer {
    server_address: String,
    callback_path: String,
    timeout: Duration,
}

impl BrowserAuthorizer {
    pub fn new(config: &Config) -> Self {
        Self {
            server_address: config.server_address.clone(),
            callback_path: config.callback_path(),
            timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AuthorizationCodeSource for BrowserAuthorizer {
    async fn obtain_authorization_code(&self, authorize_url: &str) -> Result<AuthorizationCode> {
        let addr = SocketAddr::from_str(&self.server_address).map_err(|e| {
            ServiceError::InvalidArgument(format!(
                "invalid server address {}: {e}",
                self.server_address
            ))
        })?;
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ServiceError::NotAuthenticated(format!("cannot listen on {addr}: {e}"))
        })?;

        let (code_tx, code_rx) = oneshot::channel();
        let state: CallbackState = Arc::new(Mutex::new(Some(code_tx)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(state, &self.callback_path);

        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                tracing::warn!(error = %e, "callback server stopped with an error");
            }
        });
        tracing::debug!(%addr, path = %self.callback_path, "callback server listening");

        if webbrowser::open(authorize_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                authorize_url
            );
        } else {
            info!("Waiting for authorization in your browser...");
        }

        let outcome = tokio::time::timeout(self.timeout, code_rx).await;
        let _ = shutdown_tx.send(());

        match outcome {
            Ok(Ok(Ok(code))) => Ok(code),
            Ok(Ok(Err(reason))) => Err(ServiceError::NotAuthenticated(reason)),
            Ok(Err(_)) => Err(ServiceError::NotAuthenticated(
                "callback server stopped before authorization completed".to_string(),
            )),
            Err(_) => Err(ServiceError::NotAuthenticated(
                "authorization timed out".to_string(),
            )),
        }
    }
}

/// For machines without a browser: prints the authorize URL and reads the
/// URL the browser was redirected to from stdin.
pub struct ManualAuthorizer {
    redirect_uri: String,
}

impl ManualAuthorizer {
    pub fn new(config: &Config) -> Self {
        Self {
            redirect_uri: config
                .credentials
                .as_ref()
                .map(|c| c.redirect_uri.clone())
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AuthorizationCodeSource for ManualAuthorizer {
    async fn obtain_authorization_code(&self, authorize_url: &str) -> Result<AuthorizationCode> {
        info!("Open this URL, grant access and paste the address you were redirected to:");
        println!("{authorize_url}");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| ServiceError::NotAuthenticated(format!("cannot read redirect: {e}")))?;

        utils::parse_authorization_redirect(&line, &self.redirect_uri)
            .map_err(ServiceError::NotAuthenticated)
    }
}

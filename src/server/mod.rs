//! HTTP Front
//!
//! Maps inbound requests onto the flow drivers. Every route lives under the
//! path of the configured root URL.

pub mod handlers;

use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::Key;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::client::OidcTestClient;
use crate::flows::{AuthorizationCodeDriver, ImplicitDriver};
use crate::session::{CookieSessionStore, SessionKey};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    auth_code: Arc<AuthorizationCodeDriver>,
    implicit: Arc<ImplicitDriver>,
    sessions: CookieSessionStore,
    root_path: String,
    key: Key,
}

impl AppState {
    /// Assemble server state from a discovered client. Cookies are marked
    /// `Secure` when the root URL is served over https.
    pub fn new(client: &OidcTestClient, key: SessionKey) -> Self {
        let config = client.config();
        let root_path = config.root_path();
        let secure = config.root_url.scheme() == "https";

        Self {
            auth_code: Arc::new(client.authorization_code_driver()),
            implicit: Arc::new(client.implicit_driver()),
            sessions: CookieSessionStore::new(&root_path, secure),
            root_path,
            key: key.into(),
        }
    }

    /// Where rejected callbacks are sent.
    pub fn start_path(&self) -> String {
        format!("{}/", self.root_path)
    }

    fn is_under_root(&self, path: &str) -> bool {
        self.root_path.is_empty()
            || path == self.root_path
            || path
                .strip_prefix(self.root_path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Build the router.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let root = state.root_path.clone();
    let at = |path: &str| format!("{}{}", root, path);

    let mut router = Router::new()
        .route(&at("/"), get(handlers::initiate))
        .route(&at("/auth/callback"), get(handlers::callback))
        .route(&at("/implicit"), get(handlers::implicit_redirect))
        .route(&at("/implicit/"), get(handlers::implicit))
        .route(&at("/implicit/{*rest}"), get(handlers::implicit))
        .route(&at("/implicit.js"), get(handlers::implicit_script))
        .route(&at("/health"), get(handlers::health))
        .route(&at("/favicon.ico"), get(handlers::health))
        .nest_service(&at("/static"), ServeDir::new(static_dir.as_ref()));

    if !root.is_empty() {
        router = router.route(&root, get(handlers::initiate));
    }

    router
        .fallback(handlers::fallback)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Serve `router` on `bind` until CTRL+C or SIGTERM.
pub async fn serve(router: Router, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received CTRL+C"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
                tracing::info!("received CTRL+C");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received CTRL+C");
    }
}

//! HTTP surface of nightlight.
//!
//! Handlers are thin: they authorize, parse, call into [`crate::core`] and map the
//! result. `/admin/*` is only mounted when admin routes are enabled.

use crate::config::{AppConfig, CorsOrigins};
use crate::core::workflow::StoryServices;
use crate::crypto::PasswordCipher;
use crate::errors::Result;
use crate::storage::BlobStore;
use crate::story::StoryPublisher;
use axum::Router;
use axum::extract::Request;
use axum::http::HeaderValue;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};

pub mod admin;
pub mod auth;
pub mod error;
pub mod nightline;
pub mod public;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Slide storage
    pub store: Arc<dyn BlobStore>,
    /// Story platform client
    pub publisher: Arc<dyn StoryPublisher>,
    /// Cipher for account passwords
    pub cipher: PasswordCipher,
    /// Key granting admin access
    pub admin_api_key: Option<String>,
}

impl AppState {
    /// Story collaborators borrowed for one workflow.
    pub fn story_services(&self) -> StoryServices<'_> {
        StoryServices {
            publisher: self.publisher.as_ref(),
            cipher: &self.cipher,
        }
    }
}

/// Builds the router with all routes and `state` applied.
pub fn router(state: AppState, enable_admin_routes: bool) -> Router {
    let mut app = Router::new()
        .nest("/public", public::route())
        .nest("/nightline", nightline::route());
    if enable_admin_routes {
        app = app.nest("/admin", admin::route());
    }
    app.with_state(state)
}

/// CORS policy for the configured origins.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::List(sites) if sites.is_empty() => CorsLayer::new(),
        CorsOrigins::List(sites) => {
            let origins: Vec<HeaderValue> = sites
                .iter()
                .filter_map(|site| match site.parse() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin '{}'", site);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let app = router(state, config.enable_admin_routes)
        .layer(cors_layer(&config.cors_origins))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                info_span!(
                    "http_request",
                    uri = ?request.uri(),
                    method = ?request.method(),
                )
            }),
        );

    let listener = TcpListener::bind(config.listen).await?;
    info!("Server listening on {}", config.listen);
    if config.enable_admin_routes {
        info!("Admin routes enabled");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

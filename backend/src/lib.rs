//! B2B Marketplace - Backend Server
//!
//! Product and business listings, search, buyer–seller enquiries and
//! messaging, and authentication against a hosted auth provider.

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod repositories;
pub mod routes;
pub mod services;

pub use config::Config;

use external::{AuthProvider, HostedAuthClient};
use repositories::{CatalogStore, ConversationStore, PgStore, ProfileStore};
use services::{AuthService, CatalogService, ConversationService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<dyn ConversationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by PostgreSQL and the hosted auth provider
    pub fn new(db: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(db));
        Self {
            conversations: store.clone(),
            profiles: store.clone(),
            catalog: store,
            auth: Arc::new(HostedAuthClient::new(&config.auth)),
            config: Arc::new(config),
        }
    }

    pub fn conversation_service(&self) -> ConversationService {
        ConversationService::new(self.conversations.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.auth.clone(), self.profiles.clone())
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(self.catalog.clone())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "B2B Marketplace API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

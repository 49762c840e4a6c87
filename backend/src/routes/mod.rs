//! Route definitions for the B2B marketplace

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::require_session, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public, `me` checks the session itself)
        .nest("/auth", auth_routes())
        // Catalog (public)
        .merge(catalog_routes())
        // Enquiries (anonymous callers are redirected to sign in)
        .route("/enquiries", post(handlers::create_enquiry))
        // Protected routes - conversations
        .nest("/conversations", conversation_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(handlers::sign_up))
        .route("/sign-in", post(handlers::sign_in))
        .route("/sign-out", post(handlers::sign_out))
        .route("/me", get(handlers::me))
        .route("/email-exists", get(handlers::email_exists))
}

/// Catalog read routes (public)
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/:product_id", get(handlers::get_product))
        .route("/businesses", get(handlers::list_businesses))
        .route("/businesses/:business_id", get(handlers::get_business))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/:slug", get(handlers::get_category))
        .route("/cities", get(handlers::list_cities))
        .route("/cities/:slug", get(handlers::get_city))
        .route("/search", get(handlers::search))
}

/// Conversation routes (protected)
fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_conversations))
        .route("/:conversation_id", get(handlers::get_conversation))
        .route(
            "/:conversation_id/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route_layer(middleware::from_fn(require_session))
}

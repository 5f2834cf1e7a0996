use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{elevated, protected, public};
use crate::middleware::{admin_key_middleware, tenant_key_middleware};
use crate::state::AppState;

/// Full HTTP surface. The tenant key gate wraps everything (it only acts on
/// `/api/library/*`); the admin gate wraps the admin routes alone.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    let ui_dir = state.config.server.ui_dir.clone();

    Router::new()
        // Public
        .merge(public_routes())
        // Tenant-key protected library API
        .merge(library_routes())
        // Admin secret protected
        .merge(admin_routes(state.clone()))
        // UI assets next to library.html
        .fallback_service(ServeDir::new(ui_dir))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn_with_state(state.clone(), tenant_key_middleware)),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::index))
        .route("/library", get(public::index))
        .route("/health", get(public::health))
        .route("/api/geocode", get(public::geocode))
}

fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/api/library/search", get(protected::search))
        .route("/api/library/upload", post(protected::upload))
        .route("/api/library/documents/:id", get(protected::document_get))
        .route("/api/library/documents/:id/download", get(protected::download))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/tenant-keys", post(elevated::issue_key))
        .route_layer(middleware::from_fn_with_state(state, admin_key_middleware))
}

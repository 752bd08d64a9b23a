//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.ingest.max_body_size() as usize;

    Router::new()
        // Health check (for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        // Case-set ingestion and queries
        .route(
            "/v1/case-sets",
            post(handlers::upload_case_set).get(handlers::list_case_sets),
        )
        .route(
            "/v1/case-sets/{case_set_id}",
            get(handlers::get_case_set).delete(handlers::delete_case_set),
        )
        .route(
            "/v1/case-sets/{case_set_id}/archive",
            get(handlers::download_case_set),
        )
        .route(
            "/v1/case-sets/{case_set_id}/cases",
            get(handlers::list_cases),
        )
        .route(
            "/v1/case-sets/{case_set_id}/missing-scripts",
            get(handlers::list_missing_scripts),
        )
        // Software packages
        .route(
            "/v1/packages",
            post(handlers::upload_package).get(handlers::list_packages),
        )
        .route("/v1/packages/import", post(handlers::import_packages))
        .route(
            "/v1/packages/{package_id}",
            get(handlers::get_package).delete(handlers::delete_package),
        )
        .route(
            "/v1/packages/{package_id}/download",
            get(handlers::download_package),
        )
        // Axum's default 2 MiB body cap is far below the archive ceilings;
        // the per-endpoint size checks enforce the configured limits.
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/config/status", get(handlers::get_service_status))
        // Jobs
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/output", get(jobs::get_output))
        .route("/jobs/{id}/thumbnail", get(jobs::get_thumbnail))
        // Orchestrator
        .route("/orchestrator/status", get(jobs::get_orchestrator_status));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics));

    // Serve dashboard with SPA fallback
    if let Some(dashboard_dir) = &state.config().server.static_dir {
        let serve_dir =
            ServeDir::new(dashboard_dir).fallback(ServeFile::new(dashboard_dir.join("index.html")));
        router = router.fallback_service(serve_dir);
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use parlor::envelope::MAX_BODY_BYTES;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/rs",
            post(handlers::establish_channel)
                .get(handlers::method_not_allowed)
                .put(handlers::method_not_allowed)
                .delete(handlers::method_not_allowed),
        )
        .route(
            "/api",
            post(handlers::protected_call)
                .get(handlers::method_not_allowed)
                .put(handlers::method_not_allowed)
                .delete(handlers::method_not_allowed),
        )
        // Above the 3 MiB protocol ceiling so the handler's own check (and
        // error envelope) is the one that fires.
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES + 64 * 1024))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

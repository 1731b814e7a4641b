use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all dobj endpoints.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/objects",
            get(handler::read_handler)
                .post(handler::create_handler)
                .put(handler::update_handler)
                .delete(handler::delete_handler),
        )
        .route("/v1/objects/publish", get(handler::publish_handler))
        .route("/v1/objects/exists", get(handler::exists_handler))
        .route("/v1/shared/:container/*key", get(handler::shared_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

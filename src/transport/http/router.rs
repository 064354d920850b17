use crate::transport::http::handlers::{health, records};
use crate::transport::http::types::ApiResponse;
use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        health::ping_handler,
        records::list_handler,
        records::list_by_trainee_handler,
        records::get_handler,
        records::create_handler,
        records::delete_handler
    ),
    components(schemas(ApiResponse))
)]
pub struct ApiDoc;

/// Any origin, the four verbs the API uses, and `Content-Type`. Preflight
/// `OPTIONS` requests are answered by the layer.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/ping", get(health::ping_handler))
        .route(
            "/api/:collection",
            get(records::list_handler).post(records::create_handler),
        )
        .route(
            "/api/:collection/trainee/:trainee_id",
            get(records::list_by_trainee_handler),
        )
        .route(
            "/api/:collection/:id",
            get(records::get_handler).delete(records::delete_handler),
        )
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

use crate::storage::codec;
use crate::transport::http::handlers::common::run_store_op;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Every data file is readable and holds a JSON array", body = ApiResponse),
        (status = 503, description = "A data file is missing or corrupt", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut collections = Vec::new();
    for service in state.collections.iter() {
        let service = service.clone();
        let name = service.name();
        let checked = run_store_op(move || -> crate::storage::Result<usize> {
            let body = service.list()?;
            codec::split_into_records(&body).map(|records| records.len())
        })
        .await;

        match checked {
            Ok(count) => collections.push(serde_json::json!({ "name": name, "records": count })),
            Err((_, Json(resp))) => {
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse {
                        success: false,
                        data: Some(serde_json::json!({ "status": "unhealthy", "collection": name })),
                        error: resp.error,
                    }),
                );
            }
        }
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!({
            "status": "ok",
            "data_dir": state.collections.data_dir().display().to_string(),
            "collections": collections,
        }))),
    )
}

#[utoipa::path(
    get,
    path = "/api/ping",
    responses(
        (status = 200, description = "Liveness probe", body = String)
    )
)]
pub async fn ping_handler() -> &'static str {
    "PONG - MyFit Server is ALIVE!"
}

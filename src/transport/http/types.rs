use crate::app::collection_service::Collections;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub collections: Arc<Collections>,
}

impl AppState {
    pub fn new(collections: Collections) -> Self {
        Self {
            collections: Arc::new(collections),
        }
    }
}

/// Envelope for failures and service endpoints. Successful collection
/// operations return the stored JSON text as-is instead.
#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::failure(error)))
}

pub fn json_422(reason: &str, expected: &str) -> ApiError {
    api_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid JSON body: {} (expected: {})", reason, expected),
    )
}

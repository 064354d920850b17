use crate::app::collection_service::CollectionService;
use crate::storage::StoreError;
use crate::transport::http::types::{api_error, json_422, ApiError, AppState};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

pub fn resolve_collection(state: &AppState, name: &str) -> Result<Arc<CollectionService>, ApiError> {
    let name = name.trim().to_lowercase();
    state.collections.get(&name).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Collection '{}' does not exist", name),
        )
    })
}

/// Runs a blocking store operation off the async workers. The collection
/// lock is taken and released entirely inside `op`.
pub async fn run_store_op<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::storage::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(store_error(e)),
        Err(e) => {
            tracing::error!(error = %e, "store task panicked");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "store task failed"))
        }
    }
}

pub fn store_error(err: StoreError) -> ApiError {
    let status = match &err {
        StoreError::MalformedRecord(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Unsupported { .. } => StatusCode::METHOD_NOT_ALLOWED,
        StoreError::CorruptCollection { .. } | StoreError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "store operation failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
    }
    api_error(status, err.to_string())
}

/// Stored JSON text sent verbatim.
pub fn raw_json(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
}

/// Request bodies must be a JSON object; the text itself is what gets stored.
pub fn validate_record_body(body: &str) -> Result<(), ApiError> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) if v.is_object() => Ok(()),
        Ok(_) => Err(json_422("not an object", "a JSON object")),
        Err(e) => Err(json_422(&e.to_string(), "a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(
            store_error(StoreError::MalformedRecord("x".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_error(StoreError::NotFound {
                collection: "trainees".into(),
                id: "1".into()
            })
            .0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_error(StoreError::Unsupported {
                collection: "history",
                operation: "delete"
            })
            .0,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            store_error(StoreError::CorruptCollection {
                path: "data/programs.json".into(),
                reason: "array body is not bracket-delimited".into()
            })
            .0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(
            store_error(StoreError::Io(io)).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn record_bodies_must_be_objects() {
        assert!(validate_record_body(r#"{"name":"Al"}"#).is_ok());
        let (status, _) = validate_record_body("[1]").unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(validate_record_body("{oops").is_err());
    }
}

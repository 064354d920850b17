use crate::transport::http::handlers::common::{
    raw_json, resolve_collection, run_store_op, validate_record_body,
};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[utoipa::path(
    get,
    path = "/api/{collection}",
    params(
        ("collection" = String, Path, description = "trainees, programs or history")
    ),
    responses(
        (status = 200, description = "Full JSON array of the collection"),
        (status = 404, description = "Unknown collection", body = ApiResponse),
        (status = 500, description = "Data file could not be read", body = ApiResponse)
    )
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Response {
    let service = match resolve_collection(&state, &collection) {
        Ok(s) => s,
        Err(resp) => return resp.into_response(),
    };
    match run_store_op(move || service.list()).await {
        Ok(body) => raw_json(StatusCode::OK, body),
        Err(resp) => resp.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/{collection}/trainee/{trainee_id}",
    params(
        ("collection" = String, Path, description = "programs or history"),
        ("trainee_id" = String, Path, description = "Literal traineeId value to match")
    ),
    responses(
        (status = 200, description = "JSON array of the trainee's records, in stored order"),
        (status = 404, description = "Unknown collection", body = ApiResponse),
        (status = 405, description = "Collection is not scoped by trainee", body = ApiResponse)
    )
)]
pub async fn list_by_trainee_handler(
    State(state): State<AppState>,
    Path((collection, trainee_id)): Path<(String, String)>,
) -> Response {
    let service = match resolve_collection(&state, &collection) {
        Ok(s) => s,
        Err(resp) => return resp.into_response(),
    };
    match run_store_op(move || service.list_by_trainee(&trainee_id)).await {
        Ok(body) => raw_json(StatusCode::OK, body),
        Err(resp) => resp.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "trainees, programs or history"),
        ("id" = String, Path, description = "Record identifier")
    ),
    responses(
        (status = 200, description = "The stored record"),
        (status = 404, description = "Unknown collection or id", body = ApiResponse)
    )
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let service = match resolve_collection(&state, &collection) {
        Ok(s) => s,
        Err(resp) => return resp.into_response(),
    };
    match run_store_op(move || service.get(&id)).await {
        Ok(record) => raw_json(StatusCode::OK, record),
        Err(resp) => resp.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/{collection}",
    params(
        ("collection" = String, Path, description = "trainees, programs or history")
    ),
    request_body(content = String, description = "Flat JSON object; `id` optional"),
    responses(
        (status = 200, description = "Stored record with its id filled in"),
        (status = 400, description = "Record text could not be stored", body = ApiResponse),
        (status = 404, description = "Unknown collection", body = ApiResponse),
        (status = 422, description = "Body is not a JSON object", body = ApiResponse),
        (status = 500, description = "Data file could not be written", body = ApiResponse)
    )
)]
pub async fn create_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: String,
) -> Response {
    let service = match resolve_collection(&state, &collection) {
        Ok(s) => s,
        Err(resp) => return resp.into_response(),
    };
    if let Err(resp) = validate_record_body(&body) {
        return resp.into_response();
    }

    let name = service.name();
    match run_store_op(move || service.create_or_replace(&body)).await {
        Ok(stored) => {
            tracing::info!(collection = name, "record saved");
            raw_json(StatusCode::OK, stored)
        }
        Err(resp) => resp.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "trainees or programs"),
        ("id" = String, Path, description = "Record identifier")
    ),
    responses(
        (status = 204, description = "Deleted, or no such record"),
        (status = 404, description = "Unknown collection", body = ApiResponse),
        (status = 405, description = "Collection does not allow deletes", body = ApiResponse)
    )
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let service = match resolve_collection(&state, &collection) {
        Ok(s) => s,
        Err(resp) => return resp.into_response(),
    };
    let name = service.name();
    let deleted_id = id.clone();
    match run_store_op(move || service.delete(&id)).await {
        Ok(()) => {
            tracing::info!(collection = name, id = %deleted_id, "record deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(resp) => resp.into_response(),
    }
}

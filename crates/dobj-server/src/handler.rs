//! Request handlers.
//!
//! Engine calls block on store and fetcher I/O, so every one runs on the
//! blocking thread pool.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use bytes::Bytes;
use serde_json::json;

use dobj_engine::{DataObjectEngine, DeleteReport, EngineResult};
use dobj_types::{PublishedLink, ResourceUri};

use crate::dto::{DeleteQuery, ExistsResponse, HealthResponse, ObjectBody, PublishQuery, SharedQuery, UriQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn blocking<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&DataObjectEngine) -> EngineResult<T> + Send + 'static,
{
    let engine = state.engine().clone();
    tokio::task::spawn_blocking(move || op(engine.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn octet_stream(data: Vec<u8>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/octet-stream")], Bytes::from(data))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.engine().config();
    Json(json!({
        "name": "dobj-server",
        "version": env!("CARGO_PKG_VERSION"),
        "default_ttl_secs": config.default_ttl_secs,
        "max_ttl_secs": config.max_ttl_secs,
    }))
}

pub async fn create_handler(
    State(state): State<AppState>,
    Json(body): Json<ObjectBody>,
) -> ApiResult<StatusCode> {
    let (uri, payload) = body.into_payload()?;
    blocking(&state, move |engine| engine.create(&uri, payload)).await?;
    Ok(StatusCode::CREATED)
}

pub async fn read_handler(
    State(state): State<AppState>,
    Query(query): Query<UriQuery>,
) -> ApiResult<impl IntoResponse> {
    let data = blocking(&state, move |engine| engine.read(&query.uri)).await?;
    Ok(octet_stream(data))
}

pub async fn update_handler(
    State(state): State<AppState>,
    Json(body): Json<ObjectBody>,
) -> ApiResult<StatusCode> {
    let (uri, payload) = body.into_payload()?;
    blocking(&state, move |engine| engine.update(&uri, payload)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<DeleteReport>> {
    let report = blocking(&state, move |engine| engine.delete(&query.uri, query.recursive)).await?;
    Ok(Json(report))
}

pub async fn publish_handler(
    State(state): State<AppState>,
    Query(query): Query<PublishQuery>,
) -> ApiResult<Json<PublishedLink>> {
    let link = blocking(&state, move |engine| engine.publish(&query.uri, query.ttl)).await?;
    Ok(Json(link))
}

pub async fn exists_handler(
    State(state): State<AppState>,
    Query(query): Query<UriQuery>,
) -> ApiResult<Json<ExistsResponse>> {
    let exists = blocking(&state, move |engine| engine.exists(&query.uri)).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// Serve an object through a published link.
pub async fn shared_handler(
    State(state): State<AppState>,
    Path((container, key)): Path<(String, String)>,
    Query(query): Query<SharedQuery>,
) -> ApiResult<impl IntoResponse> {
    state
        .signer()
        .verify(&container, &key, query.expires, &query.signature)?;

    // The signed key is used verbatim; re-parsing would strip a trailing
    // separator and address a different resource.
    let resource = ResourceUri::from_parts(&container, &key).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let data = blocking(&state, move |engine| engine.read_resource(&resource)).await?;
    Ok(octet_stream(data))
}

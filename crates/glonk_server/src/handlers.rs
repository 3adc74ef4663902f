use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;

use glonk_core::{AnyRecord, KindMeta};

use crate::auth::OwnerId;
use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn kind_meta<'a>(state: &'a AppState, kind: &str) -> Result<&'a KindMeta, ApiError> {
    state.registry.lookup(kind).map_err(ApiError::from)
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::bad_request())
}

/// Decodes, validates and claims a payload for the caller.
fn decode_owned(meta: &KindMeta, body: &[u8], owner: OwnerId) -> Result<AnyRecord, ApiError> {
    let mut record = meta.decode(body)?;
    if !record.validate() {
        tracing::debug!("{} payload failed validation", meta.kind());
        return Err(ApiError::bad_request());
    }
    meta.claim(&mut record, owner.0)?;
    Ok(record)
}

pub async fn describe_kind(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<KindMeta> {
    Ok(Json(kind_meta(&state, &kind)?.clone()))
}

pub async fn get_record(
    State(state): State<AppState>,
    owner: OwnerId,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<AnyRecord> {
    let meta = kind_meta(&state, &kind)?;
    let id = parse_id(&id)?;
    Ok(Json(state.store.get(meta, id, owner.0).await?))
}

/// Repeated keys accumulate, so `?byOwnerId=1&byOwnerId=2|3` names three ids.
pub async fn list_records(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(kind): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Vec<AnyRecord>> {
    let meta = kind_meta(&state, &kind)?;
    let mut raw: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in pairs {
        raw.entry(name).or_default().push(value);
    }
    let filters = meta.parse_filters(&raw);
    Ok(Json(state.store.get_by_filters(meta, &filters, owner.0).await?))
}

pub async fn create_record(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(kind): Path<String>,
    body: Bytes,
) -> ApiResult<AnyRecord> {
    let meta = kind_meta(&state, &kind)?;
    if meta.is_self_owned() {
        tracing::debug!("refusing direct create of self-owned kind {}", meta.kind());
        return Err(ApiError::bad_request());
    }
    let record = decode_owned(meta, &body, owner)?;
    Ok(Json(state.store.create(record).await?))
}

pub async fn update_record(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(kind): Path<String>,
    body: Bytes,
) -> ApiResult<AnyRecord> {
    let meta = kind_meta(&state, &kind)?;
    let record = decode_owned(meta, &body, owner)?;
    Ok(Json(state.store.update(record).await?))
}

pub async fn delete_record(
    State(state): State<AppState>,
    owner: OwnerId,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<AnyRecord> {
    let meta = kind_meta(&state, &kind)?;
    let id = parse_id(&id)?;
    Ok(Json(state.store.delete(meta, id, owner.0).await?))
}

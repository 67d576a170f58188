use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use common::types::{Envelope, GroupListing};
use service::items::{
    DeleteItem, ListItems, UpsertItem, MSG_MISSING_GROUP, MSG_MISSING_GROUP_OR_VALUE,
    MSG_MISSING_GROUP_OR_VALUE_ID,
};
use tracing::debug;

use crate::errors::ApiError;
use crate::state::AppState;

/// A body or query that does not parse is reported like a missing field.
fn rejected(rejection: impl std::fmt::Display, msg: &str) -> ApiError {
    debug!(%rejection, "request rejected");
    ApiError::InvalidRequest(msg.to_string())
}

/// `POST /set`: store `value` in `group` under its fingerprint.
pub async fn set_value(
    State(state): State<AppState>,
    payload: Result<Json<UpsertItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(req) = payload.map_err(|e| rejected(e, MSG_MISSING_GROUP_OR_VALUE))?;
    state.items.upsert(req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::success())))
}

/// `DELETE /del`: remove the item `value_id` from `group`.
pub async fn delete_value(
    State(state): State<AppState>,
    payload: Result<Json<DeleteItem>, JsonRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Json(req) = payload.map_err(|e| rejected(e, MSG_MISSING_GROUP_OR_VALUE_ID))?;
    state.items.delete(req).await?;
    Ok(Json(Envelope::success()))
}

/// `GET /list?group=`: every item of the group keyed by fingerprint.
pub async fn list_values(
    State(state): State<AppState>,
    query: Result<Query<ListItems>, QueryRejection>,
) -> Result<Json<GroupListing>, ApiError> {
    let Query(req) = query.map_err(|e| rejected(e, MSG_MISSING_GROUP))?;
    let (group, values) = state.items.list(req).await?;
    Ok(Json(GroupListing::success(group, values)))
}

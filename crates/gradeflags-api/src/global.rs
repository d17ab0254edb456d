//! Handlers for the global toggle.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/global` | Current row; 404 if none recorded |
//! | `GET`  | `/global/history` | Newest first; optional `?limit=` |
//! | `POST` | `/admin/global` | Body: [`NewGlobalToggle`]; returns 201 + stored row |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gradeflags_core::{
  store::ConfigStore,
  toggle::{GlobalToggle, NewGlobalToggle},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

/// `GET /global`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<GlobalToggle>, ApiError>
where
  S: ConfigStore,
{
  let current = state
    .store
    .current_global_toggle()
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("no global toggle recorded".into()))?;
  Ok(Json(current))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /global/history[?limit=<n>]`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<GlobalToggle>>, ApiError>
where
  S: ConfigStore,
{
  let rows = state
    .store
    .global_toggle_history(params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `POST /admin/global`
pub async fn record<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewGlobalToggle>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConfigStore,
{
  body.validate()?;

  let row = state
    .store
    .record_global_toggle(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    enabled = row.enabled,
    enabled_for_all_courses = row.enabled_for_all_courses,
    changed_by = row.changed_by.as_deref().unwrap_or("-"),
    "global toggle recorded"
  );
  Ok((StatusCode::CREATED, Json(row)))
}

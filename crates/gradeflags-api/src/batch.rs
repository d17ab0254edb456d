//! Handlers for the grade-computation batch setting.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/batch` | Current row; 404 if none recorded |
//! | `POST` | `/admin/batch` | Body: [`NewBatchSetting`]; returns 201 + stored row |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use gradeflags_core::{
  store::ConfigStore,
  toggle::{BatchSetting, NewBatchSetting},
};

use crate::{ApiState, error::ApiError};

/// `GET /batch`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<BatchSetting>, ApiError>
where
  S: ConfigStore,
{
  let row = state
    .store
    .current_batch_setting()
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("no batch setting recorded".into()))?;
  Ok(Json(row))
}

/// `POST /admin/batch`
pub async fn record<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewBatchSetting>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConfigStore,
{
  body.validate()?;

  let row = state
    .store
    .record_batch_setting(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    batch_size = row.batch_size,
    courses = row.course_ids.split_whitespace().count(),
    changed_by = row.changed_by.as_deref().unwrap_or("-"),
    "batch setting recorded"
  );
  Ok((StatusCode::CREATED, Json(row)))
}

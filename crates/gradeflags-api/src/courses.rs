//! Handlers for per-course toggles.
//!
//! Course keys travel in the query string or the body rather than in the path,
//! because legacy keys (`Org/Num/Run`) contain slashes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/courses` | Current row for every course that has one |
//! | `GET`  | `/courses/current` | `?course_id=` required; 404 if none |
//! | `GET`  | `/courses/history` | `?course_id=` required; newest first |
//! | `POST` | `/admin/courses` | Body: [`NewCourseToggle`]; returns 201 + stored row |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gradeflags_core::{
  course::CourseKey,
  store::ConfigStore,
  toggle::{CourseToggle, NewCourseToggle},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CourseParams {
  pub course_id: CourseKey,
}

/// `GET /courses`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<CourseToggle>>, ApiError>
where
  S: ConfigStore,
{
  let rows = state
    .store
    .current_course_toggles()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /courses/current?course_id=<key>`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<CourseParams>,
) -> Result<Json<CourseToggle>, ApiError>
where
  S: ConfigStore,
{
  let row = state
    .store
    .current_course_toggle(&params.course_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no toggle recorded for course {}", params.course_id))
    })?;
  Ok(Json(row))
}

/// `GET /courses/history?course_id=<key>`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<CourseParams>,
) -> Result<Json<Vec<CourseToggle>>, ApiError>
where
  S: ConfigStore,
{
  let rows = state
    .store
    .course_toggle_history(&params.course_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `POST /admin/courses`
pub async fn record<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewCourseToggle>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConfigStore,
{
  body.validate()?;

  let row = state
    .store
    .record_course_toggle(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    course_id = %row.course_id,
    enabled = row.enabled,
    changed_by = row.changed_by.as_deref().unwrap_or("-"),
    "course toggle recorded"
  );
  Ok((StatusCode::CREATED, Json(row)))
}

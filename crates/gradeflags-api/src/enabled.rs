//! Handlers for `/enabled`: toggle resolution.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/enabled` | Optional `?course_id=<key>`; an empty value means no course |
//! | `POST` | `/enabled` | Body: `{"course_ids":["<key>", ...]}` |
//!
//! Each request gets its own [`ToggleResolver`], so lookups are memoized for
//! the duration of that request only.

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Query, State},
};
use gradeflags_core::{
  course::CourseKey,
  resolver::ToggleResolver,
  store::ConfigStore,
};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{ApiState, error::ApiError};

// ─── Single ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnabledParams {
  #[serde(default, deserialize_with = "empty_as_none")]
  pub course_id: Option<CourseKey>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<CourseKey>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<String>::deserialize(deserializer)?
    .filter(|raw| !raw.is_empty())
    .map(CourseKey::new)
    .transpose()
    .map_err(de::Error::custom)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnabledResponse {
  pub course_id: Option<CourseKey>,
  pub enabled:   bool,
}

/// `GET /enabled[?course_id=<key>]`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<EnabledParams>,
) -> Result<Json<EnabledResponse>, ApiError>
where
  S: ConfigStore,
{
  let resolver = ToggleResolver::new(state.store.as_ref(), &state.features);
  let enabled = resolver
    .feature_enabled(params.course_id.as_ref())
    .await
    .map_err(ApiError::store)?;

  Ok(Json(EnabledResponse { course_id: params.course_id, enabled }))
}

// ─── Bulk ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkBody {
  pub course_ids: Vec<CourseKey>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkResponse {
  /// The answer with no course context.
  pub enabled: bool,
  pub courses: BTreeMap<CourseKey, bool>,
}

/// `POST /enabled`, body: `{"course_ids":[...]}`
///
/// Duplicate keys are resolved once; the global row is read once.
pub async fn bulk<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkResponse>, ApiError>
where
  S: ConfigStore,
{
  let resolver = ToggleResolver::new(state.store.as_ref(), &state.features);

  let enabled = resolver.feature_enabled(None).await.map_err(ApiError::store)?;

  let mut courses = BTreeMap::new();
  for course_id in body.course_ids {
    let on = resolver
      .feature_enabled(Some(&course_id))
      .await
      .map_err(ApiError::store)?;
    courses.insert(course_id, on);
  }

  Ok(Json(BulkResponse { enabled, courses }))
}

//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use gradeflags_core::{
  course::CourseKey,
  resolver::FeatureSettings,
  toggle::{BatchSetting, CourseToggle, GlobalToggle},
};
use gradeflags_store_sqlite::SqliteStore;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  ApiState, api_router,
  enabled::{BulkResponse, EnabledResponse},
};

async fn state(features: FeatureSettings) -> ApiState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ApiState::new(Arc::new(store), features)
}

async fn send(
  state: &ApiState<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> Response {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  api_router(state.clone()).oneshot(req).await.unwrap()
}

async fn json_body<T: DeserializeOwned>(resp: Response) -> T {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn key(s: &str) -> CourseKey { CourseKey::new(s).unwrap() }

// ── Enabled ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn enabled_is_false_on_empty_store() {
  let st = state(FeatureSettings::default()).await;
  let resp = send(&st, "GET", "/enabled", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: EnabledResponse = json_body(resp).await;
  assert!(!body.enabled);
  assert!(body.course_id.is_none());
}

#[tokio::test]
async fn enabled_follows_course_override() {
  let st = state(FeatureSettings::default()).await;

  let resp = send(&st, "POST", "/admin/global", Some(json!({ "enabled": true }))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = send(
    &st,
    "POST",
    "/admin/courses",
    Some(json!({ "course_id": "course-v1:edX+DemoX+2024", "enabled": true })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  // `+` must be percent-encoded in a query string.
  let resp = send(&st, "GET", "/enabled?course_id=course-v1:edX%2BDemoX%2B2024", None).await;
  let body: EnabledResponse = json_body(resp).await;
  assert!(body.enabled);
  assert_eq!(body.course_id, Some(key("course-v1:edX+DemoX+2024")));

  let resp = send(&st, "GET", "/enabled?course_id=course-v1:other%2BX%2BY", None).await;
  let body: EnabledResponse = json_body(resp).await;
  assert!(!body.enabled);
}

#[tokio::test]
async fn empty_course_id_gives_global_answer() {
  let st = state(FeatureSettings::default()).await;
  send(
    &st,
    "POST",
    "/admin/global",
    Some(json!({ "enabled": true, "enabled_for_all_courses": false })),
  )
  .await;

  let resp = send(&st, "GET", "/enabled?course_id=", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: EnabledResponse = json_body(resp).await;
  assert!(body.course_id.is_none());
  assert!(body.enabled);

  let resp = send(&st, "GET", "/enabled?course_id=has%20space", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_override_enables_everything() {
  let st = state(FeatureSettings { persistent_grades_enabled_for_all_tests: true }).await;
  let resp = send(&st, "GET", "/enabled?course_id=course-v1:a%2Bb%2Bc", None).await;
  let body: EnabledResponse = json_body(resp).await;
  assert!(body.enabled);
}

#[tokio::test]
async fn bulk_enabled_resolves_each_course() {
  let st = state(FeatureSettings::default()).await;
  send(&st, "POST", "/admin/global", Some(json!({ "enabled": true }))).await;
  send(
    &st,
    "POST",
    "/admin/courses",
    Some(json!({ "course_id": "course-v1:a+b+c", "enabled": true })),
  )
  .await;

  let resp = send(
    &st,
    "POST",
    "/enabled",
    Some(json!({ "course_ids": ["course-v1:a+b+c", "course-v1:d+e+f", "course-v1:a+b+c"] })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: BulkResponse = json_body(resp).await;
  assert!(body.enabled);
  assert_eq!(body.courses.len(), 2);
  assert!(body.courses[&key("course-v1:a+b+c")]);
  assert!(!body.courses[&key("course-v1:d+e+f")]);
}

#[tokio::test]
async fn invalid_course_key_is_rejected() {
  let st = state(FeatureSettings::default()).await;
  let resp = send(
    &st,
    "POST",
    "/admin/courses",
    Some(json!({ "course_id": "has space", "enabled": true })),
  )
  .await;
  assert!(resp.status().is_client_error());
}

// ── Global ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn global_current_404_then_history() {
  let st = state(FeatureSettings::default()).await;

  let resp = send(&st, "GET", "/global", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let err: Value = json_body(resp).await;
  assert!(err["error"].as_str().unwrap().contains("no global toggle"));

  send(&st, "POST", "/admin/global", Some(json!({ "enabled": false }))).await;
  send(
    &st,
    "POST",
    "/admin/global",
    Some(json!({ "enabled": true, "enabled_for_all_courses": true, "changed_by": "ops" })),
  )
  .await;

  let current: GlobalToggle = json_body(send(&st, "GET", "/global", None).await).await;
  assert!(current.enabled);
  assert!(current.enabled_for_all_courses);
  assert_eq!(current.changed_by.as_deref(), Some("ops"));

  let history: Vec<GlobalToggle> =
    json_body(send(&st, "GET", "/global/history", None).await).await;
  assert_eq!(history.len(), 2);
  assert_eq!(history[0], current);

  let limited: Vec<GlobalToggle> =
    json_body(send(&st, "GET", "/global/history?limit=1", None).await).await;
  assert_eq!(limited.len(), 1);
}

// ── Courses ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn course_listing_and_history() {
  let st = state(FeatureSettings::default()).await;
  for enabled in [false, true] {
    send(
      &st,
      "POST",
      "/admin/courses",
      Some(json!({ "course_id": "edX/DemoX/Demo_Course", "enabled": enabled })),
    )
    .await;
  }

  let list: Vec<CourseToggle> = json_body(send(&st, "GET", "/courses", None).await).await;
  assert_eq!(list.len(), 1);
  assert!(list[0].enabled);

  let current: CourseToggle = json_body(
    send(&st, "GET", "/courses/current?course_id=edX/DemoX/Demo_Course", None).await,
  )
  .await;
  assert!(current.enabled);

  let history: Vec<CourseToggle> = json_body(
    send(&st, "GET", "/courses/history?course_id=edX/DemoX/Demo_Course", None).await,
  )
  .await;
  assert_eq!(history.len(), 2);

  let resp = send(&st, "GET", "/courses/current?course_id=course-v1:none%2Bx%2By", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Batch ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_setting_write_and_read() {
  let st = state(FeatureSettings::default()).await;

  let resp = send(&st, "GET", "/batch", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(
    &st,
    "POST",
    "/admin/batch",
    Some(json!({ "batch_size": 50, "course_ids": "course-v1:a+b+c course-v1:d+e+f" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let current: BatchSetting = json_body(send(&st, "GET", "/batch", None).await).await;
  assert_eq!(current.batch_size, 50);
  assert_eq!(current.course_keys().unwrap().len(), 2);
}

#[tokio::test]
async fn batch_setting_rejects_zero_size() {
  let st = state(FeatureSettings::default()).await;
  let resp = send(
    &st,
    "POST",
    "/admin/batch",
    Some(json!({ "batch_size": 0, "course_ids": "" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

//! Async HTTP client wrapping the gradeflags JSON API.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result, anyhow};
use gradeflags_core::{
  course::CourseKey,
  toggle::{
    BatchSetting, CourseToggle, GlobalToggle, NewBatchSetting, NewCourseToggle,
    NewGlobalToggle,
  },
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

/// Connection settings for the gradeflags API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// `GET /api/enabled` response.
#[derive(Debug, Deserialize)]
pub struct Enabled {
  pub course_id: Option<CourseKey>,
  pub enabled:   bool,
}

/// `POST /api/enabled` response.
#[derive(Debug, Deserialize)]
pub struct BulkEnabled {
  pub enabled: bool,
  pub courses: BTreeMap<CourseKey, bool>,
}

/// Async HTTP client for the gradeflags JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// `GET` returning `None` on 404.
  async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<Option<T>> {
    tracing::debug!(path, "GET");
    let resp = self
      .client
      .get(self.url(path))
      .query(query)
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = check(resp, "GET", path).await?;
    resp
      .json()
      .await
      .map(Some)
      .with_context(|| format!("deserialising GET {path}"))
  }

  async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
    tracing::debug!(path, "POST");
    let resp = self
      .auth(self.client.post(self.url(path)))
      .json(body)
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;

    let resp = check(resp, "POST", path).await?;
    resp
      .json()
      .await
      .with_context(|| format!("deserialising POST {path}"))
  }

  // ── Resolution ────────────────────────────────────────────────────────────

  /// `GET /api/enabled[?course_id=<key>]`
  pub async fn enabled(&self, course_id: Option<&CourseKey>) -> Result<Enabled> {
    let query: Vec<_> = course_id
      .map(|c| ("course_id", c.to_string()))
      .into_iter()
      .collect();
    self
      .get("/enabled", &query)
      .await?
      .ok_or_else(|| anyhow!("GET /enabled → 404"))
  }

  /// `POST /api/enabled`
  pub async fn enabled_bulk(&self, course_ids: &[CourseKey]) -> Result<BulkEnabled> {
    self
      .post("/enabled", &json!({ "course_ids": course_ids }))
      .await
  }

  // ── Global ────────────────────────────────────────────────────────────────

  pub async fn global(&self) -> Result<Option<GlobalToggle>> {
    self.get("/global", &[]).await
  }

  pub async fn global_history(&self, limit: Option<usize>) -> Result<Vec<GlobalToggle>> {
    let query: Vec<_> = limit
      .map(|l| ("limit", l.to_string()))
      .into_iter()
      .collect();
    Ok(self.get("/global/history", &query).await?.unwrap_or_default())
  }

  pub async fn record_global(&self, input: &NewGlobalToggle) -> Result<GlobalToggle> {
    self.post("/admin/global", input).await
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  pub async fn courses(&self) -> Result<Vec<CourseToggle>> {
    Ok(self.get("/courses", &[]).await?.unwrap_or_default())
  }

  pub async fn course(&self, course_id: &CourseKey) -> Result<Option<CourseToggle>> {
    self
      .get("/courses/current", &[("course_id", course_id.to_string())])
      .await
  }

  pub async fn course_history(&self, course_id: &CourseKey) -> Result<Vec<CourseToggle>> {
    Ok(
      self
        .get("/courses/history", &[("course_id", course_id.to_string())])
        .await?
        .unwrap_or_default(),
    )
  }

  pub async fn record_course(&self, input: &NewCourseToggle) -> Result<CourseToggle> {
    self.post("/admin/courses", input).await
  }

  // ── Batch ─────────────────────────────────────────────────────────────────

  pub async fn batch(&self) -> Result<Option<BatchSetting>> {
    self.get("/batch", &[]).await
  }

  pub async fn record_batch(&self, input: &NewBatchSetting) -> Result<BatchSetting> {
    self.post("/admin/batch", input).await
  }
}

/// Turn a non-success response into an error carrying the server's message.
async fn check(resp: Response, method: &str, path: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<serde_json::Value>()
    .await
    .ok()
    .and_then(|v| v["error"].as_str().map(str::to_owned))
    .unwrap_or_default();
  Err(anyhow!("{method} {path} → {status} {message}"))
}

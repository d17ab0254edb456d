//! HTTP server for the grades feature toggles.
//!
//! Mounts the JSON API from `gradeflags-api` under `/api`, with HTTP Basic
//! auth in front of the admin (write) routes, over any [`ConfigStore`].

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Json, Router, middleware, routing::get};
use gradeflags_api::ApiState;
use gradeflags_core::{resolver::FeatureSettings, store::ConfigStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GRADEFLAGS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  #[serde(default)]
  pub features:           FeatureSettings,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8130 }

/// `GRADEFLAGS_*` environment overrides. Nested keys use a double underscore,
/// e.g. `GRADEFLAGS_FEATURES__PERSISTENT_GRADES_ENABLED_FOR_ALL_TESTS`.
pub fn env_source() -> config::Environment {
  config::Environment::with_prefix("GRADEFLAGS")
    .prefix_separator("_")
    .separator("__")
}

/// Read the optional TOML file at `path` and overlay `env` on top of it.
pub fn load_config(
  path: &Path,
  env: config::Environment,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()?
    .try_deserialize()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
#[derive(Clone)]
pub struct AppState<S: ConfigStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

impl<S: ConfigStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let auth = AuthConfig {
      username:      config.auth_username.clone(),
      password_hash: config.auth_password_hash.clone(),
    };
    Self { store: Arc::new(store), config: Arc::new(config), auth: Arc::new(auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ConfigStore + 'static,
{
  let api_state = ApiState::new(Arc::clone(&state.store), state.config.features.clone());

  let admin = gradeflags_api::admin_routes(api_state.clone())
    .route_layer(middleware::from_fn_with_state(Arc::clone(&state.auth), require_auth));

  Router::new()
    .route("/health", get(health))
    .nest("/api", gradeflags_api::read_routes(api_state).merge(admin))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use gradeflags_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use tower::ServiceExt as _;

  async fn make_state(password: &str, features: FeatureSettings) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState::new(store, ServerConfig {
      host:               "127.0.0.1".to_string(),
      port:               8130,
      store_path:         PathBuf::from(":memory:"),
      auth_username:      "admin".to_string(),
      auth_password_hash: hash,
      features,
    })
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    state:   AppState<SqliteStore>,
    method:  &str,
    uri:     &str,
    auth:    Option<&str>,
    body:    &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(a) = auth {
      builder = builder.header(header::AUTHORIZATION, a);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn health_is_public() {
    let state = make_state("secret", FeatureSettings::default()).await;
    let resp  = oneshot_raw(state, "GET", "/health", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn reads_need_no_auth() {
    let state = make_state("secret", FeatureSettings::default()).await;
    let resp  = oneshot_raw(state, "GET", "/api/enabled", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["enabled"], json!(false));
  }

  #[tokio::test]
  async fn admin_write_without_auth_is_401() {
    let state = make_state("secret", FeatureSettings::default()).await;
    let resp  = oneshot_raw(
      state.clone(),
      "POST",
      "/api/admin/global",
      None,
      r#"{"enabled":true}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    // Nothing was written.
    assert!(state.store.current_global_toggle().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn admin_write_with_wrong_password_is_401() {
    let state = make_state("secret", FeatureSettings::default()).await;
    let auth  = auth_header("admin", "nope");
    let resp  = oneshot_raw(
      state,
      "POST",
      "/api/admin/courses",
      Some(&auth),
      r#"{"course_id":"course-v1:a+b+c","enabled":true}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_writes_drive_resolution() {
    let state = make_state("secret", FeatureSettings::default()).await;
    let auth  = auth_header("admin", "secret");

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/admin/global",
      Some(&auth),
      r#"{"enabled":true,"changed_by":"admin"}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/admin/courses",
      Some(&auth),
      r#"{"course_id":"course-v1:a+b+c","enabled":true}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = oneshot_raw(
      state.clone(),
      "GET",
      "/api/enabled?course_id=course-v1:a%2Bb%2Bc",
      None,
      "",
    )
    .await;
    assert_eq!(body_json(resp).await["enabled"], json!(true));

    let resp = oneshot_raw(
      state,
      "GET",
      "/api/enabled?course_id=course-v1:x%2By%2Bz",
      None,
      "",
    )
    .await;
    assert_eq!(body_json(resp).await["enabled"], json!(false));
  }

  #[tokio::test]
  async fn configured_test_override_reaches_resolver() {
    let features = FeatureSettings { persistent_grades_enabled_for_all_tests: true };
    let state    = make_state("secret", features).await;
    let resp     = oneshot_raw(state, "GET", "/api/enabled", None, "").await;
    assert_eq!(body_json(resp).await["enabled"], json!(true));
  }

  #[test]
  fn config_deserialises_with_defaults() {
    let settings = config::Config::builder()
      .set_override("store_path", "/tmp/flags.sqlite3").unwrap()
      .set_override("auth_username", "admin").unwrap()
      .set_override("auth_password_hash", "$argon2id$stub").unwrap()
      .set_override("features.persistent_grades_enabled_for_all_tests", true).unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8130);
    assert!(cfg.features.persistent_grades_enabled_for_all_tests);
  }

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    env_source().source(Some(
      vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    ))
  }

  #[test]
  fn single_underscore_env_vars_are_read() {
    let cfg = load_config(
      Path::new("/nonexistent/gradeflags.toml"),
      env(&[
        ("GRADEFLAGS_PORT", "9999"),
        ("GRADEFLAGS_STORE_PATH", "/tmp/flags.sqlite3"),
        ("GRADEFLAGS_AUTH_USERNAME", "admin"),
        ("GRADEFLAGS_AUTH_PASSWORD_HASH", "$argon2id$stub"),
        ("GRADEFLAGS_FEATURES__PERSISTENT_GRADES_ENABLED_FOR_ALL_TESTS", "true"),
      ]),
    )
    .unwrap();
    assert_eq!(cfg.port, 9999);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/flags.sqlite3"));
    assert_eq!(cfg.auth_username, "admin");
    assert!(cfg.features.persistent_grades_enabled_for_all_tests);
  }

  #[test]
  fn env_overrides_config_file() {
    let path = std::env::temp_dir()
      .join(format!("gradeflags-config-{}.toml", std::process::id()));
    std::fs::write(
      &path,
      "port = 7000\nstore_path = \"/var/lib/flags.sqlite3\"\nauth_username = \"file\"\nauth_password_hash = \"\"\n",
    )
    .unwrap();

    let cfg = load_config(&path, env(&[("GRADEFLAGS_AUTH_USERNAME", "env")]));
    std::fs::remove_file(&path).ok();
    let cfg = cfg.unwrap();

    assert_eq!(cfg.port, 7000);
    assert_eq!(cfg.auth_username, "env");
    assert_eq!(cfg.host, "127.0.0.1");
    assert!(!cfg.features.persistent_grades_enabled_for_all_tests);
  }
}

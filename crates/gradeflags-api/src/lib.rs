//! JSON REST API for the grades feature toggles.
//!
//! Exposes axum [`Router`]s backed by any
//! [`gradeflags_core::store::ConfigStore`]. Read routes and admin (write)
//! routes are separate routers so the caller can put auth in front of the
//! admin ones only. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gradeflags_api::read_routes(state.clone())
//!   .merge(gradeflags_api::admin_routes(state).route_layer(auth)))
//! ```

pub mod batch;
pub mod courses;
pub mod enabled;
pub mod error;
pub mod global;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gradeflags_core::{resolver::FeatureSettings, store::ConfigStore};

pub use error::ApiError;

/// State shared by every API handler.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub features: Arc<FeatureSettings>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, features: FeatureSettings) -> Self {
    Self { store, features: Arc::new(features) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), features: Arc::clone(&self.features) }
  }
}

/// Unauthenticated read routes.
pub fn read_routes<S>(state: ApiState<S>) -> Router<()>
where
  S: ConfigStore + 'static,
{
  Router::new()
    .route("/enabled", get(enabled::get_one::<S>).post(enabled::bulk::<S>))
    .route("/global", get(global::current::<S>))
    .route("/global/history", get(global::history::<S>))
    .route("/courses", get(courses::list::<S>))
    .route("/courses/current", get(courses::current::<S>))
    .route("/courses/history", get(courses::history::<S>))
    .route("/batch", get(batch::current::<S>))
    .with_state(state)
}

/// Write routes; every request appends a new versioned row.
pub fn admin_routes<S>(state: ApiState<S>) -> Router<()>
where
  S: ConfigStore + 'static,
{
  Router::new()
    .route("/admin/global", post(global::record::<S>))
    .route("/admin/courses", post(courses::record::<S>))
    .route("/admin/batch", post(batch::record::<S>))
    .with_state(state)
}

/// Read and admin routes with no auth in front of either.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: ConfigStore + 'static,
{
  read_routes(state.clone()).merge(admin_routes(state))
}

#[cfg(test)]
mod tests;

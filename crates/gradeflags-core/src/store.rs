//! The `ConfigStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `gradeflags-store-sqlite`). The resolver and the API depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  course::CourseKey,
  toggle::{
    BatchSetting, CourseToggle, GlobalToggle, NewBatchSetting, NewCourseToggle,
    NewGlobalToggle,
  },
};

/// Abstraction over a versioned configuration store.
///
/// All writes are append-only: each `record_*` call inserts a new row and
/// never touches older ones. "Current" means the row with the greatest
/// `change_date`; ties go to the row inserted last.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ConfigStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Global toggle ─────────────────────────────────────────────────────

  /// Append a global toggle row. `change_date` defaults to now.
  fn record_global_toggle(
    &self,
    input: NewGlobalToggle,
  ) -> impl Future<Output = Result<GlobalToggle, Self::Error>> + Send + '_;

  /// The current global toggle row, or `None` if none was ever recorded.
  fn current_global_toggle(
    &self,
  ) -> impl Future<Output = Result<Option<GlobalToggle>, Self::Error>> + Send + '_;

  /// Global toggle rows, newest first. `None` returns the full history.
  fn global_toggle_history(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<GlobalToggle>, Self::Error>> + Send + '_;

  // ── Course toggles ────────────────────────────────────────────────────

  /// Append a course toggle row. `change_date` defaults to now.
  fn record_course_toggle(
    &self,
    input: NewCourseToggle,
  ) -> impl Future<Output = Result<CourseToggle, Self::Error>> + Send + '_;

  /// The current row for `course_id`, or `None` if the course has no rows.
  fn current_course_toggle<'a>(
    &'a self,
    course_id: &'a CourseKey,
  ) -> impl Future<Output = Result<Option<CourseToggle>, Self::Error>> + Send + 'a;

  /// Every row recorded for `course_id`, newest first.
  fn course_toggle_history<'a>(
    &'a self,
    course_id: &'a CourseKey,
  ) -> impl Future<Output = Result<Vec<CourseToggle>, Self::Error>> + Send + 'a;

  /// The current row of every course that has one, ordered by course key.
  fn current_course_toggles(
    &self,
  ) -> impl Future<Output = Result<Vec<CourseToggle>, Self::Error>> + Send + '_;

  // ── Batch setting ─────────────────────────────────────────────────────

  /// Append a batch setting row. `change_date` defaults to now.
  fn record_batch_setting(
    &self,
    input: NewBatchSetting,
  ) -> impl Future<Output = Result<BatchSetting, Self::Error>> + Send + '_;

  /// The current batch setting row, or `None` if none was ever recorded.
  fn current_batch_setting(
    &self,
  ) -> impl Future<Output = Result<Option<BatchSetting>, Self::Error>> + Send + '_;

  // ── Derived ───────────────────────────────────────────────────────────

  /// Whether the current row for `course_id` exists and is enabled.
  fn course_is_enabled<'a>(
    &'a self,
    course_id: &'a CourseKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a {
    async move {
      Ok(
        self
          .current_course_toggle(course_id)
          .await?
          .is_some_and(|c| c.enabled),
      )
    }
  }

  /// The current batch setting, or [`BatchSetting::unset`] when no row exists.
  fn effective_batch_setting(
    &self,
  ) -> impl Future<Output = Result<BatchSetting, Self::Error>> + Send + '_ {
    async move {
      Ok(
        self
          .current_batch_setting()
          .await?
          .unwrap_or_else(BatchSetting::unset),
      )
    }
  }
}

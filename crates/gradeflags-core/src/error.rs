//! Error types for `gradeflags-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid course key {0:?}: {1}")]
  InvalidCourseKey(String, &'static str),

  #[error("batch size must be at least 1, got {0}")]
  InvalidBatchSize(i64),

  #[error("change date {0} is outside years 0000-9999")]
  ChangeDateOutOfRange(DateTime<Utc>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

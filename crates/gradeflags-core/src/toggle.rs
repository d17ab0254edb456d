//! Versioned configuration records.
//!
//! Every record is an immutable row. Changing a setting means appending a new
//! row with a later `change_date`; the row with the greatest `change_date` for
//! a key is its *current* row. Older rows stay behind as the audit trail.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  course::{CourseKey, parse_course_list},
};

/// Batch size used when no [`BatchSetting`] row exists.
pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// Reject an explicit `change_date` that cannot be stored as a four-digit
/// year timestamp.
fn check_change_date(change_date: Option<DateTime<Utc>>) -> Result<()> {
  match change_date {
    Some(dt) if !(0..=9999).contains(&dt.year()) => {
      Err(Error::ChangeDateOutOfRange(dt))
    }
    _ => Ok(()),
  }
}

// ─── Global toggle ───────────────────────────────────────────────────────────

/// Platform-wide switch for persistent grades.
///
/// When `enabled` is true, individual courses must also be enabled through a
/// [`CourseToggle`], unless `enabled_for_all_courses` overrides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalToggle {
  pub enabled:                 bool,
  pub enabled_for_all_courses: bool,
  pub change_date:             DateTime<Utc>,
  pub changed_by:              Option<String>,
}

impl fmt::Display for GlobalToggle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "PersistentGradesEnabledFlag: enabled {}", self.enabled)
  }
}

/// Input for [`ConfigStore::record_global_toggle`](crate::store::ConfigStore::record_global_toggle).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGlobalToggle {
  pub enabled:                 bool,
  #[serde(default)]
  pub enabled_for_all_courses: bool,
  #[serde(default)]
  pub changed_by:              Option<String>,
  /// Defaults to the time of insertion.
  #[serde(default)]
  pub change_date:             Option<DateTime<Utc>>,
}

impl NewGlobalToggle {
  pub fn new(enabled: bool) -> Self {
    Self { enabled, ..Default::default() }
  }

  pub fn for_all_courses(mut self, enabled_for_all_courses: bool) -> Self {
    self.enabled_for_all_courses = enabled_for_all_courses;
    self
  }

  pub fn validate(&self) -> Result<()> { check_change_date(self.change_date) }
}

// ─── Course toggle ───────────────────────────────────────────────────────────

/// Per-course switch. Only has an effect while the [`GlobalToggle`] is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseToggle {
  pub course_id:   CourseKey,
  pub enabled:     bool,
  pub change_date: DateTime<Utc>,
  pub changed_by:  Option<String>,
}

impl fmt::Display for CourseToggle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let not_en = if self.enabled { "" } else { "Not " };
    write!(f, "Course '{}': Persistent Grades {not_en}Enabled", self.course_id)
  }
}

/// Input for [`ConfigStore::record_course_toggle`](crate::store::ConfigStore::record_course_toggle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseToggle {
  pub course_id:   CourseKey,
  pub enabled:     bool,
  #[serde(default)]
  pub changed_by:  Option<String>,
  #[serde(default)]
  pub change_date: Option<DateTime<Utc>>,
}

impl NewCourseToggle {
  pub fn new(course_id: CourseKey, enabled: bool) -> Self {
    Self { course_id, enabled, changed_by: None, change_date: None }
  }

  pub fn at(mut self, change_date: DateTime<Utc>) -> Self {
    self.change_date = Some(change_date);
    self
  }

  pub fn validate(&self) -> Result<()> { check_change_date(self.change_date) }
}

// ─── Batch setting ───────────────────────────────────────────────────────────

/// Sizing for the grade-computation batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSetting {
  pub enabled:     bool,
  pub batch_size:  u32,
  /// Whitespace-separated list of course keys for which to compute grades.
  pub course_ids:  String,
  pub change_date: DateTime<Utc>,
  pub changed_by:  Option<String>,
}

impl BatchSetting {
  /// The setting in effect before any row is recorded: disabled, with the
  /// default batch size and no courses.
  pub fn unset() -> Self {
    Self {
      enabled:     false,
      batch_size:  DEFAULT_BATCH_SIZE,
      course_ids:  String::new(),
      change_date: DateTime::<Utc>::UNIX_EPOCH,
      changed_by:  None,
    }
  }

  /// Parse [`Self::course_ids`] into keys.
  pub fn course_keys(&self) -> Result<Vec<CourseKey>> {
    parse_course_list(&self.course_ids)
  }

  /// Split `total` items into `(offset, len)` batches of at most
  /// `batch_size` items each.
  pub fn batch_offsets(&self, total: u64) -> Vec<(u64, u64)> {
    batch_offsets(total, self.batch_size)
  }
}

/// Input for [`ConfigStore::record_batch_setting`](crate::store::ConfigStore::record_batch_setting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatchSetting {
  #[serde(default)]
  pub enabled:     bool,
  #[serde(default = "default_batch_size")]
  pub batch_size:  u32,
  pub course_ids:  String,
  #[serde(default)]
  pub changed_by:  Option<String>,
  #[serde(default)]
  pub change_date: Option<DateTime<Utc>>,
}

impl NewBatchSetting {
  /// An enabled setting for `course_ids`.
  pub fn new(batch_size: u32, course_ids: impl Into<String>) -> Self {
    Self {
      enabled: true,
      batch_size,
      course_ids: course_ids.into(),
      changed_by: None,
      change_date: None,
    }
  }

  /// Reject a zero batch size, an unparseable course list, or an
  /// unstorable change date.
  pub fn validate(&self) -> Result<()> {
    if self.batch_size == 0 {
      return Err(Error::InvalidBatchSize(0));
    }
    parse_course_list(&self.course_ids)?;
    check_change_date(self.change_date)
  }
}

fn default_batch_size() -> u32 { DEFAULT_BATCH_SIZE }

/// `(offset, len)` pairs covering `0..total` in steps of `batch_size`.
pub fn batch_offsets(total: u64, batch_size: u32) -> Vec<(u64, u64)> {
  let step = u64::from(batch_size.max(1));
  (0..total)
    .step_by(step as usize)
    .map(|offset| (offset, step.min(total - offset)))
    .collect()
}

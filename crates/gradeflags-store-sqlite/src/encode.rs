//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings
//! (`2024-05-01T12:00:00.000000Z`) so that lexical order in SQL matches
//! chronological order. Booleans use SQLite's native 0/1 integers.

use chrono::{DateTime, SecondsFormat, Utc};
use gradeflags_core::{
  course::CourseKey,
  toggle::{BatchSetting, CourseToggle, GlobalToggle},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Truncate to the precision the column keeps, so a returned row compares
/// equal to the same row read back later.
pub fn stored_precision(dt: DateTime<Utc>) -> Result<DateTime<Utc>> {
  decode_dt(&encode_dt(dt))
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn decode_batch_size(value: i64) -> Result<u32> {
  u32::try_from(value)
    .ok()
    .filter(|v| *v >= 1)
    .ok_or(Error::OutOfRange { column: "batch_size", value })
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column values for a `global_toggles` row, before decoding.
pub struct RawGlobalToggle {
  pub change_date:             String,
  pub changed_by:              Option<String>,
  pub enabled:                 bool,
  pub enabled_for_all_courses: bool,
}

impl RawGlobalToggle {
  pub const COLUMNS: &'static str =
    "change_date, changed_by, enabled, enabled_for_all_courses";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      change_date:             row.get(0)?,
      changed_by:              row.get(1)?,
      enabled:                 row.get(2)?,
      enabled_for_all_courses: row.get(3)?,
    })
  }

  pub fn into_toggle(self) -> Result<GlobalToggle> {
    Ok(GlobalToggle {
      enabled:                 self.enabled,
      enabled_for_all_courses: self.enabled_for_all_courses,
      change_date:             decode_dt(&self.change_date)?,
      changed_by:              self.changed_by,
    })
  }
}

/// Column values for a `course_toggles` row, before decoding.
pub struct RawCourseToggle {
  pub change_date: String,
  pub changed_by:  Option<String>,
  pub enabled:     bool,
  pub course_id:   String,
}

impl RawCourseToggle {
  pub const COLUMNS: &'static str = "change_date, changed_by, enabled, course_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      change_date: row.get(0)?,
      changed_by:  row.get(1)?,
      enabled:     row.get(2)?,
      course_id:   row.get(3)?,
    })
  }

  pub fn into_toggle(self) -> Result<CourseToggle> {
    Ok(CourseToggle {
      course_id:   CourseKey::new(self.course_id)?,
      enabled:     self.enabled,
      change_date: decode_dt(&self.change_date)?,
      changed_by:  self.changed_by,
    })
  }
}

/// Column values for a `batch_settings` row, before decoding.
pub struct RawBatchSetting {
  pub change_date: String,
  pub changed_by:  Option<String>,
  pub enabled:     bool,
  pub batch_size:  i64,
  pub course_ids:  String,
}

impl RawBatchSetting {
  pub const COLUMNS: &'static str =
    "change_date, changed_by, enabled, batch_size, course_ids";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      change_date: row.get(0)?,
      changed_by:  row.get(1)?,
      enabled:     row.get(2)?,
      batch_size:  row.get(3)?,
      course_ids:  row.get(4)?,
    })
  }

  pub fn into_setting(self) -> Result<BatchSetting> {
    Ok(BatchSetting {
      enabled:     self.enabled,
      batch_size:  decode_batch_size(self.batch_size)?,
      course_ids:  self.course_ids,
      change_date: decode_dt(&self.change_date)?,
      changed_by:  self.changed_by,
    })
  }
}

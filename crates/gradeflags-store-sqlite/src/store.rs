//! [`SqliteStore`]: the SQLite implementation of [`ConfigStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::types::Value;

use gradeflags_core::{
  course::CourseKey,
  store::ConfigStore,
  toggle::{
    BatchSetting, CourseToggle, GlobalToggle, NewBatchSetting, NewCourseToggle,
    NewGlobalToggle,
  },
};

use crate::{
  Result,
  encode::{
    RawBatchSetting, RawCourseToggle, RawGlobalToggle, encode_dt, stored_precision,
  },
  schema::SCHEMA,
};

/// Newest first; later inserts win change_date ties.
const NEWEST_FIRST: &str = "ORDER BY change_date DESC, id DESC";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A feature-toggle store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run an `INSERT` with positional parameters.
  async fn insert(&self, sql: &'static str, params: Vec<Value>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(sql, rusqlite::params_from_iter(params))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT` and map every row with `map`.
  async fn query<T, F>(&self, sql: String, params: Vec<Value>, map: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| map(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn global_rows(&self, limit: Option<usize>) -> Result<Vec<GlobalToggle>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let sql = format!(
      "SELECT {} FROM global_toggles {NEWEST_FIRST} LIMIT ?1",
      RawGlobalToggle::COLUMNS
    );
    self
      .query(sql, vec![Value::Integer(limit)], RawGlobalToggle::from_row)
      .await?
      .into_iter()
      .map(RawGlobalToggle::into_toggle)
      .collect()
  }

  async fn course_rows(
    &self,
    course_id: &CourseKey,
    limit: Option<usize>,
  ) -> Result<Vec<CourseToggle>> {
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let sql = format!(
      "SELECT {} FROM course_toggles WHERE course_id = ?1 {NEWEST_FIRST} LIMIT ?2",
      RawCourseToggle::COLUMNS
    );
    self
      .query(
        sql,
        vec![Value::Text(course_id.to_string()), Value::Integer(limit)],
        RawCourseToggle::from_row,
      )
      .await?
      .into_iter()
      .map(RawCourseToggle::into_toggle)
      .collect()
  }
}

// ─── ConfigStore impl ────────────────────────────────────────────────────────

impl ConfigStore for SqliteStore {
  type Error = crate::Error;

  // ── Global toggle ─────────────────────────────────────────────────────────

  async fn record_global_toggle(&self, input: NewGlobalToggle) -> Result<GlobalToggle> {
    input.validate()?;

    let row = GlobalToggle {
      enabled:                 input.enabled,
      enabled_for_all_courses: input.enabled_for_all_courses,
      change_date:             stored_precision(input.change_date.unwrap_or_else(Utc::now))?,
      changed_by:              input.changed_by,
    };

    self
      .insert(
        "INSERT INTO global_toggles (change_date, changed_by, enabled, enabled_for_all_courses)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          Value::Text(encode_dt(row.change_date)),
          row.changed_by.clone().map_or(Value::Null, Value::Text),
          Value::Integer(row.enabled.into()),
          Value::Integer(row.enabled_for_all_courses.into()),
        ],
      )
      .await?;

    Ok(row)
  }

  async fn current_global_toggle(&self) -> Result<Option<GlobalToggle>> {
    Ok(self.global_rows(Some(1)).await?.into_iter().next())
  }

  async fn global_toggle_history(&self, limit: Option<usize>) -> Result<Vec<GlobalToggle>> {
    self.global_rows(limit).await
  }

  // ── Course toggles ────────────────────────────────────────────────────────

  async fn record_course_toggle(&self, input: NewCourseToggle) -> Result<CourseToggle> {
    input.validate()?;

    let row = CourseToggle {
      course_id:   input.course_id,
      enabled:     input.enabled,
      change_date: stored_precision(input.change_date.unwrap_or_else(Utc::now))?,
      changed_by:  input.changed_by,
    };

    self
      .insert(
        "INSERT INTO course_toggles (change_date, changed_by, enabled, course_id)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          Value::Text(encode_dt(row.change_date)),
          row.changed_by.clone().map_or(Value::Null, Value::Text),
          Value::Integer(row.enabled.into()),
          Value::Text(row.course_id.to_string()),
        ],
      )
      .await?;

    Ok(row)
  }

  async fn current_course_toggle(&self, course_id: &CourseKey) -> Result<Option<CourseToggle>> {
    Ok(self.course_rows(course_id, Some(1)).await?.into_iter().next())
  }

  async fn course_toggle_history(&self, course_id: &CourseKey) -> Result<Vec<CourseToggle>> {
    self.course_rows(course_id, None).await
  }

  async fn current_course_toggles(&self) -> Result<Vec<CourseToggle>> {
    let sql = format!(
      "SELECT {cols} FROM course_toggles c
       WHERE c.id = (
         SELECT latest.id FROM course_toggles latest
         WHERE latest.course_id = c.course_id
         {NEWEST_FIRST}
         LIMIT 1
       )
       ORDER BY c.course_id",
      cols = RawCourseToggle::COLUMNS,
    );
    self
      .query(sql, vec![], RawCourseToggle::from_row)
      .await?
      .into_iter()
      .map(RawCourseToggle::into_toggle)
      .collect()
  }

  // ── Batch setting ─────────────────────────────────────────────────────────

  async fn record_batch_setting(&self, input: NewBatchSetting) -> Result<BatchSetting> {
    input.validate()?;

    let row = BatchSetting {
      enabled:     input.enabled,
      batch_size:  input.batch_size,
      course_ids:  input.course_ids,
      change_date: stored_precision(input.change_date.unwrap_or_else(Utc::now))?,
      changed_by:  input.changed_by,
    };

    self
      .insert(
        "INSERT INTO batch_settings (change_date, changed_by, enabled, batch_size, course_ids)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          Value::Text(encode_dt(row.change_date)),
          row.changed_by.clone().map_or(Value::Null, Value::Text),
          Value::Integer(row.enabled.into()),
          Value::Integer(row.batch_size.into()),
          Value::Text(row.course_ids.clone()),
        ],
      )
      .await?;

    Ok(row)
  }

  async fn current_batch_setting(&self) -> Result<Option<BatchSetting>> {
    let sql = format!(
      "SELECT {} FROM batch_settings {NEWEST_FIRST} LIMIT 1",
      RawBatchSetting::COLUMNS
    );
    self
      .query(sql, vec![], RawBatchSetting::from_row)
      .await?
      .into_iter()
      .next()
      .map(RawBatchSetting::into_setting)
      .transpose()
  }
}

//! SQL schema for the gradeflags SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- All three tables are strictly append-only.
-- No UPDATE or DELETE is ever issued against them; older rows are the audit
-- trail. The current row for a key is the one with the greatest change_date,
-- ties broken by the greater id.

CREATE TABLE IF NOT EXISTS global_toggles (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    change_date             TEXT    NOT NULL,   -- RFC 3339 UTC, microseconds
    changed_by              TEXT,
    enabled                 INTEGER NOT NULL,
    enabled_for_all_courses INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS course_toggles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    change_date TEXT    NOT NULL,
    changed_by  TEXT,
    enabled     INTEGER NOT NULL,
    course_id   TEXT    NOT NULL CHECK (length(course_id) BETWEEN 1 AND 255)
);

CREATE TABLE IF NOT EXISTS batch_settings (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    change_date TEXT    NOT NULL,
    changed_by  TEXT,
    enabled     INTEGER NOT NULL,
    batch_size  INTEGER NOT NULL DEFAULT 100 CHECK (batch_size >= 1),
    course_ids  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS global_toggles_date_idx ON global_toggles(change_date, id);
CREATE INDEX IF NOT EXISTS course_toggles_key_idx  ON course_toggles(course_id, change_date, id);
CREATE INDEX IF NOT EXISTS batch_settings_date_idx ON batch_settings(change_date, id);

PRAGMA user_version = 1;
";

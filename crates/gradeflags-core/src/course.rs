//! [`CourseKey`]: the opaque identifier a course toggle is keyed on.
//!
//! Keys are never interpreted: `course-v1:Org+Num+Run` and the legacy
//! `Org/Num/Run` form are equally valid. The only rules are the ones the
//! storage column imposes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum length of a course key, in characters.
pub const MAX_COURSE_KEY_LEN: usize = 255;

/// An opaque, validated course identifier.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct CourseKey(String);

impl CourseKey {
  pub fn new(raw: impl Into<String>) -> Result<Self> {
    let raw = raw.into();
    if raw.is_empty() {
      return Err(Error::InvalidCourseKey(raw, "empty"));
    }
    if raw.chars().count() > MAX_COURSE_KEY_LEN {
      return Err(Error::InvalidCourseKey(raw, "longer than 255 characters"));
    }
    if raw.chars().any(char::is_whitespace) {
      return Err(Error::InvalidCourseKey(raw, "contains whitespace"));
    }
    Ok(Self(raw))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CourseKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for CourseKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::new(s) }
}

impl TryFrom<String> for CourseKey {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<CourseKey> for String {
  fn from(key: CourseKey) -> Self { key.0 }
}

impl AsRef<str> for CourseKey {
  fn as_ref(&self) -> &str { &self.0 }
}

/// Parse a whitespace-separated list of course keys, as stored in
/// [`BatchSetting::course_ids`](crate::toggle::BatchSetting::course_ids).
pub fn parse_course_list(raw: &str) -> Result<Vec<CourseKey>> {
  raw.split_whitespace().map(CourseKey::new).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_modern_and_legacy_keys() {
    assert!(CourseKey::new("course-v1:edX+DemoX+Demo_Course").is_ok());
    assert!(CourseKey::new("edX/DemoX/Demo_Course").is_ok());
  }

  #[test]
  fn rejects_empty_and_whitespace() {
    assert!(matches!(
      CourseKey::new(""),
      Err(Error::InvalidCourseKey(_, "empty"))
    ));
    assert!(matches!(
      CourseKey::new("course-v1:a b"),
      Err(Error::InvalidCourseKey(_, "contains whitespace"))
    ));
  }

  #[test]
  fn rejects_overlong_key() {
    let long = "x".repeat(MAX_COURSE_KEY_LEN + 1);
    assert!(CourseKey::new(long).is_err());
    assert!(CourseKey::new("x".repeat(MAX_COURSE_KEY_LEN)).is_ok());
  }

  #[test]
  fn parses_course_list_across_newlines_and_tabs() {
    let keys = parse_course_list("  course-v1:a+b+c\n\tcourse-v1:d+e+f  ").unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].as_str(), "course-v1:a+b+c");
    assert_eq!(keys[1].as_str(), "course-v1:d+e+f");
    assert!(parse_course_list("   ").unwrap().is_empty());
  }

  #[test]
  fn serde_validates_on_deserialize() {
    let key: CourseKey = serde_json::from_str("\"course-v1:a+b+c\"").unwrap();
    assert_eq!(key.to_string(), "course-v1:a+b+c");
    assert!(serde_json::from_str::<CourseKey>("\"\"").is_err());
  }
}

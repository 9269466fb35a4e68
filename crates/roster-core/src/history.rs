//! History entries: the append-only audit trail of a contact.
//!
//! An entry records the field values present at one edit. A missing field
//! means "unchanged at this step", so rendering substitutes a placeholder
//! instead of dropping the row.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result, contact::ContactId};

/// Zone every audit timestamp is shown in, whatever the viewer's locale.
pub const REFERENCE_TZ: Tz = chrono_tz::America::New_York;

/// Shown in place of a field the entry does not carry.
pub const PLACEHOLDER: &str = "--";

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  #[serde(default)]
  pub id:         i64,
  /// Back-reference to the contact. The history endpoint does not echo it,
  /// so readers stamp it from the query.
  #[serde(default)]
  pub contact_id: Option<ContactId>,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name:  Option<String>,
  #[serde(default)]
  pub email:      Option<String>,
  #[serde(default)]
  pub phone:      Option<String>,
  #[serde(default, deserialize_with = "deserialize_timestamp")]
  pub created_at: Option<DateTime<Utc>>,
}

/// Display strings for one history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
  pub timestamp:  String,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
}

impl HistoryEntry {
  pub fn row(&self) -> HistoryRow {
    fn or_placeholder(value: &Option<String>) -> String {
      match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
      }
    }
    HistoryRow {
      timestamp:  self
        .created_at
        .map(format_timestamp)
        .unwrap_or_else(|| PLACEHOLDER.to_string()),
      first_name: or_placeholder(&self.first_name),
      last_name:  or_placeholder(&self.last_name),
      email:      or_placeholder(&self.email),
      phone:      or_placeholder(&self.phone),
    }
  }
}

/// Render `at` in [`REFERENCE_TZ`].
pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.with_timezone(&REFERENCE_TZ)
    .format("%Y-%m-%d %H:%M:%S %Z")
    .to_string()
}

/// Parse a server timestamp.
///
/// RFC 3339 values are taken as-is. Naive ISO values (with `T` or a space
/// between date and time, fraction optional) carry no zone and are read as
/// UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
  if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
    return Ok(at.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
    .ok_or_else(|| Error::Timestamp(raw.to_string()))
}

fn deserialize_timestamp<'de, D>(
  deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  raw
    .as_deref()
    .map(parse_timestamp)
    .transpose()
    .map_err(serde::de::Error::custom)
}

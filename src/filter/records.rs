//! Audit Record Types
//!
//! Records shown by the timestamp log and activity edit history screens.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// What the filter pipeline needs from a record.
pub trait AuditRecord {
    /// Text fields matched by the search query.
    fn search_fields(&self) -> Vec<&str>;
    /// Value matched by the type filter.
    fn record_type(&self) -> &str;
    /// Value matched by the date filter.
    fn record_date(&self) -> Option<NaiveDateTime>;
}

// == Timestamp Record ==
/// One entry of the login/activity timestamp log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampRecord {
    pub id: i64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl AuditRecord for TimestampRecord {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.user_name.as_str(),
            self.email.as_str(),
            self.ip_address.as_str(),
        ]
    }

    fn record_type(&self) -> &str {
        &self.action
    }

    fn record_date(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

// == Activity Edit Record ==
/// One change in the activity data edit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEditRecord {
    pub id: i64,
    #[serde(default)]
    pub activity_name: String,
    #[serde(default)]
    pub editor_name: String,
    #[serde(default)]
    pub editor_email: String,
    #[serde(default)]
    pub edit_type: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub edited_at: Option<NaiveDateTime>,
}

impl AuditRecord for ActivityEditRecord {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.activity_name.as_str(),
            self.editor_name.as_str(),
            self.editor_email.as_str(),
            self.detail.as_str(),
        ]
    }

    fn record_type(&self) -> &str {
        &self.edit_type
    }

    fn record_date(&self) -> Option<NaiveDateTime> {
        self.edited_at
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses the timestamp formats the backend emits.
///
/// RFC 3339 values keep the wall-clock time of their own offset.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn deserialize_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {s}"))),
    }
}

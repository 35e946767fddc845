//! Display helpers shared by the article views: timestamp formatting and slugs.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Largest absolute epoch offset (in milliseconds) a date value may carry.
const MAX_EPOCH_MILLIS: f64 = 8.64e15;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

static SLUG_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_\s-]").expect("slug filter pattern is valid"));
static SLUG_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("slug whitespace pattern is valid"));

/// Timestamp as stored by the document backend (`seconds` + `nanos` since the epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl ProviderTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Converts to a native date, failing for values outside chrono's range.
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// Every shape a stored `created_at`/`approved_at` value may take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    Provider(ProviderTimestamp),
    Native(DateTime<Utc>),
    EpochMillis(f64),
    Absent,
    Unrecognized,
}

impl Timestamp {
    /// Reads a timestamp out of a loosely typed JSON value.
    ///
    /// Accepts `{"seconds", "nanoseconds"}` objects (with or without a leading
    /// underscore), plain numbers (epoch milliseconds) and `null`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Timestamp::Absent,
            Value::Number(number) => number
                .as_f64()
                .map(Timestamp::EpochMillis)
                .unwrap_or(Timestamp::Unrecognized),
            Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64);
                // A missing nanos field means a whole second; a present but unreadable one
                // makes the whole value unreadable.
                let nanos = match map.get("nanoseconds").or_else(|| map.get("_nanoseconds")) {
                    None => Some(0),
                    Some(raw) => raw
                        .as_u64()
                        .filter(|nanos| *nanos < NANOS_PER_SECOND)
                        .and_then(|nanos| u32::try_from(nanos).ok()),
                };

                match (seconds, nanos) {
                    (Some(seconds), Some(nanos)) => {
                        Timestamp::Provider(ProviderTimestamp::new(seconds, nanos))
                    }
                    _ => Timestamp::Unrecognized,
                }
            }
            _ => Timestamp::Unrecognized,
        }
    }

    fn to_date(self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Provider(ts) => ts.to_date(),
            Timestamp::Native(date) => Some(date),
            // Zero is treated like an unset value.
            Timestamp::EpochMillis(millis) if millis == 0.0 => None,
            Timestamp::EpochMillis(millis) => {
                if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
                    return None;
                }
                DateTime::from_timestamp_millis(millis.trunc() as i64)
            }
            Timestamp::Absent | Timestamp::Unrecognized => None,
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Timestamp::from_json(&value))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Native(value)
    }
}

impl From<Option<DateTime<Utc>>> for Timestamp {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map(Timestamp::Native).unwrap_or(Timestamp::Absent)
    }
}

impl From<ProviderTimestamp> for Timestamp {
    fn from(value: ProviderTimestamp) -> Self {
        Timestamp::Provider(value)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::EpochMillis(value as f64)
    }
}

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        Timestamp::EpochMillis(value)
    }
}

/// Formats a timestamp as `Mar 5, 2024`, or an empty string when it cannot be read.
pub fn format_date(value: impl Into<Timestamp>) -> String {
    value
        .into()
        .to_date()
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Lower-cases and trims the title, drops anything but word characters, whitespace and
/// hyphens, then joins whitespace runs with single hyphens.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = SLUG_DISALLOWED.replace_all(lowered.trim(), "");
    SLUG_WHITESPACE.replace_all(&stripped, "-").into_owned()
}

/// Slug with the creation instant appended so that equal titles rarely collide.
pub fn generate_slug(title: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", slugify(title), now.timestamp_millis())
}

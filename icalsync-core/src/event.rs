//! Event types shared by the calendar source, the reconciler and the remote client.
//!
//! `SourceEvent` is what the ICS parser produces. `NormalizedEvent` is the
//! canonical shape both sides are reduced to before they are compared.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A property value that may occur once or several times on a VEVENT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Collapse the value into one string. Repeated values are joined with no separator.
    pub fn flatten(&self) -> String {
        match self {
            FieldValue::Single(value) => value.clone(),
            FieldValue::Multiple(values) => values.concat(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

/// A point in time as written in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Resolve to an absolute instant.
    ///
    /// Dates resolve to local midnight and floating times to local time.
    /// Zoned times go through the IANA database, falling back to local time
    /// for TZIDs it does not know. Ambiguous times take the earlier instant.
    /// Times skipped by a DST jump keep the offset in force before the jump.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(d) => resolve_local(&Local, &d.and_hms_opt(0, 0, 0)?),
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(naive) => resolve_local(&Local, naive),
            EventTime::DateTimeZoned { datetime, tzid } => match tzid.parse::<chrono_tz::Tz>() {
                Ok(tz) => resolve_local(&tz, datetime),
                Err(_) => resolve_local(&Local, datetime),
            },
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    let resolved = tz.from_local_datetime(naive).earliest().or_else(|| {
        // Inside a gap: an hour earlier is still on the old offset.
        tz.from_local_datetime(&(*naive - Duration::hours(1)))
            .earliest()
            .map(|dt| dt + Duration::hours(1))
    });
    resolved.map(|dt| dt.with_timezone(&Utc))
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}

/// An event attendee. Parsed from the feed but not synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub name: Option<String>,
    /// Raw PARTSTAT value, e.g. "ACCEPTED"
    pub response_status: Option<String>,
}

/// A VEVENT as read from the calendar feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub uid: String,
    /// Raw RECURRENCE-ID value for instance overrides
    pub recurrence_id: Option<String>,
    pub sequence: Option<i64>,
    pub summary: Option<FieldValue>,
    pub description: Option<FieldValue>,
    pub location: Option<FieldValue>,
    pub status: Option<String>,
    /// Raw TRANSP value
    pub transparency: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    /// Parse a status value case-insensitively (`CANCELLED`, `cancelled`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "confirmed" => Some(EventStatus::Confirmed),
            "tentative" => Some(EventStatus::Tentative),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Confirmed => "confirmed",
            EventStatus::Tentative => "tentative",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event blocks time (opaque) or shows as free (transparent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    Opaque,
    Transparent,
}

impl Transparency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transparency::Opaque => "opaque",
            Transparency::Transparent => "transparent",
        }
    }
}

impl fmt::Display for Transparency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical comparison shape for one event on either side of the sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: EventStatus,
    pub transparency: Transparency,
    /// Always set for events built from the feed. Cancelled remote stubs may lack it.
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Selects the date-only wire form when writing. Not compared.
    pub all_day: bool,
}

impl NormalizedEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }

    /// `end`, or one hour after `start` (one day for all-day events) when the feed had no end.
    pub fn effective_end(&self) -> Option<DateTime<Utc>> {
        self.end.or_else(|| {
            let default_duration = if self.all_day {
                Duration::days(1)
            } else {
                Duration::hours(1)
            };
            self.start.map(|start| start + default_duration)
        })
    }
}

impl fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' [{}]", self.id, self.title, self.status)?;
        if let Some(start) = self.start {
            write!(f, " @ {}", start.format("%Y-%m-%dT%H:%M:%SZ"))?;
        }
        Ok(())
    }
}

//! Conversion between Google's event resource and [`NormalizedEvent`].

use chrono::{DateTime, Local, Utc};
use google_calendar::types::{Event, EventDateTime};
use icalsync_core::{EventStatus, EventTime, NormalizedEvent, Transparency};

pub trait FromGoogle {
    fn from_google(event: Event) -> Self;
}

pub trait ToGoogle {
    fn to_google(&self) -> Event;
}

impl FromGoogle for NormalizedEvent {
    /// Cancelled entries may come back without times, so this never fails.
    fn from_google(event: Event) -> Self {
        let status = match event.status.as_str() {
            "tentative" => EventStatus::Tentative,
            "cancelled" => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        // Google leaves transparency out for opaque events
        let transparency = if event.transparency == "transparent" {
            Transparency::Transparent
        } else {
            Transparency::Opaque
        };

        let all_day = event
            .start
            .as_ref()
            .is_some_and(|s| s.date_time.is_none() && s.date.is_some());

        NormalizedEvent {
            id: event.id,
            title: event.summary,
            description: event.description,
            location: event.location,
            status,
            transparency,
            start: event.start.as_ref().and_then(instant_from_google),
            end: event.end.as_ref().and_then(instant_from_google),
            all_day,
        }
    }
}

impl ToGoogle for NormalizedEvent {
    fn to_google(&self) -> Event {
        let (start, end) = match (self.start, self.effective_end()) {
            (Some(start), Some(end)) => (
                Some(instant_to_google(start, self.all_day)),
                Some(instant_to_google(end, self.all_day)),
            ),
            _ => (None, None),
        };

        Event {
            id: self.id.clone(),
            summary: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            status: self.status.as_str().to_string(),
            transparency: self.transparency.as_str().to_string(),
            start,
            end,
            ..Default::default()
        }
    }
}

/// All-day dates are read as local midnight, the same way feed dates are.
fn instant_from_google(time: &EventDateTime) -> Option<DateTime<Utc>> {
    match (time.date_time, time.date) {
        (Some(dt), _) => Some(dt),
        (None, Some(d)) => EventTime::Date(d).to_utc(),
        (None, None) => None,
    }
}

fn instant_to_google(instant: DateTime<Utc>, all_day: bool) -> EventDateTime {
    if all_day {
        EventDateTime {
            date: Some(instant.with_timezone(&Local).date_naive()),
            date_time: None,
            time_zone: String::new(),
        }
    } else {
        EventDateTime {
            date: None,
            date_time: Some(instant),
            time_zone: String::new(),
        }
    }
}

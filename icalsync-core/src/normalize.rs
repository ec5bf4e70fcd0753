//! Maps a feed event onto the shape it is compared in.

use crate::event::{EventStatus, FieldValue, NormalizedEvent, SourceEvent, Transparency};
use crate::id::{generate_id, is_valid_id};

/// Build the candidate remote representation of a source event.
///
/// Pure: no lookups against the remote side happen here.
pub fn normalize(event: &SourceEvent) -> NormalizedEvent {
    let id = generate_id(&event.uid, event.recurrence_id.as_deref(), event.sequence);
    debug_assert!(is_valid_id(&id), "generated id '{id}' is not a valid event id");

    NormalizedEvent {
        id,
        title: flatten(&event.summary),
        description: flatten(&event.description),
        location: flatten(&event.location),
        status: event
            .status
            .as_deref()
            .and_then(EventStatus::parse)
            .unwrap_or(EventStatus::Confirmed),
        transparency: transparency(event.transparency.as_deref()),
        start: event.start.to_utc(),
        end: event.end.as_ref().and_then(|end| end.to_utc()),
        all_day: event.start.is_date(),
    }
}

fn flatten(value: &Option<FieldValue>) -> String {
    value.as_ref().map(FieldValue::flatten).unwrap_or_default()
}

/// Only an explicit OPAQUE blocks time; anything else, including no value, is transparent.
fn transparency(value: Option<&str>) -> Transparency {
    match value {
        Some(v) if v.trim().eq_ignore_ascii_case("opaque") => Transparency::Opaque,
        _ => Transparency::Transparent,
    }
}

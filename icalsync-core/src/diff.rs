//! Field-level comparison of normalized events.
//!
//! Attendees are not compared.

use crate::event::NormalizedEvent;

/// True when writing `a` over `b` would change nothing we sync.
pub fn events_equal(a: &NormalizedEvent, b: &NormalizedEvent) -> bool {
    a.id == b.id
        && a.title == b.title
        && a.status == b.status
        && a.description == b.description
        && a.location == b.location
        && a.transparency == b.transparency
        && a.start == b.start
        && a.effective_end() == b.effective_end()
}

/// Names of the compared fields that differ between `a` and `b`.
pub fn changed_fields(a: &NormalizedEvent, b: &NormalizedEvent) -> Vec<&'static str> {
    let mut changed = Vec::new();

    if a.id != b.id {
        changed.push("id");
    }
    if a.title != b.title {
        changed.push("title");
    }
    if a.status != b.status {
        changed.push("status");
    }
    if a.description != b.description {
        changed.push("description");
    }
    if a.location != b.location {
        changed.push("location");
    }
    if a.transparency != b.transparency {
        changed.push("transparency");
    }
    if a.start != b.start {
        changed.push("start");
    }
    if a.effective_end() != b.effective_end() {
        changed.push("end");
    }

    changed
}

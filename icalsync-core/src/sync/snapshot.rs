//! The remote calendar as fetched at the start of a run.

use std::collections::HashMap;

use tracing::warn;

use crate::event::NormalizedEvent;

/// Working set of remote events, keyed by id.
///
/// Each entry can be taken at most once. Whatever is left after matching
/// comes back in the order the service returned it.
#[derive(Debug, Default)]
pub struct RemoteSnapshot {
    events: HashMap<String, NormalizedEvent>,
    order: Vec<String>,
}

impl RemoteSnapshot {
    pub fn new(remote_events: Vec<NormalizedEvent>) -> Self {
        let mut snapshot = Self::default();

        for event in remote_events {
            if snapshot.events.contains_key(&event.id) {
                warn!(id = %event.id, "remote returned the same event id twice, keeping the first");
                continue;
            }
            snapshot.order.push(event.id.clone());
            snapshot.events.insert(event.id.clone(), event);
        }

        snapshot
    }

    /// Remove and return the entry for `id`.
    pub fn take(&mut self, id: &str) -> Option<NormalizedEvent> {
        self.events.remove(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Entries nobody took, in fetch order.
    pub fn into_remaining(mut self) -> Vec<NormalizedEvent> {
        self.order
            .iter()
            .filter_map(|id| self.events.remove(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStatus, Transparency};

    fn remote(id: &str, title: &str) -> NormalizedEvent {
        NormalizedEvent {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            location: String::new(),
            status: EventStatus::Confirmed,
            transparency: Transparency::Opaque,
            start: None,
            end: None,
            all_day: false,
        }
    }

    #[test]
    fn test_take_removes_entry() {
        let mut snapshot = RemoteSnapshot::new(vec![remote("aaaaa", "A"), remote("bbbbb", "B")]);

        assert_eq!(snapshot.take("aaaaa").map(|e| e.title), Some("A".to_string()));
        assert_eq!(snapshot.take("aaaaa"), None);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_remaining_keeps_fetch_order() {
        let mut snapshot = RemoteSnapshot::new(vec![
            remote("ccccc", "C"),
            remote("aaaaa", "A"),
            remote("bbbbb", "B"),
        ]);
        snapshot.take("aaaaa");

        let ids: Vec<String> = snapshot.into_remaining().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["ccccc", "bbbbb"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut snapshot = RemoteSnapshot::new(vec![remote("aaaaa", "first"), remote("aaaaa", "second")]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.take("aaaaa").map(|e| e.title), Some("first".to_string()));
        assert!(snapshot.is_empty());
        assert!(snapshot.into_remaining().is_empty());
    }
}

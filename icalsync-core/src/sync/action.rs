use std::fmt;

use crate::diff::events_equal;
use crate::event::NormalizedEvent;

/// What a run does with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// In the feed, not on the remote calendar.
    Create,
    /// Both sides already agree.
    Unchanged,
    Update,
    /// Remote copy was cancelled and the feed brings it back.
    Restore,
    /// On the remote calendar, gone from the feed.
    Delete,
    /// Gone from the feed and already cancelled remotely.
    Skip,
}

impl SyncAction {
    /// Decide what to do with a feed event given the remote entry that shares its id.
    pub fn plan(mock: &NormalizedEvent, matched: Option<&NormalizedEvent>) -> Self {
        match matched {
            None => SyncAction::Create,
            Some(remote) if events_equal(mock, remote) => SyncAction::Unchanged,
            Some(remote) if remote.is_cancelled() => SyncAction::Restore,
            Some(_) => SyncAction::Update,
        }
    }

    /// Decide what to do with a remote event no feed event claimed.
    pub fn plan_leftover(remote: &NormalizedEvent) -> Self {
        if remote.is_cancelled() {
            SyncAction::Skip
        } else {
            SyncAction::Delete
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Create => write!(f, "+"),
            SyncAction::Unchanged => write!(f, "="),
            SyncAction::Update => write!(f, "~"),
            SyncAction::Restore => write!(f, "^"),
            SyncAction::Delete => write!(f, "-"),
            SyncAction::Skip => write!(f, "."),
        }
    }
}

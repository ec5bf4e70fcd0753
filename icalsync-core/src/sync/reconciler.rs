//! One-way reconciliation of the remote calendar against the feed.

use tracing::{debug, info};

use crate::backoff::{Backoff, BackoffConfig};
use crate::diff::changed_fields;
use crate::error::IcalSyncResult;
use crate::event::{NormalizedEvent, SourceEvent};
use crate::normalize::normalize;
use crate::remote::RemoteCalendar;
use crate::sync::{RemoteSnapshot, SyncAction, SyncResult};

/// What a run needs to know besides the events themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub calendar_id: String,
    pub backoff: BackoffConfig,
}

impl SyncConfig {
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Drives one calendar towards the state of a feed.
///
/// Every remote call goes through the backoff wrapper. The first call that
/// still fails aborts the run; writes already made stay in place and the next
/// run picks up from there.
pub struct Reconciler<'a, C: RemoteCalendar + ?Sized> {
    client: &'a C,
    calendar_id: &'a str,
    backoff: Backoff,
}

impl<'a, C: RemoteCalendar + ?Sized> Reconciler<'a, C> {
    pub fn new(client: &'a C, config: &'a SyncConfig) -> Self {
        Self {
            client,
            calendar_id: &config.calendar_id,
            backoff: Backoff::new(config.backoff),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Reconcile the remote calendar with `events`, in feed order.
    pub async fn sync(&self, events: &[SourceEvent]) -> IcalSyncResult<SyncResult> {
        let mut snapshot = self.fetch_snapshot().await?;
        info!(
            calendar_id = self.calendar_id,
            remote = snapshot.len(),
            source = events.len(),
            "reconciling"
        );

        let mut result = SyncResult::default();

        for source in events {
            let mock = normalize(source);
            if mock.is_cancelled() {
                result.cancelled_in_source += 1;
            }

            let matched = snapshot.take(&mock.id);
            let action = SyncAction::plan(&mock, matched.as_ref());

            match (&action, &matched) {
                (SyncAction::Update | SyncAction::Restore, Some(remote)) => {
                    debug!(changed = ?changed_fields(&mock, remote), "{action} {mock}");
                }
                _ => debug!("{action} {mock}"),
            }

            match action {
                SyncAction::Create => {
                    self.create(&mock).await?;
                    result.created += 1;
                }
                SyncAction::Unchanged => result.idempotent += 1,
                SyncAction::Update => {
                    self.update(&mock).await?;
                    result.updated += 1;
                }
                SyncAction::Restore => {
                    self.update(&mock).await?;
                    result.restored += 1;
                }
                SyncAction::Delete | SyncAction::Skip => {}
            }
        }

        for remote in snapshot.into_remaining() {
            let action = SyncAction::plan_leftover(&remote);
            debug!("{action} {remote}");

            if action == SyncAction::Delete {
                self.delete(&remote.id).await?;
                result.removed += 1;
            }
        }

        info!(calendar_id = self.calendar_id, %result, "sync finished");
        Ok(result)
    }

    /// Cancel every remote event that is not cancelled yet. Returns how many were cancelled.
    pub async fn purge(&self) -> IcalSyncResult<usize> {
        let snapshot = self.fetch_snapshot().await?;
        let mut removed = 0;

        for remote in snapshot.into_remaining() {
            if SyncAction::plan_leftover(&remote) == SyncAction::Delete {
                debug!("{} {remote}", SyncAction::Delete);
                self.delete(&remote.id).await?;
                removed += 1;
            }
        }

        info!(calendar_id = self.calendar_id, removed, "purge finished");
        Ok(removed)
    }

    async fn fetch_snapshot(&self) -> IcalSyncResult<RemoteSnapshot> {
        let client = self.client;
        let calendar_id = self.calendar_id;

        let events = self
            .backoff
            .run("list", move || client.list_all_events(calendar_id))
            .await?;

        Ok(RemoteSnapshot::new(events))
    }

    async fn create(&self, event: &NormalizedEvent) -> IcalSyncResult<NormalizedEvent> {
        let client = self.client;
        let calendar_id = self.calendar_id;

        let created = self
            .backoff
            .run("create", move || client.create_event(calendar_id, event))
            .await?;

        Ok(created)
    }

    async fn update(&self, event: &NormalizedEvent) -> IcalSyncResult<NormalizedEvent> {
        let client = self.client;
        let calendar_id = self.calendar_id;

        let updated = self
            .backoff
            .run("update", move || client.update_event(calendar_id, &event.id, event))
            .await?;

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> IcalSyncResult<()> {
        let client = self.client;
        let calendar_id = self.calendar_id;

        self.backoff
            .run("delete", move || client.delete_event(calendar_id, id))
            .await?;

        Ok(())
    }
}

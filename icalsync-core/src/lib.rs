//! Core of icalsync: one-way reconciliation of an ICS feed into a remote calendar.
//!
//! - [`ics`] reads the feed into [`SourceEvent`]s
//! - [`normalize`] and [`id`] reduce them to [`NormalizedEvent`]s with stable ids
//! - [`sync::Reconciler`] matches them against a [`RemoteCalendar`] and issues
//!   the creates, updates and cancellations needed to converge

pub mod backoff;
pub mod diff;
pub mod error;
pub mod event;
pub mod ics;
pub mod id;
pub mod normalize;
pub mod remote;
pub mod sync;

pub use backoff::{Backoff, BackoffConfig};
pub use error::{IcalSyncError, IcalSyncResult};
pub use event::*;
pub use remote::{RemoteCalendar, RemoteError};
pub use sync::{Reconciler, SyncConfig, SyncResult};

//! Reconciling a feed against the remote calendar.

mod action;
mod reconciler;
mod result;
mod snapshot;

pub use action::SyncAction;
pub use reconciler::{Reconciler, SyncConfig};
pub use result::SyncResult;
pub use snapshot::RemoteSnapshot;

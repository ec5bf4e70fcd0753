//! Error types for icalsync.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that can occur while loading a feed or reconciling a calendar.
#[derive(Error, Debug)]
pub enum IcalSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Can't process an ICS feed with {0} calendars")]
    MultipleCalendars(usize),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Result type alias for icalsync operations.
pub type IcalSyncResult<T> = Result<T, IcalSyncError>;

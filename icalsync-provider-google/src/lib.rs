//! Google Calendar backend for icalsync.
//!
//! [`GoogleCalendar`] implements [`icalsync_core::RemoteCalendar`] over the
//! Calendar v3 REST API. [`Session`] obtains and refreshes the OAuth tokens it
//! needs.

mod api;
mod convert;
mod session;

pub use api::{DEFAULT_BASE_URL, GoogleCalendar, classify};
pub use convert::{FromGoogle, ToGoogle};
pub use session::{Credentials, SCOPES, Session, redirect_uri};

//! Reading calendar feeds (RFC 5545).

mod parse;

pub use parse::{Calendar, parse_feed};

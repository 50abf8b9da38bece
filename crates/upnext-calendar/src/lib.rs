//! Google Calendar integration for upnext.
//!
//! A thin read-only client over the Calendar v3 REST surface: list the
//! account's calendars, list a calendar's upcoming events.

pub mod client;
pub mod error;
pub mod types;

pub use client::CalendarClient;
pub use error::CalendarError;
pub use types::{Calendar, Event, EventStatus, EventTime};

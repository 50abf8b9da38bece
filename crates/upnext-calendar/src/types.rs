//! Calendar API types and data structures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::CalendarError;

/// Calendar metadata, narrowed to what the list call requests.
#[derive(Debug, Clone, Deserialize)]
pub struct Calendar {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

/// Event time - a precise instant or a whole-day date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

/// Event status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// A single calendar event, recurring instances already expanded.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub summary: String,
    pub status: EventStatus,
    pub start: EventTime,
    pub end: EventTime,
}

impl Event {
    /// Whether the event is specified by date only, with no time of day.
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::Date(_))
    }

    /// Convert a wire event into the local representation. Events without
    /// a usable start or end are rejected.
    pub fn from_api(api: ApiEvent) -> Result<Self, CalendarError> {
        let start = api.start.as_ref().and_then(parse_event_time).ok_or_else(|| {
            CalendarError::InvalidEventData(format!("event {} has no usable start", api.id))
        })?;
        let end = api.end.as_ref().and_then(parse_event_time).ok_or_else(|| {
            CalendarError::InvalidEventData(format!("event {} has no usable end", api.id))
        })?;

        let status = match api.status.as_deref() {
            Some("tentative") => EventStatus::Tentative,
            Some("cancelled") => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        Ok(Self {
            id: api.id,
            summary: api.summary.unwrap_or_default(),
            status,
            start,
            end,
        })
    }
}

// API Response Types

/// Google Calendar API event as it comes off the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub start: Option<ApiEventTime>,
    pub end: Option<ApiEventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

/// API response for calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<Calendar>,
}

fn parse_event_time(api: &ApiEventTime) -> Option<EventTime> {
    if let Some(dt_str) = &api.date_time {
        if let Ok(dt) = DateTime::parse_from_rfc3339(dt_str) {
            return Some(EventTime::DateTime(dt.with_timezone(&Utc)));
        }
    }
    if let Some(date_str) = &api.date {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            return Some(EventTime::Date(date));
        }
    }
    None
}

//! Event selection and display formatting.

use chrono::Local;
use upnext_calendar::{Calendar, Event, EventTime};

/// Only events from the calendar with this display name are printed.
pub const TARGET_CALENDAR: &str = "Work";

/// Events must have been updated within this window to be listed.
pub const UPDATED_LOOKBACK_HOURS: i64 = 24;

/// Display pattern for timed events, rendered in the machine's local zone.
/// Seconds and the UTC offset are dropped.
const DISPLAY_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Whether a calendar is the one whose events get printed. The match is an
/// exact string comparison on the display name.
pub fn is_target(calendar: &Calendar) -> bool {
    calendar.summary == TARGET_CALENDAR
}

/// One output line per event: `<title> [<start> - <end>]`.
pub fn render_event(event: &Event) -> String {
    format!(
        "{} [{} - {}]",
        event.summary,
        display_time(&event.start),
        display_time(&event.end),
    )
}

/// Timed instants render in local time without seconds; all-day dates
/// render as the bare wire date.
fn display_time(time: &EventTime) -> String {
    match time {
        EventTime::DateTime(instant) => instant
            .with_timezone(&Local)
            .format(DISPLAY_FORMAT)
            .to_string(),
        EventTime::Date(date) => date.format("%Y-%m-%d").to_string(),
    }
}

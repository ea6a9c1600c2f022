//! Calendar events as delivered by the session backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// The calendar id Google uses for the user's own calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Title shown when an event has no summary.
pub const UNTITLED: &str = "(No title)";

/// A calendar event as returned by `/api/events`.
///
/// Events are immutable once received; a fetch replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Event identifier, unique within one fetch.
    pub id: String,
    /// Event title, if any.
    #[serde(default)]
    pub summary: Option<String>,
    /// Start, either RFC 3339 or a date-only `YYYY-MM-DD` value.
    pub start: String,
    /// End, in the same shape as `start`.
    pub end: String,
    /// Attendee names or emails, in backend order.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Calendar the event belongs to.
    #[serde(default)]
    pub calendar_id: String,
}

impl CalendarEvent {
    /// Creates an event with no summary and no attendees.
    pub fn new(
        id: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            summary: None,
            start: start.into(),
            end: end.into(),
            attendees: Vec::new(),
            calendar_id: calendar_id.into(),
        }
    }

    /// Builder: set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder: set the attendees.
    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    /// The display title, `(No title)` when the summary is missing or empty.
    pub fn title(&self) -> &str {
        match self.summary.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => UNTITLED,
        }
    }

    /// Parsed start time, if the backend value is well formed.
    pub fn start_time(&self) -> Option<EventTime> {
        EventTime::parse(&self.start)
    }

    /// Returns `true` when the event spans whole days.
    pub fn is_all_day(&self) -> bool {
        self.start_time().is_some_and(|t| t.is_all_day())
    }

    /// The calendar id to show, or `None` when it is the default calendar
    /// (or unset).
    pub fn visible_calendar<'a>(&'a self, default_calendar: &str) -> Option<&'a str> {
        if self.calendar_id.is_empty() || self.calendar_id == default_calendar {
            None
        } else {
            Some(&self.calendar_id)
        }
    }

    /// The first `limit` attendees plus an overflow count.
    pub fn attendee_preview(&self, limit: usize) -> AttendeePreview<'_> {
        let shown = self.attendees.iter().take(limit).map(String::as_str).collect();
        AttendeePreview {
            shown,
            overflow: self.attendees.len().saturating_sub(limit),
        }
    }
}

/// A truncated attendee list, e.g. `a, b, c +2 more`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeePreview<'a> {
    /// Names shown in full.
    pub shown: Vec<&'a str>,
    /// How many names were left out.
    pub overflow: usize,
}

impl AttendeePreview<'_> {
    /// Returns `true` when there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.overflow == 0
    }
}

impl fmt::Display for AttendeePreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shown.join(", "))?;
        if self.overflow > 0 {
            write!(f, " +{} more", self.overflow)?;
        }
        Ok(())
    }
}

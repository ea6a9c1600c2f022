//! Rendering of the dashboard state.
//!
//! [`render`] is a pure function from [`UiState`] to a [`View`]; the view can
//! then be written as terminal text ([`View::to_tty`]) or serialized as JSON.
//!
//! ```rust
//! use calbridge_core::format::{render, RenderOptions, View};
//! use calbridge_core::store::UiState;
//!
//! let view = render(&UiState::Loaded(Vec::new()), &RenderOptions::default());
//! assert!(matches!(view, View::Empty { .. }));
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::event::{CalendarEvent, PRIMARY_CALENDAR};
use crate::store::UiState;
use crate::time::{DisplayZone, format_event_time};

/// Number of placeholder rows shown while loading.
pub const SKELETON_ROWS: usize = 3;

const SKELETON_LINE: &str = "░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░";

/// The output format for rendered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Tty,
    /// Machine-readable JSON output.
    Json,
}

/// Options that affect how events are rendered.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Zone used to show timestamps.
    pub zone: DisplayZone,
    /// Calendar id that is not worth mentioning.
    pub default_calendar: String,
    /// How many attendee names to show before "+N more".
    pub attendee_preview: usize,
    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            zone: DisplayZone::Local,
            default_calendar: PRIMARY_CALENDAR.to_string(),
            attendee_preview: 3,
            max_title_length: None,
        }
    }
}

/// A rendered dashboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum View {
    /// Nothing fetched yet.
    Idle {
        /// Prompt for the user.
        message: String,
    },
    /// Fetch in flight.
    Loading {
        /// Number of placeholder rows.
        placeholders: usize,
    },
    /// Fetch failed.
    Error {
        /// Failure message, shown as-is.
        message: String,
    },
    /// Fetch succeeded with no events.
    Empty {
        /// Headline.
        message: String,
        /// Secondary line.
        hint: String,
    },
    /// Fetch succeeded with events.
    Events {
        /// One card per event, in backend order.
        events: Vec<EventCard>,
        /// Number of events.
        count: usize,
    },
}

/// One event, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCard {
    /// Event id.
    pub id: String,
    /// Title, `(No title)` when missing.
    pub title: String,
    /// Formatted start.
    pub start: String,
    /// Formatted end.
    pub end: String,
    /// Whether the event spans whole days.
    pub all_day: bool,
    /// Total number of attendees.
    pub attendee_count: usize,
    /// e.g. "a, b, c +2 more"; absent without attendees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<String>,
    /// Calendar id, only when it is not the default calendar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
}

impl EventCard {
    /// Builds a card for one event.
    pub fn from_event(event: &CalendarEvent, options: &RenderOptions) -> Self {
        let preview = event.attendee_preview(options.attendee_preview);
        let title = match options.max_title_length {
            Some(max) => ellipsis(event.title(), max).into_owned(),
            None => event.title().to_string(),
        };

        Self {
            id: event.id.clone(),
            title,
            start: format_event_time(&event.start, &options.zone),
            end: format_event_time(&event.end, &options.zone),
            all_day: event.is_all_day(),
            attendee_count: event.attendees.len(),
            attendees: (!preview.is_empty()).then(|| preview.to_string()),
            calendar: event
                .visible_calendar(&options.default_calendar)
                .map(str::to_string),
        }
    }
}

/// Renders the events area for a state.
pub fn render(state: &UiState, options: &RenderOptions) -> View {
    match state {
        UiState::Idle => View::Idle {
            message: "Select a date range and fetch events".to_string(),
        },
        UiState::Loading => View::Loading {
            placeholders: SKELETON_ROWS,
        },
        UiState::Error(message) => View::Error {
            message: message.clone(),
        },
        UiState::Loaded(events) if events.is_empty() => View::Empty {
            message: "No events found".to_string(),
            hint: "No calendar events in the selected date range".to_string(),
        },
        UiState::Loaded(events) => View::Events {
            events: events
                .iter()
                .map(|e| EventCard::from_event(e, options))
                .collect(),
            count: events.len(),
        },
    }
}

impl View {
    /// Terminal text for this view.
    pub fn to_tty(&self) -> String {
        match self {
            Self::Idle { message } => message.clone(),
            Self::Loading { placeholders } => vec![SKELETON_LINE; *placeholders].join("\n"),
            Self::Error { message } => format!("Error: {}", message),
            Self::Empty { message, hint } => format!("{}\n{}", message, hint),
            Self::Events { events, count } => {
                let mut blocks: Vec<String> = events.iter().map(format_card).collect();
                blocks.push(format!("Showing {}", plural(*count, "event")));
                blocks.join("\n\n")
            }
        }
    }
}

fn format_card(card: &EventCard) -> String {
    let mut lines = vec![
        card.title.clone(),
        format!("  {}", card.start),
        format!("  to {}", card.end),
    ];

    if let Some(ref attendees) = card.attendees {
        lines.push(format!(
            "  {}: {}",
            plural(card.attendee_count, "attendee"),
            attendees
        ));
    }

    if let Some(ref calendar) = card.calendar {
        lines.push(format!("  Calendar: {}", calendar));
    }

    lines.join("\n")
}

/// "1 event", "2 events".
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Truncates a string with ellipsis if it exceeds the given length.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RenderOptions {
        RenderOptions {
            zone: DisplayZone::Named(chrono_tz::UTC),
            ..RenderOptions::default()
        }
    }

    fn event(id: &str) -> CalendarEvent {
        CalendarEvent::new(id, "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z", "primary")
            .with_summary("Standup")
    }

    mod ellipsis_tests {
        use super::*;

        #[test]
        fn short_string_unchanged() {
            assert_eq!(ellipsis("hello", 10), "hello");
        }

        #[test]
        fn long_string_truncated() {
            assert_eq!(ellipsis("hello world", 8), "hello...");
        }

        #[test]
        fn zero_length() {
            assert_eq!(ellipsis("hello", 0), "");
        }
    }

    mod states {
        use super::*;

        #[test]
        fn idle_prompts_for_fetch() {
            assert!(matches!(render(&UiState::Idle, &options()), View::Idle { .. }));
        }

        #[test]
        fn loading_shows_skeletons() {
            let view = render(&UiState::Loading, &options());
            assert_eq!(view, View::Loading { placeholders: SKELETON_ROWS });
            assert_eq!(view.to_tty().lines().count(), SKELETON_ROWS);
        }

        #[test]
        fn error_shows_message_verbatim() {
            let view = render(&UiState::Error("quota exceeded".into()), &options());
            assert_eq!(
                view,
                View::Error {
                    message: "quota exceeded".to_string()
                }
            );
            assert_eq!(view.to_tty(), "Error: quota exceeded");
        }

        #[test]
        fn zero_events_is_empty_state() {
            let view = render(&UiState::Loaded(Vec::new()), &options());
            assert!(matches!(view, View::Empty { .. }));
            assert!(view.to_tty().starts_with("No events found"));
        }

        #[test]
        fn events_keep_backend_order() {
            let view = render(&UiState::Loaded(vec![event("z"), event("a")]), &options());
            match view {
                View::Events { events, count } => {
                    assert_eq!(count, 2);
                    assert_eq!(events[0].id, "z");
                    assert_eq!(events[1].id, "a");
                }
                other => panic!("expected events, got {:?}", other),
            }
        }
    }

    mod cards {
        use super::*;

        #[test]
        fn five_attendees_show_three_and_overflow() {
            let e = event("1").with_attendees(["ann", "bob", "cy", "dee", "eve"]);
            let card = EventCard::from_event(&e, &options());
            assert_eq!(card.attendee_count, 5);
            assert_eq!(card.attendees.as_deref(), Some("ann, bob, cy +2 more"));
        }

        #[test]
        fn no_attendees_omits_line() {
            let card = EventCard::from_event(&event("1"), &options());
            assert_eq!(card.attendees, None);
            assert!(!format_card(&card).contains("attendee"));
        }

        #[test]
        fn primary_calendar_hidden() {
            let card = EventCard::from_event(&event("1"), &options());
            assert_eq!(card.calendar, None);

            let mut other = event("2");
            other.calendar_id = "work@example.com".to_string();
            let card = EventCard::from_event(&other, &options());
            assert_eq!(card.calendar.as_deref(), Some("work@example.com"));
        }

        #[test]
        fn title_truncation() {
            let e = event("1").with_summary("Quarterly planning offsite");
            let opts = RenderOptions {
                max_title_length: Some(10),
                ..options()
            };
            assert_eq!(EventCard::from_event(&e, &opts).title, "Quarter...");
        }

        #[test]
        fn plural_forms() {
            assert_eq!(plural(1, "attendee"), "1 attendee");
            assert_eq!(plural(2, "attendee"), "2 attendees");
            assert_eq!(plural(0, "event"), "0 events");
        }
    }

    mod output_format {
        use super::*;

        #[test]
        fn default_is_tty() {
            assert_eq!(OutputFormat::default(), OutputFormat::Tty);
        }

        #[test]
        fn serializes_snake_case() {
            assert_eq!(serde_json::to_string(&OutputFormat::Json).unwrap(), "\"json\"");
        }
    }
}

//! Core types: date ranges, events, dashboard state, rendering

pub mod event;
pub mod format;
pub mod store;
pub mod time;
pub mod tracing;

pub use event::{AttendeePreview, CalendarEvent, PRIMARY_CALENDAR, UNTITLED};
pub use format::{EventCard, OutputFormat, RenderOptions, View, ellipsis, plural, render};
pub use store::{CalendarStore, FetchTicket, UiState};
pub use time::{DateRange, DisplayZone, EventTime, RangeError, RangePreset, parse_date};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

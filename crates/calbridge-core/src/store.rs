//! Dashboard state: the selected date range and the events view state.
//!
//! [`CalendarStore`] is an owned value with a well-defined initial state
//! (the current week, nothing fetched). Whoever drives the dashboard owns it
//! and hands it to the code that needs it.
//!
//! Fetches are tagged with a [`FetchTicket`]. Starting a new fetch makes every
//! older ticket stale, and completions carrying a stale ticket are dropped, so
//! the most recently *started* fetch decides what is shown even if an older
//! request settles later.

use tracing::debug;

use crate::event::CalendarEvent;
use crate::time::DateRange;

/// What the events area is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    /// Nothing fetched yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch failed.
    Error(String),
    /// The last fetch succeeded.
    Loaded(Vec<CalendarEvent>),
}

impl UiState {
    /// Short name for logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Error(_) => "error",
            Self::Loaded(_) => "loaded",
        }
    }
}

/// Identifies one fetch. Tickets increase monotonically per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    /// Raw sequence number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Owned dashboard state.
#[derive(Debug, Clone)]
pub struct CalendarStore {
    date_range: DateRange,
    state: UiState,
    issued: u64,
}

impl CalendarStore {
    /// Creates a store showing `date_range` with nothing fetched.
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            state: UiState::Idle,
            issued: 0,
        }
    }

    /// The selected range.
    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    /// Replaces the selected range. The events view is left untouched.
    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
    }

    /// The current view state.
    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Loaded events, if the last fetch succeeded.
    pub fn events(&self) -> Option<&[CalendarEvent]> {
        match &self.state {
            UiState::Loaded(events) => Some(events),
            _ => None,
        }
    }

    /// Returns `true` while the latest fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.state == UiState::Loading
    }

    /// Marks a fetch as started and returns its ticket.
    ///
    /// Any earlier ticket becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.state = UiState::Loading;
        debug!(ticket = self.issued, "fetch started");
        FetchTicket(self.issued)
    }

    /// Returns `true` if `ticket` belongs to the most recent fetch.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Applies a fetch result.
    ///
    /// Returns `false` and leaves the state untouched when `ticket` is stale.
    /// A failure replaces any loaded events with the error.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<CalendarEvent>, String>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale fetch result"
            );
            return false;
        }

        self.state = match result {
            Ok(events) => UiState::Loaded(events),
            Err(message) => UiState::Error(message),
        };
        true
    }

    /// Back to `Idle`, invalidating any in-flight fetch.
    pub fn reset(&mut self) {
        self.issued += 1;
        self.state = UiState::Idle;
    }
}

//! Event fetching.
//!
//! The fetcher reads the selected range from the shared store, marks the store
//! as loading, releases the lock for the duration of the request, and then
//! hands the result back under the ticket it was given. Only the most recently
//! started fetch can change what is shown.

use std::sync::Arc;

use calbridge_core::{CalendarEvent, CalendarStore, DateRange, FetchTicket};
use calbridge_protocol::{ApiResult, EventsQuery};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::api::BackendClient;

/// Store shared between the session loop and fetch tasks.
pub type SharedStore = Arc<RwLock<CalendarStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CalendarStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// Fetches events for the store's selected range.
#[derive(Debug, Clone)]
pub struct EventFetcher {
    client: BackendClient,
    store: SharedStore,
    timezone: String,
    max_pages: u32,
}

impl EventFetcher {
    /// Creates a fetcher that asks for events in `timezone`, one page per fetch.
    pub fn new(client: BackendClient, store: SharedStore, timezone: impl Into<String>) -> Self {
        Self {
            client,
            store,
            timezone: timezone.into(),
            max_pages: 1,
        }
    }

    /// Follows `nextPageToken` up to `max_pages` pages (at least one).
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Marks the store as loading and returns the ticket and range to fetch.
    ///
    /// Any fetch begun earlier becomes stale.
    pub async fn begin(&self) -> (FetchTicket, DateRange) {
        let mut store = self.store.write().await;
        let ticket = store.begin_fetch();
        (ticket, *store.date_range())
    }

    /// Fetches `range` and applies the result under `ticket`.
    ///
    /// Returns `true` if the result was applied, `false` if a newer fetch
    /// began in the meantime and this result was dropped.
    pub async fn run(&self, ticket: FetchTicket, range: DateRange) -> bool {
        debug!(ticket = ticket.value(), range = %range, "fetching events");
        let result = self.fetch_range(&range).await;

        match &result {
            Ok(events) => info!(ticket = ticket.value(), count = events.len(), "events fetched"),
            Err(err) => warn!(
                ticket = ticket.value(),
                kind = err.kind.as_str(),
                error = %err,
                "event fetch failed"
            ),
        }

        self.store
            .write()
            .await
            .complete(ticket, result.map_err(|e| e.to_string()))
    }

    /// Begins a fetch now and runs the request as a task in `tasks`.
    ///
    /// Returns the range being fetched.
    pub async fn spawn(&self, tasks: &mut JoinSet<bool>) -> DateRange {
        let (ticket, range) = self.begin().await;
        let fetcher = self.clone();
        tasks.spawn(async move { fetcher.run(ticket, range).await });
        range
    }

    /// Requests all events in `range`, following pages up to the limit.
    pub async fn fetch_range(&self, range: &DateRange) -> ApiResult<Vec<CalendarEvent>> {
        let first = EventsQuery::from_range(range, self.timezone.clone());
        let mut query = first.clone();
        let mut events = Vec::new();

        for page_number in 1..=self.max_pages {
            let page = self.client.events(&query).await?;
            let has_more = page.has_more();
            events.extend(page.events);

            match page.next_page_token {
                Some(token) if has_more && page_number < self.max_pages => {
                    query = first.next_page(token);
                }
                Some(_) if has_more => {
                    debug!(pages = self.max_pages, "page limit reached, more events available");
                    break;
                }
                _ => break,
            }
        }

        Ok(events)
    }
}

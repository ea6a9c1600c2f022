//! Request and response bodies for the backend endpoints.

use calbridge_core::{CalendarEvent, DateRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    /// Google consent page to send the user to.
    pub auth_url: String,
}

/// Body of `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: String,
    pub id: i64,
}

/// Body of `POST /auth/logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Query parameters of `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    /// Inclusive lower bound, ISO 8601 UTC with milliseconds.
    pub time_min: String,
    /// Inclusive upper bound, same format.
    pub time_max: String,
    /// IANA timezone the backend should use.
    pub timezone: String,
    /// Continuation token from a previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl EventsQuery {
    /// Builds a first-page query for a date range.
    pub fn from_range(range: &DateRange, timezone: impl Into<String>) -> Self {
        Self {
            time_min: range.time_min(),
            time_max: range.time_max(),
            timezone: timezone.into(),
            page_token: None,
        }
    }

    /// Same query, continuing from `token`.
    pub fn next_page(&self, token: impl Into<String>) -> Self {
        Self {
            page_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Key/value pairs in wire order.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("timeMin", self.time_min.as_str()),
            ("timeMax", self.time_max.as_str()),
            ("timezone", self.timezone.as_str()),
        ];
        if let Some(ref token) = self.page_token {
            pairs.push(("pageToken", token.as_str()));
        }
        pairs
    }
}

/// Body of `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub events: Vec<CalendarEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl EventsPage {
    /// Returns `true` when another page is available.
    pub fn has_more(&self) -> bool {
        self.next_page_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub service: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn week() -> DateRange {
        DateRange::this_week(&Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn events_query_from_range() {
        let query = EventsQuery::from_range(&week(), crate::DEFAULT_TIMEZONE);
        assert_eq!(query.time_min, "2025-01-12T00:00:00.000Z");
        assert_eq!(query.time_max, "2025-01-18T23:59:59.999Z");
        assert_eq!(query.timezone, "Asia/Bangkok");
        assert_eq!(query.page_token, None);
    }

    #[test]
    fn events_query_pairs_in_wire_order() {
        let query = EventsQuery::from_range(&week(), "UTC").next_page("tok-2");
        let keys: Vec<_> = query.to_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["timeMin", "timeMax", "timezone", "pageToken"]);
    }

    #[test]
    fn events_query_serializes_camel_case() {
        let query = EventsQuery::from_range(&week(), "UTC");
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["timeMin"], "2025-01-12T00:00:00.000Z");
        assert!(json.get("pageToken").is_none());
    }

    #[test]
    fn events_page_without_token() {
        let page: EventsPage = serde_json::from_str(r#"{"events": []}"#).unwrap();
        assert!(page.events.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn events_page_with_token() {
        let json = r#"{
            "events": [{"id": "1", "summary": "Standup", "start": "2025-01-15T09:00:00+07:00",
                        "end": "2025-01-15T09:15:00+07:00", "attendees": [], "calendarId": "primary"}],
            "nextPageToken": "abc"
        }"#;
        let page: EventsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.events[0].title(), "Standup");
        assert!(page.has_more());
    }

    #[test]
    fn user_info_shape() {
        let user: UserInfo = serde_json::from_str(r#"{"email": "a@b.c", "id": 7}"#).unwrap();
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.id, 7);
    }

    #[test]
    fn health_status_with_python_timestamp() {
        let json = r#"{"ok": true, "timestamp": "2025-01-15T02:00:00.123456+00:00", "service": "google-calendar-oauth-api"}"#;
        let health: HealthStatus = serde_json::from_str(json).unwrap();
        assert!(health.ok);
        assert_eq!(health.service.as_deref(), Some("google-calendar-oauth-api"));
        assert_eq!(
            health.timestamp.map(|t| t.timestamp()),
            Some(Utc.with_ymd_and_hms(2025, 1, 15, 2, 0, 0).unwrap().timestamp())
        );
    }

    #[test]
    fn health_status_minimal() {
        let health: HealthStatus = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        assert!(!health.ok);
        assert!(health.timestamp.is_none());
    }
}

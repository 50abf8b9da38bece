//! Google Calendar API client.

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::CalendarError;
use crate::types::{Calendar, CalendarListResponse, Event, EventListResponse};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Upper bound on events returned by a single listing.
const MAX_RESULTS: u32 = 100;

pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl CalendarClient {
    pub fn new(access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn new_with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// List the account's calendars, fetching only id and display name.
    #[instrument(skip(self), level = "info")]
    pub async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        let url = format!(
            "{}/users/me/calendarList?fields={}",
            self.base_url,
            urlencoding::encode("items(id,summary)"),
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let resp: CalendarListResponse = self.handle_response(response).await?;
        Ok(resp.items)
    }

    /// List a calendar's upcoming events: recurring events expanded into
    /// single instances, deleted events included, capped at 100, ordered by
    /// start time. `updated_min` and `time_min` narrow the listing to
    /// recently-updated events starting at or after now.
    #[instrument(skip(self), level = "info")]
    pub async fn list_events(
        &self,
        calendar_id: &str,
        updated_min: DateTime<Utc>,
        time_min: DateTime<Utc>,
    ) -> Result<Vec<Event>, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events?showDeleted=true&singleEvents=true&maxResults={}&orderBy=startTime&updatedMin={}&timeMin={}",
            self.base_url,
            urlencoding::encode(calendar_id),
            MAX_RESULTS,
            urlencoding::encode(&updated_min.to_rfc3339()),
            urlencoding::encode(&time_min.to_rfc3339()),
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let resp: EventListResponse = self.handle_response(response).await?;

        let mut events = Vec::with_capacity(resp.items.len());
        for item in resp.items {
            match Event::from_api(item) {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!("Skipping event: {}", err),
            }
        }
        Ok(events)
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CalendarError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CalendarError::ApiError(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(CalendarError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(CalendarError::AuthRequired)
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(CalendarError::NotFound(text))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(CalendarError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(CalendarError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

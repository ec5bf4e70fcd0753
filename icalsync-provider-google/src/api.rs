//! Google Calendar v3 REST client.

use async_trait::async_trait;
use google_calendar::types::Event;
use icalsync_core::{NormalizedEvent, RemoteCalendar, RemoteError};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::convert::{FromGoogle, ToGoogle};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page the events endpoint will hand out.
const PAGE_SIZE: &str = "2500";

const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

pub struct GoogleCalendar {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<Event>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct CalendarResource {
    #[serde(default)]
    summary: String,
}

impl GoogleCalendar {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, access_token)
    }

    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Check that `calendar_id` exists and is readable. Returns its title.
    pub async fn ensure_calendar(&self, calendar_id: &str) -> Result<String, RemoteError> {
        let url = self.url(&["calendars", calendar_id])?;
        let calendar: CalendarResource = self.send_json(self.request(Method::GET, url)).await?;
        Ok(calendar.summary)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RemoteError::RequestFailed(format!("Invalid base URL {}: {e}", self.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| RemoteError::RequestFailed(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "google request");
        self.http.request(method, url).bearer_auth(&self.access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::RequestFailed(format!("Unexpected response body: {e}")))
    }
}

#[async_trait]
impl RemoteCalendar for GoogleCalendar {
    async fn list_all_events(&self, calendar_id: &str) -> Result<Vec<NormalizedEvent>, RemoteError> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&["calendars", calendar_id, "events"])?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("showDeleted", "true")
                    .append_pair("maxResults", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: EventsPage = self.send_json(self.request(Method::GET, url)).await?;
            events.extend(page.items.into_iter().map(NormalizedEvent::from_google));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(calendar_id, count = events.len(), "listed remote events");
        Ok(events)
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> Result<NormalizedEvent, RemoteError> {
        let url = self.url(&["calendars", calendar_id, "events"])?;
        let request = self.request(Method::POST, url).json(&event.to_google());

        let created: Event = self.send_json(request).await?;
        Ok(NormalizedEvent::from_google(created))
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        id: &str,
        event: &NormalizedEvent,
    ) -> Result<NormalizedEvent, RemoteError> {
        let url = self.url(&["calendars", calendar_id, "events", id])?;
        let request = self.request(Method::PUT, url).json(&event.to_google());

        let updated: Event = self.send_json(request).await?;
        Ok(NormalizedEvent::from_google(updated))
    }

    async fn delete_event(&self, calendar_id: &str, id: &str) -> Result<(), RemoteError> {
        let url = self.url(&["calendars", calendar_id, "events", id])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

/// Map a failed response onto the remote error taxonomy.
///
/// Google reports most quota problems as 403 with a rate limit reason. A 403
/// whose body names no reason at all is treated as quota too.
pub fn classify(status: StatusCode, body: &str) -> RemoteError {
    let payload = format!("{status}: {body}");

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::AuthorizationFailed(payload),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited(payload),
        StatusCode::NOT_FOUND => RemoteError::NotFound(payload),
        StatusCode::FORBIDDEN => {
            let reasons = error_reasons(body);
            if reasons.is_empty() || reasons.iter().any(|r| RATE_LIMIT_REASONS.contains(&r.as_str())) {
                RemoteError::RateLimited(payload)
            } else {
                RemoteError::RequestFailed(payload)
            }
        }
        _ => RemoteError::RequestFailed(payload),
    }
}

/// `error.errors[].reason` from a Google error body.
fn error_reasons(body: &str) -> Vec<String> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };

    json.pointer("/error/errors")
        .and_then(|errors| errors.as_array())
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("reason").and_then(|r| r.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

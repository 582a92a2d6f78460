//! Google Calendar integration for the time budget analyzer.
//!
//! Implements the core's event and palette sources over the Calendar v3
//! REST API:
//! - Event listing with recurring events expanded and pagination followed
//! - Single event lookup by id
//! - The event color palette (`colorId` to rendered background)
//!
//! Authentication is a bearer token supplied by the caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tb_core::{Event, EventSource, EventTime, Palette, PaletteSource, SourceError};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Public Calendar v3 endpoint.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const PAGE_SIZE: &str = "250";
const MAX_PAGES: usize = 100;
const SOURCE_NAME: &str = "google calendar";

/// Google Calendar client errors.
#[derive(Debug, Error)]
pub enum GcalError {
    /// The provided access token was invalid.
    #[error("invalid access token: {reason}")]
    InvalidToken { reason: &'static str },
    /// The API base URL cannot address calendar resources.
    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<GcalError> for SourceError {
    fn from(err: GcalError) -> Self {
        Self::Unavailable {
            source_name: SOURCE_NAME,
            message: err.to_string(),
        }
    }
}

/// Calendar v3 API client bound to one calendar.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    access_token: String,
    calendar_id: String,
    api_base: Url,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("calendar_id", &self.calendar_id)
            .field("api_base", &self.api_base.as_str())
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for `calendar_id` against the public API.
    pub fn new(
        access_token: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Result<Self, GcalError> {
        Self::with_api_base(access_token, calendar_id, DEFAULT_API_BASE)
    }

    /// Creates a client against a custom API base (proxies, test servers).
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, if the base
    /// URL does not parse, or if the HTTP client fails to build.
    pub fn with_api_base(
        access_token: impl Into<String>,
        calendar_id: impl Into<String>,
        api_base: &str,
    ) -> Result<Self, GcalError> {
        let access_token = access_token.into();

        if access_token.is_empty() {
            return Err(GcalError::InvalidToken {
                reason: "access token cannot be empty",
            });
        }
        if access_token.trim().is_empty() {
            return Err(GcalError::InvalidToken {
                reason: "access token cannot be whitespace-only",
            });
        }

        let api_base =
            Url::parse(api_base).map_err(|err| GcalError::InvalidUrl(format!("{api_base}: {err}")))?;
        if api_base.cannot_be_a_base() {
            return Err(GcalError::InvalidUrl(api_base.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(GcalError::ClientBuild)?;

        Ok(Self {
            http,
            access_token,
            calendar_id: calendar_id.into(),
            api_base,
        })
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Lists events overlapping `[start, end)`, following every result page.
    pub async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, GcalError> {
        let url = self.endpoint(&["calendars", self.calendar_id.as_str(), "events"]);
        let mut query = vec![
            ("timeMin", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("timeMax", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];

        let mut events = Vec::new();
        for page in 0..MAX_PAGES {
            let body: EventsPage = self.get_json(url.clone(), &query).await?;
            tracing::debug!(page, items = body.items.len(), "fetched events page");
            events.extend(body.items.into_iter().map(Event::from));

            let Some(token) = body.next_page_token else {
                return Ok(events);
            };
            query.retain(|(key, _)| *key != "pageToken");
            query.push(("pageToken", token));
        }

        Err(GcalError::InvalidResponse(format!(
            "event listing did not finish within {MAX_PAGES} pages"
        )))
    }

    /// Fetches one event; `None` when the calendar has no such event.
    pub async fn fetch_event(&self, event_id: &str) -> Result<Option<Event>, GcalError> {
        let url = self.endpoint(&["calendars", self.calendar_id.as_str(), "events", event_id]);
        match self.get_json::<GoogleEvent>(url, &[]).await {
            Ok(event) => Ok(Some(event.into())),
            Err(GcalError::Api { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetches the event color palette.
    pub async fn fetch_palette(&self) -> Result<Palette, GcalError> {
        let url = self.endpoint(&["colors"]);
        let colors: ColorsResponse = self.get_json(url, &[]).await?;
        Ok(colors.event)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        // cannot_be_a_base was rejected in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, GcalError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body).unwrap_or_else(|| GcalError::Api {
                status: status.as_u16(),
                message: body,
            }));
        }

        serde_json::from_str(&body).map_err(|err| GcalError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl EventSource for Client {
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, SourceError> {
        Ok(self.fetch_events(start, end).await?)
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, SourceError> {
        Ok(self.fetch_event(id).await?)
    }
}

#[async_trait]
impl PaletteSource for Client {
    async fn get_palette(&self) -> Result<Palette, SourceError> {
        Ok(self.fetch_palette().await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: Option<String>,
    summary: Option<String>,
    color_id: Option<String>,
    #[serde(default)]
    start: GoogleEventTime,
    #[serde(default)]
    end: GoogleEventTime,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl From<GoogleEventTime> for EventTime {
    fn from(time: GoogleEventTime) -> Self {
        Self {
            date_time: time.date_time,
            date: time.date,
        }
    }
}

impl From<GoogleEvent> for Event {
    fn from(event: GoogleEvent) -> Self {
        Self {
            id: event.id,
            summary: event.summary,
            category_tag: event.color_id,
            start: event.start.into(),
            end: event.end.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ColorsResponse {
    #[serde(default)]
    event: Palette,
}

fn parse_api_error(status: StatusCode, body: &str) -> Option<GcalError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| GcalError::Api {
            status: status.as_u16(),
            message: payload.error.message,
        })
}

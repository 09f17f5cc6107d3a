//! HTTP client for the mood tracker sync API.
//!
//! The API speaks JSON over a small REST surface: a paginated event feed,
//! an event ingest endpoint, and single-value settings and weekly-email
//! resources. All requests carry a bearer token.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use mt_core::{Event, Settings};

/// Base URL used when the configuration does not name one.
pub const DEFAULT_BASE_URL: &str = "https://moodtracker.link/api";

/// Per-request timeout.
///
/// Sync batches are small, so a slow response means a stalled connection
/// rather than a large payload.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the sync API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid api token: {reason}")]
    InvalidToken { reason: &'static str },

    #[error("failed to build http client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("unexpected response from api: {0}")]
    InvalidResponse(String),
}

/// One page of the remote event feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub events: Vec<Event>,
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Error body the API returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the mood tracker sync API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Creates a client for `base_url` authenticating with `token`.
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self, ApiError> {
        if token.is_empty() {
            return Err(ApiError::InvalidToken {
                reason: "token is empty",
            });
        }
        if token.chars().any(char::is_whitespace) {
            return Err(ApiError::InvalidToken {
                reason: "token contains whitespace",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;

        let base_url = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Fetches one page of the event feed, starting from `cursor` when one
    /// is passed.
    pub async fn events(&self, cursor: Option<&str>) -> Result<EventsPage, ApiError> {
        let mut request = self.http.get(self.url("events")).bearer_auth(&self.token);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        response
            .json()
            .await
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))
    }

    /// Uploads a batch of events. The server deduplicates by id, so
    /// re-sending already-known events is harmless.
    pub async fn post_events(&self, events: &[Event]) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("events"))
            .bearer_auth(&self.token)
            .json(events)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        Ok(())
    }

    /// The remote settings, or `None` when none were ever stored.
    pub async fn settings(&self) -> Result<Option<Settings>, ApiError> {
        let response = self
            .http
            .get(self.url("settings"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        response
            .json()
            .await
            .map(Some)
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))
    }

    /// Replaces the remote settings.
    pub async fn put_settings(&self, settings: &Settings) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url("settings"))
            .bearer_auth(&self.token)
            .json(settings)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        Ok(())
    }

    /// Whether the weekly email digest is enabled. The resource existing
    /// at all means enabled; 404 means disabled.
    pub async fn weekly_emails_enabled(&self) -> Result<bool, ApiError> {
        let response = self
            .http
            .get(self.url("weekly-emails"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        Ok(true)
    }

    /// Turns the weekly email digest on.
    pub async fn enable_weekly_emails(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("weekly-emails"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        Ok(())
    }

    /// Turns the weekly email digest off.
    pub async fn disable_weekly_emails(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url("weekly-emails"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(api_error(status, &body));
        }
        Ok(())
    }
}

// The token must never appear in logs.
impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn api_error(status: StatusCode, body: &str) -> ApiError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    };
    ApiError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        let result = ApiClient::new(DEFAULT_BASE_URL, "");
        assert!(matches!(
            result,
            Err(ApiError::InvalidToken {
                reason: "token is empty"
            })
        ));
    }

    #[test]
    fn whitespace_token_is_rejected() {
        let result = ApiClient::new(DEFAULT_BASE_URL, "abc def");
        assert!(matches!(
            result,
            Err(ApiError::InvalidToken {
                reason: "token contains whitespace"
            })
        ));
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let client = ApiClient::new(DEFAULT_BASE_URL, "super-secret-token").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains(DEFAULT_BASE_URL));
    }

    #[test]
    fn trailing_slashes_are_normalized() {
        let client = ApiClient::new("https://example.com/api/", "token").unwrap();
        assert_eq!(client.url("events"), "https://example.com/api/events");
    }

    #[test]
    fn events_page_parses_the_wire_shape() {
        let page: EventsPage = serde_json::from_str(
            r#"{
                "events": [{
                    "createdAt": "2021-01-01T00:00:00.000Z",
                    "type": "v1/moods/create",
                    "payload": {"mood": 7.0}
                }],
                "hasNextPage": true,
                "nextCursor": "abc123"
            }"#,
        )
        .unwrap();

        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].id(), "2021-01-01T00:00:00.000Z");
        assert!(page.has_next_page);
        assert_eq!(page.next_cursor.as_deref(), Some("abc123"));
    }

    #[test]
    fn final_page_omits_the_cursor() {
        let page: EventsPage =
            serde_json::from_str(r#"{"events": [], "hasNextPage": false}"#).unwrap();
        assert!(!page.has_next_page);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn error_bodies_are_parsed_when_json() {
        let error = api_error(StatusCode::NOT_FOUND, r#"{"error": "Not found"}"#);
        match error {
            ApiError::Api { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_text_error_bodies_pass_through() {
        let error = api_error(StatusCode::BAD_GATEWAY, "upstream exploded\n");
        match error {
            ApiError::Api { status, message } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

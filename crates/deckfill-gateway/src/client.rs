//! Slides and Drive REST client
//!
//! Blocking client implementing [`Gateway`] against the Google Slides API
//! (fetch, batch update) and the Drive API (copy, move). The caller supplies
//! a bearer token; acquiring and refreshing it is out of scope.

use std::cell::Cell;
use std::time::Duration;

use deckfill_core::chunker::{self, BatchEnvelope};
use deckfill_core::{Gateway, GatewayError, GatewayResult, MAX_BATCH_BYTES};
use deckfill_model::{DocumentSnapshot, Operation};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::{error_for_status, error_for_transport, Result};
use crate::retry::RetryPolicy;
use crate::wire;

/// Default Slides API base URL
pub const DEFAULT_SLIDES_URL: &str = "https://slides.googleapis.com/v1";

/// Default Drive API base URL
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Browser URL of a presentation
pub fn presentation_url(document_id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{}/edit", document_id)
}

/// When a failed request may be sent again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Reads: any retryable failure
    Always,
    /// Writes: only when the server cannot have acted on the request
    Unsent,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    parents: Vec<String>,
}

/// Gateway over the Slides and Drive REST APIs
#[derive(Debug, Clone)]
pub struct SlidesClient {
    slides_url: String,
    drive_url: String,
    token: Option<String>,
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl SlidesClient {
    /// Create a client for the public Google endpoints
    pub fn new() -> Result<Self> {
        Self::with_urls(DEFAULT_SLIDES_URL, DEFAULT_DRIVE_URL)
    }

    /// Create a client for custom endpoints
    pub fn with_urls(slides_url: impl Into<String>, drive_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            slides_url: slides_url.into().trim_end_matches('/').to_string(),
            drive_url: drive_url.into().trim_end_matches('/').to_string(),
            token: None,
            client,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.timeout = timeout;
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Slides API base URL
    pub fn slides_url(&self) -> &str {
        &self.slides_url
    }

    /// Drive API base URL
    pub fn drive_url(&self) -> &str {
        &self.drive_url
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn presentation_endpoint(&self, document_id: &str) -> String {
        format!("{}/presentations/{}", self.slides_url, document_id)
    }

    fn batch_update_endpoint(&self, document_id: &str) -> String {
        format!("{}/presentations/{}:batchUpdate", self.slides_url, document_id)
    }

    fn file_endpoint(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.drive_url, file_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request built by `build`, retrying per policy
    ///
    /// Writes are replayed only after a refused connection, 429 or 503. A
    /// timeout may hide a committed write, so it ends the call.
    fn send(
        &self,
        what: &str,
        replay: Replay,
        build: impl Fn() -> RequestBuilder,
    ) -> GatewayResult<Response> {
        let unsent = Cell::new(false);
        let attempt = || {
            unsent.set(false);
            let response = match self.authorize(build()).send() {
                Ok(response) => response,
                Err(e) => {
                    unsent.set(e.is_connect());
                    return Err(error_for_transport(e));
                }
            };
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            unsent.set(matches!(status.as_u16(), 429 | 503));
            let body = response.text().unwrap_or_default();
            Err(error_for_status(status.as_u16(), &body))
        };
        let retryable =
            |e: &GatewayError| e.is_retryable() && (replay == Replay::Always || unsent.get());
        self.retry.run_if(what, retryable, attempt)
    }

    fn drive_file(&self, response: Response) -> GatewayResult<DriveFile> {
        let body = response.bytes().map_err(error_for_transport)?;
        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Malformed(format!("drive file: {}", e)))
    }
}

impl Gateway for SlidesClient {
    fn name(&self) -> &str {
        "slides"
    }

    fn copy(&self, template_id: &str, title: &str) -> GatewayResult<String> {
        let url = format!("{}/copy", self.file_endpoint(template_id));
        tracing::debug!(template_id, title, "Drive API: copy file");
        let response = self.send("copy", Replay::Unsent, || {
            self.client
                .post(&url)
                .query(&[("supportsAllDrives", "true")])
                .json(&json!({ "name": title }))
        })?;
        Ok(self.drive_file(response)?.id)
    }

    fn fetch(&self, document_id: &str) -> GatewayResult<DocumentSnapshot> {
        let url = self.presentation_endpoint(document_id);
        tracing::debug!(document_id, "Slides API: get presentation");
        let response = self.send("fetch", Replay::Always, || self.client.get(&url))?;
        let body = response.bytes().map_err(error_for_transport)?;
        wire::decode(&body)
    }

    fn mutate(&self, document_id: &str, operations: &[Operation]) -> GatewayResult<()> {
        let envelope = BatchEnvelope {
            requests: operations,
        };
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| GatewayError::InvalidOperation(e.to_string()))?;
        if body.len() > MAX_BATCH_BYTES {
            return Err(GatewayError::PayloadTooLarge {
                size: body.len(),
                limit: MAX_BATCH_BYTES,
            });
        }
        debug_assert_eq!(body.len(), chunker::payload_size(operations));

        let url = self.batch_update_endpoint(document_id);
        tracing::debug!(
            document_id,
            requests = operations.len(),
            payload_bytes = body.len(),
            "Slides API: batch update"
        );
        self.send("batchUpdate", Replay::Unsent, || {
            self.client
                .post(&url)
                .header("Content-Type", "application/json")
                .body(body.clone())
        })
        .map_err(|e| match e {
            GatewayError::PayloadTooLarge { limit, .. } => GatewayError::PayloadTooLarge {
                size: body.len(),
                limit,
            },
            other => other,
        })?;
        Ok(())
    }

    fn move_to_folder(&self, document_id: &str, folder_id: &str) -> GatewayResult<()> {
        let url = self.file_endpoint(document_id);
        tracing::debug!(document_id, folder_id, "Drive API: move file");

        let response = self.send("getParents", Replay::Always, || {
            self.client.get(&url).query(&[
                ("fields", "id,parents"),
                ("supportsAllDrives", "true"),
            ])
        })?;
        let previous = self.drive_file(response)?.parents.join(",");

        self.send("move", Replay::Unsent, || {
            self.client
                .patch(&url)
                .query(&[
                    ("addParents", folder_id),
                    ("removeParents", previous.as_str()),
                    ("fields", "id,parents"),
                    ("supportsAllDrives", "true"),
                ])
                .json(&json!({}))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_url() {
        assert_eq!(
            presentation_url("abc123"),
            "https://docs.google.com/presentation/d/abc123/edit"
        );
    }

    #[test]
    fn test_endpoints() {
        let client = SlidesClient::with_urls("http://localhost:9000/v1/", "http://localhost:9001")
            .unwrap();
        assert_eq!(client.slides_url(), "http://localhost:9000/v1");
        assert_eq!(
            client.presentation_endpoint("d1"),
            "http://localhost:9000/v1/presentations/d1"
        );
        assert_eq!(
            client.batch_update_endpoint("d1"),
            "http://localhost:9000/v1/presentations/d1:batchUpdate"
        );
        assert_eq!(client.file_endpoint("f1"), "http://localhost:9001/files/f1");
    }

    #[test]
    fn test_builder() {
        let client = SlidesClient::new()
            .unwrap()
            .with_token("secret")
            .with_retry(RetryPolicy::none())
            .with_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(client.drive_url(), DEFAULT_DRIVE_URL);
        assert_eq!(client.name(), "slides");
    }

    #[test]
    fn test_oversized_batch_is_rejected_locally() {
        let client = SlidesClient::with_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        let op = Operation::replace_all("{{blob}}", "x".repeat(MAX_BATCH_BYTES));
        let err = client.mutate("doc", &[op]).unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { .. }));
    }
}

//! HTTP client for the WebPilot automation API.
//!
//! One [`WebPilotClient`] call is one run: a POST to the run endpoint,
//! then a fold over the SSE response until a terminal event or end of
//! stream. Three surfaces share the same parser and classifier:
//!
//! - [`run`](WebPilotClient::run): consume everything, return the final
//!   [`RunOutcome`] including the accumulated preview URL.
//! - [`run_with_events`](WebPilotClient::run_with_events): forward every
//!   decoded event to a handler as it arrives, then return the outcome.
//! - [`stream`](WebPilotClient::stream): hand the raw decoded event
//!   stream to the caller.
//!
//! Nothing here retries: the caller owns retry policy, and a run that
//! fails (locally or remotely) resolves to a failure outcome.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;

use crate::config;
use crate::error::ClientError;
use crate::events::AgentEvent;
use crate::models::RunRequest;
use crate::outcome::{Aggregator, Deferred, EventSink, Forwarded, RunOutcome};
use crate::sse::{self, EventBlockBuffer};

/// Route of the SSE run endpoint, relative to the base URL.
pub const RUN_ROUTE: &str = "/v1/automation/run-sse";
/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// A lazy stream of decoded automation events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, ClientError>> + Send>>;

/// Client for the WebPilot automation API.
///
/// Holds a reusable HTTP client; each run owns its own buffers and
/// aggregation state, so one client can serve concurrent runs.
pub struct WebPilotClient {
    /// Base URL for the API.
    pub base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl WebPilotClient {
    /// Create a client against the production endpoint, with no API key.
    pub fn new() -> Self {
        Self {
            base_url: config::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            client: Client::new(),
        }
    }

    /// Create a client from the process environment
    /// (`WEBPILOT_API_KEY`, optional `WEBPILOT_BASE_URL`).
    pub fn from_env() -> Self {
        Self {
            base_url: config::base_url(),
            api_key: config::api_key(),
            client: Client::new(),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Submit the run request and return the open SSE response.
    async fn open(&self, request: &RunRequest) -> Result<reqwest::Response, ClientError> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::MissingApiKey)?;
        let url = format!("{}{}", self.base_url, RUN_ROUTE);

        tracing::debug!(url = %url, goal = %request.goal, "submitting automation run");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status, "automation run rejected");
            return Err(ClientError::ServerError { status, message });
        }

        Ok(response)
    }

    /// Run a task and consume its stream to completion.
    ///
    /// Never returns `Err`: configuration, transport, and remote failures
    /// all resolve into a failure [`RunOutcome`].
    pub async fn run(&self, request: &RunRequest) -> RunOutcome {
        match self.drive(request, Deferred).await {
            Ok(aggregator) => aggregator.into_outcome(),
            Err(err) => RunOutcome::failure(err.to_string()),
        }
    }

    /// Run a task, forwarding every decoded event to `on_event` as it
    /// arrives.
    ///
    /// The handler runs on the same flow as parsing; there is no
    /// buffering or replay. The returned outcome carries no preview URL; the handler
    /// sees preview announcements as ordinary events.
    pub async fn run_with_events<F>(&self, request: &RunRequest, on_event: F) -> RunOutcome
    where
        F: FnMut(&AgentEvent),
    {
        match self.drive(request, Forwarded(on_event)).await {
            Ok(aggregator) => aggregator.into_forwarded_outcome(),
            Err(err) => RunOutcome::failure(err.to_string()),
        }
    }

    /// Submit a run and return its raw decoded event stream.
    ///
    /// Malformed event blocks are skipped inside the stream; transport
    /// read failures surface as an `Err` item. Dropping the stream
    /// abandons the pending read and releases the connection.
    pub async fn stream(&self, request: &RunRequest) -> Result<EventStream, ClientError> {
        let response = self.open(request).await?;
        Ok(event_stream(
            response.bytes_stream().map_err(ClientError::from),
        ))
    }

    /// The single fold behind both call modes.
    async fn drive<S: EventSink>(
        &self,
        request: &RunRequest,
        mut sink: S,
    ) -> Result<Aggregator, ClientError> {
        let mut aggregator = Aggregator::new();
        let mut events = self.stream(request).await?;
        aggregator.mark_streaming();

        while let Some(item) = events.next().await {
            let event = item?;
            sink.deliver(&event);
            let control = aggregator.observe(&event);
            if sink.halt(control, &event) {
                break;
            }
        }
        aggregator.mark_stream_end();

        tracing::debug!(phase = ?aggregator.phase(), "automation stream finished");
        Ok(aggregator)
    }
}

impl Default for WebPilotClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a response byte stream into a stream of decoded events.
///
/// This is the parser engine shared by every call mode, exposed so a
/// caller with its own transport can reuse it. Chunk boundaries are
/// meaningless: blocks are delimited only by the blank-line separator,
/// payloads that fail to decode are skipped, and a truncated final block
/// is dropped when the input ends.
pub fn event_stream<S>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
{
    let state = (bytes.boxed(), EventBlockBuffer::new(), VecDeque::new());
    Box::pin(stream::unfold(
        state,
        |(mut bytes, mut buffer, mut ready)| async move {
            loop {
                if let Some(event) = ready.pop_front() {
                    return Some((Ok(event), (bytes, buffer, ready)));
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        for block in buffer.feed(&chunk) {
                            if let Some(payload) = sse::data_payload(&block) {
                                match sse::decode_event(&payload) {
                                    Ok(event) => ready.push_back(event),
                                    Err(err) => {
                                        tracing::debug!(error = %err, "skipping undecodable event block");
                                    }
                                }
                            }
                        }
                    }
                    Some(Err(err)) => return Some((Err(err), (bytes, buffer, ready))),
                    // End of stream: any partial block in the buffer is dropped.
                    None => return None,
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_stream(
        parts: Vec<Result<&'static [u8], ClientError>>,
    ) -> impl Stream<Item = Result<Bytes, ClientError>> + Send {
        stream::iter(
            parts
                .into_iter()
                .map(|part| part.map(Bytes::from_static))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect_ok(events: EventStream) -> Vec<AgentEvent> {
        events
            .map(|item| item.expect("stream item should be Ok"))
            .collect()
            .await
    }

    #[test]
    fn test_client_new_uses_production_url() {
        let client = WebPilotClient::new();
        assert_eq!(client.base_url, config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_builders() {
        let client = WebPilotClient::new()
            .with_base_url("http://localhost:8080")
            .with_api_key("wp-key");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.api_key.as_deref(), Some("wp-key"));
    }

    #[test]
    fn test_client_default() {
        let client = WebPilotClient::default();
        assert!(client.api_key.is_none());
    }

    #[tokio::test]
    async fn test_event_stream_decodes_blocks() {
        let events = event_stream(byte_stream(vec![Ok(
            b"data: {\"type\":\"STEP\",\"message\":\"one\"}\n\ndata: {\"type\":\"STEP\",\"message\":\"two\"}\n\n",
        )]));
        let events = collect_ok(events).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message.as_deref(), Some("one"));
        assert_eq!(events[1].message.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_event_stream_chunk_boundary_invariance() {
        let body: &'static [u8] =
            b"data: {\"type\":\"STEP\",\"message\":\"caf\xc3\xa9\"}\n\ndata: {\"type\":\"COMPLETE\",\"status\":\"COMPLETED\",\"resultJson\":{\"a\":1}}\n\n";

        let whole = collect_ok(event_stream(byte_stream(vec![Ok(body)]))).await;
        assert_eq!(whole.len(), 2);

        // One byte per chunk: splits mid-payload, mid-UTF-8, mid-separator.
        let single_bytes: Vec<Result<Bytes, ClientError>> =
            body.iter().map(|b| Ok(Bytes::copy_from_slice(&[*b]))).collect();
        let trickled = collect_ok(event_stream(stream::iter(single_bytes))).await;

        assert_eq!(trickled, whole);
    }

    #[tokio::test]
    async fn test_event_stream_skips_malformed_blocks() {
        let events = event_stream(byte_stream(vec![Ok(
            b"data: not json\n\ndata: {\"type\":\"COMPLETE\",\"status\":\"COMPLETED\",\"resultJson\":{\"a\":1}}\n\n",
        )]));
        let events = collect_ok(events).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal_complete());
    }

    #[tokio::test]
    async fn test_event_stream_skips_payloadless_blocks() {
        let events = event_stream(byte_stream(vec![Ok(
            b": keepalive\n\ndata: {\"type\":\"STEP\"}\n\n",
        )]));
        let events = collect_ok(events).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_event_stream_drops_truncated_final_block() {
        let events = event_stream(byte_stream(vec![Ok(
            b"data: {\"type\":\"STEP\"}\n\ndata: {\"type\":\"COMPLETE\"",
        )]));
        let events = collect_ok(events).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "STEP");
    }

    #[tokio::test]
    async fn test_event_stream_empty_input() {
        let events = collect_ok(event_stream(byte_stream(vec![]))).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_event_stream_propagates_transport_error() {
        let events = event_stream(byte_stream(vec![
            Ok(b"data: {\"type\":\"STEP\"}\n\n"),
            Err(ClientError::ServerError {
                status: 0,
                message: "connection reset".to_string(),
            }),
        ]));
        let items: Vec<_> = events.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_run_without_api_key_is_failure_outcome() {
        let client = WebPilotClient::new().with_base_url("http://127.0.0.1:1");
        let outcome = client.run(&RunRequest::new("https://example.com", "goal")).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.error.as_deref(), Some("WEBPILOT_API_KEY not set"));
        assert_eq!(outcome.streaming_url, None);
    }

    #[tokio::test]
    async fn test_run_against_unreachable_server() {
        let client = WebPilotClient::new()
            .with_base_url("http://127.0.0.1:1")
            .with_api_key("wp-key");
        let outcome = client.run(&RunRequest::new("https://example.com", "goal")).await;
        assert!(!outcome.is_success());
        assert!(outcome.error.as_deref().unwrap_or("").contains("HTTP error"));
    }

    #[tokio::test]
    async fn test_stream_without_api_key_errors_before_connecting() {
        let client = WebPilotClient::new().with_base_url("http://127.0.0.1:1");
        let result = client.stream(&RunRequest::new("https://example.com", "goal")).await;
        assert!(matches!(result, Err(ClientError::MissingApiKey)));
    }
}

//! Event records streamed by the WebPilot automation API.
//!
//! Every SSE block carries one JSON object tagged by an open `type` field.
//! Progress events (`ACTION`, `STEP`, ...) are forwarded opaquely; the
//! classifier only gives special meaning to completion, error, and
//! preview-URL announcements. All fields are optional; the backend omits
//! whatever does not apply to a given event.

use serde::{Deserialize, Serialize};

/// Terminal success tag, paired with [`STATUS_COMPLETED`].
pub const EVENT_COMPLETE: &str = "COMPLETE";
/// Terminal failure tag.
pub const EVENT_ERROR: &str = "ERROR";
/// Live browser preview announcement tag (also accepted in lowercase).
pub const EVENT_STREAMING_URL: &str = "STREAMING_URL";
/// Status value that makes a `COMPLETE` event terminal.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// One decoded event from the automation stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentEvent {
    /// Open event tag. Empty when the backend omitted it.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Status qualifier; `COMPLETED` marks a `COMPLETE` event terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable progress text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured final result, when the backend produced one.
    #[serde(rename = "resultJson", skip_serializing_if = "Option::is_none")]
    pub result_json: Option<serde_json::Value>,
    /// Final result as a string, possibly itself JSON-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Live browser preview URL.
    #[serde(rename = "streamingUrl", skip_serializing_if = "Option::is_none")]
    pub streaming_url: Option<String>,
    /// The preview URL under its snake_case spelling. Kept as a separate
    /// field so an object carrying both spellings still decodes and the
    /// camelCase one keeps priority.
    #[serde(rename = "streaming_url", skip_serializing_if = "Option::is_none")]
    pub streaming_url_alt: Option<String>,
    /// Current step number, for progress display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u64>,
    /// Total planned steps, for progress display.
    #[serde(rename = "totalSteps", skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u64>,
}

impl AgentEvent {
    /// Whether this event terminates the run successfully.
    pub fn is_terminal_complete(&self) -> bool {
        self.kind == EVENT_COMPLETE && self.status.as_deref() == Some(STATUS_COMPLETED)
    }

    /// Whether this event terminates the run as a remote failure.
    pub fn is_error(&self) -> bool {
        self.kind == EVENT_ERROR
    }

    /// Whether the event tag itself announces a preview URL.
    pub fn announces_preview(&self) -> bool {
        self.kind == EVENT_STREAMING_URL || self.kind == "streaming_url"
    }

    /// The preview URL carried in either field spelling, camelCase first.
    pub fn preview_url(&self) -> Option<&str> {
        self.streaming_url
            .as_deref()
            .or(self.streaming_url_alt.as_deref())
    }
}

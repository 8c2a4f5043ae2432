//! Outcome aggregation for automation runs.
//!
//! The client folds the decoded event stream into a single [`RunOutcome`].
//! Two delivery modes share one fold: the deferred mode keeps everything
//! until the stream concludes, the forwarded mode hands every event to a
//! caller-supplied handler as it arrives. Both are [`EventSink`]
//! implementations driven by the same loop in the client.

use serde::Serialize;
use serde_json::{json, Value};

use crate::events::AgentEvent;

/// Error text used when a remote ERROR event carries no message.
pub const GENERIC_AGENT_ERROR: &str = "WebPilot agent error";
/// Deferred-mode result placeholder when no message was ever seen.
pub const NO_RESULT_PLACEHOLDER: &str = "Agent completed but returned no structured data";
/// Forwarded-mode result placeholder.
pub const NO_RESULT_FORWARDED: &str = "Agent completed with no structured data";

/// Final result of one automation run.
///
/// Exactly one of `data` (success) or `error` (failure) is meaningful.
/// `streaming_url` is only populated in the deferred call mode; the
/// forwarded mode exposes preview URLs through the events themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub success: bool,
    pub data: Option<Value>,
    pub streaming_url: Option<String>,
    pub error: Option<String>,
}

impl RunOutcome {
    /// A failure outcome with no accumulated stream state.
    ///
    /// Used for configuration and transport failures, where either no
    /// streaming happened at all or the connection itself broke down.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            streaming_url: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Lifecycle of one run. Terminal phases are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Request sent, response not yet readable.
    AwaitingResponse,
    /// Response body open, events being consumed.
    Streaming,
    /// A terminal COMPLETE event arrived, or the stream ended.
    Completed,
    /// A remote ERROR event arrived.
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed)
    }
}

/// Verdict of the aggregator for one event: keep reading or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Pick the final result value out of a terminal COMPLETE event.
///
/// Priority: `resultJson` verbatim; else `result` decoded as JSON; else
/// `result` wrapped as `{"raw_result": <string>}`. `None` when the event
/// carries neither field.
pub fn extract_result(event: &AgentEvent) -> Option<Value> {
    if let Some(value) = &event.result_json {
        return Some(value.clone());
    }
    let raw = event.result.as_ref()?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(_) => Some(json!({ "raw_result": raw })),
    }
}

/// Pick the preview URL announced by an event, if any.
///
/// Either URL field adopts it directly (camelCase spelling first). An
/// event *typed* as a preview announcement may also fall back to its
/// `message`. `None` means "leave the accumulated URL untouched"; a
/// URL-less event never clears it.
pub fn extract_preview_url(event: &AgentEvent) -> Option<String> {
    if let Some(url) = event.preview_url() {
        return Some(url.to_string());
    }
    if event.announces_preview() {
        return event.message.clone();
    }
    None
}

/// Folds classified events into a [`RunOutcome`].
///
/// Tracks the last progress message, the monotone preview URL, and the
/// first terminal classification. Once a terminal event has been seen the
/// outcome is fixed: later events are still accepted (the forwarded mode
/// keeps reading past a COMPLETE) but can no longer change it.
#[derive(Debug)]
pub struct Aggregator {
    last_message: Option<String>,
    preview_url: Option<String>,
    data: Option<Value>,
    failure: Option<String>,
    phase: RunPhase,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            last_message: None,
            preview_url: None,
            data: None,
            failure: None,
            phase: RunPhase::AwaitingResponse,
        }
    }

    /// Record that the response body is open and events are flowing.
    pub fn mark_streaming(&mut self) {
        if self.phase == RunPhase::AwaitingResponse {
            self.phase = RunPhase::Streaming;
        }
    }

    /// Record end of input: a run still streaming concludes successfully.
    pub fn mark_stream_end(&mut self) {
        if self.phase == RunPhase::Streaming {
            self.phase = RunPhase::Completed;
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The preview URL accumulated so far.
    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    /// Classify one event in stream order.
    ///
    /// Returns [`Control::Stop`] once the outcome is decided: on the first
    /// terminal event, and on any ERROR event thereafter (the outcome no
    /// longer changes, but an erroring backend has nothing further worth
    /// reading).
    pub fn observe(&mut self, event: &AgentEvent) -> Control {
        if self.phase.is_terminal() {
            return if event.is_error() {
                Control::Stop
            } else {
                Control::Continue
            };
        }

        if let Some(message) = &event.message {
            self.last_message = Some(message.clone());
        }
        if let Some(url) = extract_preview_url(event) {
            self.preview_url = Some(url);
        }

        if event.is_error() {
            self.failure = Some(
                event
                    .message
                    .clone()
                    .unwrap_or_else(|| GENERIC_AGENT_ERROR.to_string()),
            );
            self.phase = RunPhase::Failed;
            return Control::Stop;
        }

        if event.is_terminal_complete() {
            self.data = extract_result(event);
            self.phase = RunPhase::Completed;
            return Control::Stop;
        }

        Control::Continue
    }

    /// Resolve the deferred-mode outcome.
    ///
    /// A remote failure keeps the accumulated preview URL. Stream end
    /// without a data-bearing COMPLETE is a success carrying the last
    /// message (or a fixed placeholder) as `raw_result`.
    pub fn into_outcome(self) -> RunOutcome {
        let Aggregator {
            last_message,
            preview_url,
            data,
            failure,
            phase: _,
        } = self;

        if let Some(error) = failure {
            return RunOutcome {
                success: false,
                data: None,
                streaming_url: preview_url,
                error: Some(error),
            };
        }

        let data = data.unwrap_or_else(|| {
            let message = last_message.unwrap_or_else(|| NO_RESULT_PLACEHOLDER.to_string());
            json!({ "raw_result": message })
        });

        RunOutcome {
            success: true,
            data: Some(data),
            streaming_url: preview_url,
            error: None,
        }
    }

    /// Resolve the forwarded-mode outcome: no preview URL, and a fixed
    /// fallback value instead of the last message.
    pub fn into_forwarded_outcome(self) -> RunOutcome {
        if let Some(error) = self.failure {
            return RunOutcome::failure(error);
        }

        RunOutcome {
            success: true,
            data: Some(
                self.data
                    .unwrap_or_else(|| json!({ "raw_result": NO_RESULT_FORWARDED })),
            ),
            streaming_url: None,
            error: None,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// One side of the event fold: where decoded events go and when the fold
/// halts. The parser and classifier are shared; only this differs between
/// the two call modes.
pub(crate) trait EventSink {
    /// Hand one decoded event to the caller's side, before classification
    /// is acted on.
    fn deliver(&mut self, _event: &AgentEvent) {}

    /// Whether the fold stops after this event, given the aggregator's
    /// verdict.
    fn halt(&mut self, control: Control, event: &AgentEvent) -> bool;
}

/// Deferred mode: nothing is delivered mid-stream; the fold stops as soon
/// as the outcome is decided.
pub(crate) struct Deferred;

impl EventSink for Deferred {
    fn halt(&mut self, control: Control, _event: &AgentEvent) -> bool {
        control == Control::Stop
    }
}

/// Forwarded mode: every event reaches the handler; the fold keeps going
/// past a COMPLETE and stops only on a remote error.
pub(crate) struct Forwarded<F>(pub F);

impl<F> EventSink for Forwarded<F>
where
    F: FnMut(&AgentEvent),
{
    fn deliver(&mut self, event: &AgentEvent) {
        (self.0)(event);
    }

    fn halt(&mut self, _control: Control, event: &AgentEvent) -> bool {
        event.is_error()
    }
}

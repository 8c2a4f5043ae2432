//! Client library for the WebPilot web-automation API.
//!
//! Submit a task (a target URL plus a natural-language goal) and consume
//! the server-sent-events response until the agent completes or fails:
//!
//! ```ignore
//! use webpilot::client::WebPilotClient;
//! use webpilot::models::RunRequest;
//!
//! let client = WebPilotClient::from_env();
//! let request = RunRequest::new("https://example.com", "find the pricing page");
//! let outcome = client.run(&request).await;
//! ```
//!
//! The `sse` module holds the chunk-safe stream parsing, `outcome` the
//! event classification and aggregation, and `client` the HTTP glue and
//! the two call modes (deferred and per-event forwarding).

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod outcome;
pub mod sse;

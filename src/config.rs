//! Environment-driven configuration.
//!
//! The client needs exactly two things from its environment: the API key,
//! and optionally an endpoint override for development and tests.

/// Environment variable holding the WebPilot API key.
pub const API_KEY_ENV: &str = "WEBPILOT_API_KEY";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "WEBPILOT_BASE_URL";

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://agent.webpilot.dev";

/// The configured API key, if any. An empty value counts as absent.
pub fn api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty())
}

/// The API base URL, honoring the override variable.
pub fn base_url() -> String {
    std::env::var(BASE_URL_ENV)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

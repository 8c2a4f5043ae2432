//! Request types for the WebPilot automation API.

use serde::Serialize;

/// A single automation task to submit to the WebPilot API.
///
/// Serializes directly to the wire shape the run endpoint expects:
/// `{"url": ..., "goal": ..., "proxy_config": {"enabled": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    /// The page the agent should operate on.
    pub url: String,
    /// Natural-language description of what the agent should accomplish.
    pub goal: String,
    /// Proxy routing for the remote browser session (disabled by default).
    #[serde(rename = "proxy_config")]
    proxy: ProxyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
struct ProxyConfig {
    enabled: bool,
}

impl RunRequest {
    /// Create a request for the given target URL and goal, proxy disabled.
    pub fn new(url: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            goal: goal.into(),
            proxy: ProxyConfig::default(),
        }
    }

    /// Enable or disable proxy routing for this run.
    pub fn with_proxy(mut self, enabled: bool) -> Self {
        self.proxy.enabled = enabled;
        self
    }

    /// Whether proxy routing is enabled.
    pub fn proxy_enabled(&self) -> bool {
        self.proxy.enabled
    }
}

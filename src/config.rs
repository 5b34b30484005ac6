//! Client configuration.
//!
//! Built with `with_*` methods or read from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `AGENTLINE_API_URL` | Agent server base URL | `http://localhost:8000` |
//! | `AGENTLINE_TOKEN` | Bearer token sent with each request | none |
//! | `AGENTLINE_FRAME_MS` | Partial-update frame window in ms | `16` |

use std::time::Duration;

use crate::stream::DEFAULT_FRAME_INTERVAL;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_URL: &str = "AGENTLINE_API_URL";
pub const ENV_TOKEN: &str = "AGENTLINE_TOKEN";
pub const ENV_FRAME_MS: &str = "AGENTLINE_FRAME_MS";

/// Configuration for a [`StreamClient`](crate::client::StreamClient).
///
/// # Example
///
/// ```ignore
/// use agentline::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_base_url("https://agent.example.com/")
///     .with_auth_token("secret");
/// assert_eq!(config.agent_url(), "https://agent.example.com/agent");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server base URL without trailing slash
    pub base_url: String,
    /// Bearer token, if the server requires one
    pub auth_token: Option<String>,
    /// Minimum spacing between partial updates
    pub frame_interval: Duration,
    /// How long to wait for the connection to open
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server base URL. Trailing slashes are removed.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the frame window for partial updates.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Create config from `AGENTLINE_*` environment variables.
    ///
    /// Unset, empty or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = non_empty_var(ENV_API_URL) {
            config = config.with_base_url(url);
        }

        if let Some(token) = non_empty_var(ENV_TOKEN) {
            config = config.with_auth_token(token);
        }

        if let Some(raw) = non_empty_var(ENV_FRAME_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => config = config.with_frame_interval(Duration::from_millis(ms)),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_FRAME_MS);
                }
            }
        }

        config
    }

    /// Streaming question endpoint.
    pub fn agent_url(&self) -> String {
        format!("{}/agent", self.base_url)
    }

    /// Answer rating endpoint.
    pub fn feedback_url(&self) -> String {
        format!("{}/feedback", self.base_url)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

//! Gateway configuration.

use std::time::Duration;

/// Gateway used when `ARWEAVE_GATEWAY` is not set.
pub const DEFAULT_GATEWAY: &str = "https://arweave.net";

/// Per-request timeout used when `DISSECTOR_TIMEOUT` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the gateway base URL.
pub const GATEWAY_ENV: &str = "ARWEAVE_GATEWAY";

/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "DISSECTOR_TIMEOUT";

/// Where and how to reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL without a trailing slash, e.g. `https://arweave.net`.
    pub base_url: String,
    /// Timeout applied to each request.
    pub timeout: Duration,
    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY)
    }
}

impl GatewayConfig {
    /// Configuration for `base_url` with default timeout and user agent.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: crate::USER_AGENT.to_string(),
        }
    }

    /// Read `ARWEAVE_GATEWAY` and `DISSECTOR_TIMEOUT` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Unset or empty variables fall back to defaults. An unparsable timeout
    /// is logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = lookup(GATEWAY_ENV)
            .filter(|v| !v.trim().is_empty())
            .map_or_else(Self::default, Self::new);

        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(e) => tracing::warn!("Ignoring {TIMEOUT_ENV}={raw:?}: {e}"),
            }
        }

        config
    }

    /// Replace the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize(base_url.into());
        self
    }

    /// Replace the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for a gateway path such as `tx/{id}/offset`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

//! Runtime configuration and its defaults.

use std::time::Duration;

use crate::adapters::WriteLatency;
use crate::cache_framework::CachePolicy;

// =============================================================================
// Defaults
// =============================================================================

/// Remote user collection.
pub const ENDPOINT_DEFAULT: &str = "https://jsonplaceholder.typicode.com/users";

pub const HTTP_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);

/// Quiet period before a search term is applied.
pub const SEARCH_DEBOUNCE_DEFAULT: Duration = Duration::from_millis(300);

/// How long a notification stays visible.
pub const NOTIFICATION_TTL_DEFAULT: Duration = Duration::from_secs(4);

// =============================================================================
// RosterConfig
// =============================================================================

#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub endpoint: String,
    pub http_timeout: Duration,
    pub cache: CachePolicy,
    pub write_latency: WriteLatency,
    pub search_debounce: Duration,
    pub notification_ttl: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            endpoint: ENDPOINT_DEFAULT.to_string(),
            http_timeout: HTTP_TIMEOUT_DEFAULT,
            cache: CachePolicy::default(),
            write_latency: WriteLatency::default(),
            search_debounce: SEARCH_DEBOUNCE_DEFAULT,
            notification_ttl: NOTIFICATION_TTL_DEFAULT,
        }
    }
}

impl RosterConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

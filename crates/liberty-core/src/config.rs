//! Resolver configuration supplied by the embedding client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_request_delay_ms() -> u64 {
    // Matches the editor-side default of 120 seconds. Slow networks and test
    // harnesses raise or lower this to avoid false NotFound fallbacks.
    120_000
}

/// Client-tunable knobs for feature and schema resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Upper bound, in milliseconds, on a single remote registry request.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Override for the remote registry base URL.
    ///
    /// When absent the public Maven Central repository is used. Tests point
    /// this at a local fake.
    #[serde(default)]
    pub registry_url: Option<String>,

    /// Pin the runtime version instead of detecting it from the workspace.
    #[serde(default)]
    pub version_override: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            registry_url: None,
            version_override: None,
        }
    }
}

impl ResolverConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

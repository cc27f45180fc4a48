// ── Manager configuration ──

use std::time::Duration;

use url::Url;

use siren_api::ReconnectConfig;

/// Configuration for a [`Notifier`](crate::Notifier).
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Backend base URL, e.g. `http://telemetry:8080`.
    pub url: Url,

    /// Per-request timeout for REST calls (the SSE stream is exempt).
    pub timeout: Duration,

    /// Accept self-signed TLS certificates.
    pub insecure: bool,

    /// Reconnect policy for the SSE notification stream.
    pub reconnect: ReconnectConfig,

    /// How long the post-success feedback window stays visible before an
    /// entry transitions `Resolving -> Closed` and leaves the registry.
    pub close_delay: Duration,

    /// Subscribe to the SSE stream on connect. Disable for consumers
    /// that feed [`ingest`](crate::Notifier::ingest) themselves (polling
    /// frontends, tests).
    pub stream_enabled: bool,
}

impl NotifierConfig {
    /// Defaults for a backend at `url`: 30s request timeout, 2s close
    /// delay, streaming on.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(30),
            insecure: false,
            reconnect: ReconnectConfig::default(),
            close_delay: Duration::from_secs(2),
            stream_enabled: true,
        }
    }
}

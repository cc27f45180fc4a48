// Shared transport configuration for building reqwest::Client instances.
//
// The REST client and the SSE stream share timeout and TLS settings
// through this module, avoiding duplicated builder logic.

use std::time::Duration;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Accept any certificate (for self-signed backends).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout for REST calls. The SSE stream builds its own
    /// client without this, since a long-lived stream must not time out.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` for REST calls.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        self.builder().timeout(self.timeout).build().map_err(|e| {
            crate::error::Error::Tls(format!("failed to build HTTP client: {e}"))
        })
    }

    /// Build a `reqwest::Client` for the SSE stream: no request timeout,
    /// so an idle-but-healthy stream is never torn down by the client.
    pub fn build_stream_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        self.builder().build().map_err(|e| {
            crate::error::Error::Tls(format!("failed to build stream client: {e}"))
        })
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("siren/", env!("CARGO_PKG_VERSION")));

        if matches!(self.tls, TlsMode::DangerAcceptInvalid) {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
    }
}

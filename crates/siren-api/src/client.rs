//! REST client for the alarm backend.
//!
//! Wraps the `/api/alarms` surface: the two terminal-action endpoints
//! (`ack`, `clear`) plus the read endpoints for listing and inspecting
//! alarms. All responses are plain JSON, no envelope; success is any
//! 2xx status.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::model::{Alarm, AlarmStats};
use crate::transport::TransportConfig;

/// Async client for the alarm REST endpoints.
///
/// Cheap to clone; the inner `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct AlarmClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AlarmClient {
    /// Create a client from a backend base URL and transport settings.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    /// Create a client from an existing `reqwest::Client` (tests).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the SSE notification stream on this backend.
    pub fn stream_url(&self) -> Url {
        self.alarms_url("notifications/stream")
    }

    // ── Terminal actions ────────────────────────────────────────────

    /// Acknowledge an alarm: `POST /api/alarms/{id}/ack`.
    ///
    /// Returns the updated alarm. Any non-2xx response is an
    /// [`Error::Api`] so callers can roll back their local state.
    pub async fn acknowledge(&self, alarm_id: &str) -> Result<Alarm, Error> {
        self.post(self.alarms_url(&format!("{alarm_id}/ack"))).await
    }

    /// Clear (ignore) an alarm: `POST /api/alarms/{id}/clear`.
    pub async fn clear_alarm(&self, alarm_id: &str) -> Result<Alarm, Error> {
        self.post(self.alarms_url(&format!("{alarm_id}/clear")))
            .await
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// List all active (uncleared) alarms.
    pub async fn list_active(&self) -> Result<Vec<Alarm>, Error> {
        self.get(self.alarms_url("active")).await
    }

    /// List all unacknowledged alarms.
    pub async fn list_unacknowledged(&self) -> Result<Vec<Alarm>, Error> {
        self.get(self.alarms_url("unacknowledged")).await
    }

    /// List alarms for one device, optionally filtered by status:
    /// `GET /api/alarms/device/{deviceId}[?status=...]`.
    pub async fn list_for_device(
        &self,
        device_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<Alarm>, Error> {
        let mut url = self.alarms_url(&format!("device/{device_id}"));
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status);
        }
        self.get(url).await
    }

    /// Fetch one alarm by id.
    pub async fn get_alarm(&self, alarm_id: &str) -> Result<Alarm, Error> {
        self.get(self.alarms_url(alarm_id)).await
    }

    /// Delete an alarm outright: `DELETE /api/alarms/{id}`.
    ///
    /// The backend returns an empty body on success.
    pub async fn delete_alarm(&self, alarm_id: &str) -> Result<(), Error> {
        let url = self.alarms_url(alarm_id);
        debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::check_status(resp).await
    }

    /// Fetch aggregate alarm counters.
    pub async fn stats(&self) -> Result<AlarmStats, Error> {
        self.get(self.alarms_url("stats")).await
    }

    // ── Request plumbing ────────────────────────────────────────────

    /// Build `{base}/api/alarms/{path}`.
    fn alarms_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{base_path}/api/alarms/{path}"));
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Triage a response status, passing the response through on success.
    async fn triage(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::Api {
                status: 404,
                message: "alarm not found".into(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(resp)
    }

    /// Triage the status for endpoints with no response body.
    async fn check_status(resp: reqwest::Response) -> Result<(), Error> {
        Self::triage(resp).await.map(|_| ())
    }

    /// Triage the status, then decode the JSON body.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let resp = Self::triage(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.chars().take(200).collect(),
        })
    }
}

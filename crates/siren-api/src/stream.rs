//! SSE notification stream with auto-reconnect.
//!
//! Subscribes to the backend's `text/event-stream` endpoint and delivers
//! parsed [`AlarmEvent`]s through a [`tokio::sync::broadcast`] channel.
//! Reconnection runs in an explicit loop with bounded exponential backoff
//! and a cancellation token -- a dropped connection never loses consumer
//! state, it just pauses delivery until the stream is back.
//!
//! # Example
//!
//! ```rust,ignore
//! use siren_api::stream::{EventStreamHandle, ReconnectConfig};
//! use siren_api::transport::TransportConfig;
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("http://backend:8080/api/alarms/notifications/stream")?;
//!
//! let handle = EventStreamHandle::connect(
//!     url,
//!     ReconnectConfig::default(),
//!     cancel.clone(),
//!     &TransportConfig::default(),
//! )?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{} {} {}", event.severity, event.device_name, event.alarm_type);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::model::AlarmEvent;
use crate::transport::TransportConfig;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// SSE event name the backend uses for alarm notifications.
const ALARM_EVENT_NAME: &str = "alarm";

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 5s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 60s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running SSE notification stream.
///
/// Subscribers receive `Arc<AlarmEvent>` values in arrival order. Drop
/// all receivers and call [`shutdown`](Self::shutdown) to tear down the
/// background task.
pub struct EventStreamHandle {
    event_rx: broadcast::Receiver<Arc<AlarmEvent>>,
    cancel: CancellationToken,
}

impl EventStreamHandle {
    /// Spawn the stream's reconnection loop against the given URL.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Subscribe to the receiver to start consuming.
    pub fn connect(
        stream_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_stream_client()?;
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            sse_loop(http, stream_url, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AlarmEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn sse_loop(
    http: reqwest::Client,
    stream_url: Url,
    event_tx: broadcast::Sender<Arc<AlarmEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&http, &stream_url, &event_tx, &cancel) => {
                match result {
                    // Clean end (server closed the response). Reset the
                    // attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("notification stream ended cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "notification stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "stream reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("notification stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one SSE connection and read frames until it drops.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    event_tx: &broadcast::Sender<Arc<AlarmEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to notification stream");

    let resp = http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| Error::StreamConnect(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::StreamConnect(format!(
            "stream endpoint returned HTTP {status}"
        )));
    }

    tracing::info!("notification stream connected");

    let mut body = resp.bytes_stream();
    let mut parser = SseParser::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        for frame in parser.push(&bytes) {
                            dispatch_frame(&frame, event_tx);
                        }
                    }
                    Some(Err(e)) => {
                        return Err(Error::StreamConnect(e.to_string()));
                    }
                    None => {
                        // Server closed the response body.
                        tracing::info!("notification stream closed by server");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Parse an `alarm` frame's JSON payload and broadcast it.
///
/// Frames with other event names (keep-alives, future event types) are
/// skipped; malformed payloads are logged and skipped, never fatal.
fn dispatch_frame(frame: &SseFrame, event_tx: &broadcast::Sender<Arc<AlarmEvent>>) {
    if frame.event != ALARM_EVENT_NAME {
        tracing::trace!(event = %frame.event, "ignoring non-alarm SSE frame");
        return;
    }

    match serde_json::from_str::<AlarmEvent>(&frame.data) {
        Ok(event) => {
            // Ignore send errors -- just means no active subscribers right now.
            let _ = event_tx.send(Arc::new(event));
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed alarm notification");
        }
    }
}

// ── SSE framing ──────────────────────────────────────────────────────

/// One dispatched server-sent event: the event name plus joined data lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct SseFrame {
    event: String,
    data: String,
}

/// Incremental parser for the SSE wire format.
///
/// Chunks can split anywhere, including mid-line and mid-UTF-8-sequence,
/// so bytes accumulate until a full line is present. A blank line
/// dispatches the pending frame; `:` lines are comments (keep-alives);
/// `id` and `retry` fields are accepted and ignored.
#[derive(Default)]
struct SseParser {
    buf: Vec<u8>,
    event: String,
    data: String,
}

impl SseParser {
    /// Feed a chunk of bytes; returns any frames completed by it.
    fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
                continue;
            }
            if let Some(frame) = self.handle_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn handle_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.starts_with(':') {
            // Comment line, typically a keep-alive ping.
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = value.to_owned(),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            // "id", "retry", and unknown fields are accepted and ignored.
            _ => {}
        }
        None
    }

    /// Dispatch the pending frame, if it has any data.
    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() {
            // Event name without data resets like a full dispatch would.
            self.event.clear();
            return None;
        }
        Some(SseFrame {
            event: std::mem::take(&mut self.event),
            data: std::mem::take(&mut self.data),
        })
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Bounded exponential backoff: `delay = min(initial * 2^attempt, max)`.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config
        .initial_delay
        .saturating_mul(2u32.saturating_pow(attempt.min(16)));
    base.min(config.max_delay)
}

// ── Tests ────────────────────────────────────────────────────────────

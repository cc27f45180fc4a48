//! Async client for the siren alarm backend.
//!
//! Two surfaces:
//!
//! - **[`AlarmClient`]** -- REST calls against `/api/alarms`: the terminal
//!   actions (`ack`, `clear`) and the read endpoints (active,
//!   unacknowledged, by-id, stats).
//! - **[`EventStreamHandle`]** -- the SSE notification stream
//!   (`/api/alarms/notifications/stream`), delivering [`AlarmEvent`]s
//!   through a broadcast channel with automatic reconnection.
//!
//! `siren-core` composes both into the notification lifecycle manager;
//! this crate knows nothing about lifecycle state.

pub mod client;
pub mod error;
pub mod model;
pub mod stream;
pub mod transport;

pub use client::AlarmClient;
pub use error::Error;
pub use model::{Alarm, AlarmAction, AlarmEvent, AlarmStats, Severity};
pub use stream::{EventStreamHandle, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig};

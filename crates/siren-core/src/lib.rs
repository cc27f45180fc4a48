//! Alarm notification lifecycle management between `siren-api` and UI
//! consumers.
//!
//! This crate owns the dedup/lifecycle logic the siren workspace is
//! built around:
//!
//! - **[`Notifier`]** -- The manager. [`connect()`](Notifier::connect)
//!   starts a single-writer event loop plus the SSE subscription, then
//!   applies inbound pushes and user actions to the registry. Terminal
//!   actions ([`acknowledge`](Notifier::acknowledge) /
//!   [`ignore`](Notifier::ignore)) confirm against the backend before an
//!   entry may close; nothing closes on a timer.
//!
//! - **[`NotificationRegistry`]** -- Keyed storage (`DashMap` +
//!   `tokio::sync::watch`) holding at most one live entry per
//!   (device, alarm-type) key, with an alarm-id index for action lookup.
//!
//! - **[`NotificationChange`]** -- Push feed for pure renderers: opened,
//!   updated-in-place, resolving, resolved, action-failed, closed.
//!
//! - **[`NotificationStream`]** -- Snapshot subscription handle with
//!   `current()` / `changed()` / `next()` for reactive rendering.

pub mod config;
pub mod error;
pub mod model;
pub mod notifier;
pub mod registry;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::NotifierConfig;
pub use error::CoreError;
pub use model::{
    NotificationChange, NotificationEntry, NotificationKey, NotificationState, TerminalAction,
};
pub use notifier::Notifier;
pub use registry::NotificationRegistry;
pub use stream::NotificationStream;

// Re-export the wire types consumers handle directly.
pub use siren_api::{Alarm, AlarmAction, AlarmEvent, AlarmStats, ReconnectConfig, Severity};

// ── Notification domain types ──
//
// NotificationKey is the dedup identity (device + alarm type);
// NotificationEntry is one on-screen notification slot's state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siren_api::{AlarmAction, AlarmEvent, Severity};

// ── NotificationKey ─────────────────────────────────────────────────

/// Identity of one notification slot: `{device}:{type}`.
///
/// The device part is the device id, falling back to the device name
/// when the backend sends a null id. At most one live entry exists per
/// key -- repeated pushes for the same key coalesce into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationKey(String);

impl NotificationKey {
    /// Derive the key for an inbound event.
    pub fn for_event(event: &AlarmEvent) -> Self {
        let device = event.device_id.as_deref().unwrap_or(&event.device_name);
        Self(format!("{device}:{}", event.alarm_type))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── NotificationState ───────────────────────────────────────────────

/// Lifecycle state of a notification entry.
///
/// `Visible --(action accepted)--> Resolving --(close delay)--> Closed`;
/// a failed action rolls `Resolving` back to `Visible`. `Closed` is
/// terminal -- the entry is removed from the registry at that instant,
/// so a stored entry is never observed in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationState {
    Visible,
    Resolving,
    Closed,
}

// ── TerminalAction ──────────────────────────────────────────────────

/// The two user-initiated ways to close a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TerminalAction {
    /// Confirms the alarm was handled (`POST .../ack`).
    Acknowledge,
    /// Dismisses the alarm as noise (`POST .../clear`).
    Ignore,
}

// ── NotificationEntry ───────────────────────────────────────────────

/// One live notification: the coalesced state of every push received
/// for its key, plus its lifecycle state.
///
/// Entries are immutable snapshots; the manager replaces the stored
/// `Arc` on every change so watch subscribers see consistent values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub key: NotificationKey,
    /// Backend alarm id the terminal actions target. Updated if a later
    /// push for the same key carries a different id.
    pub alarm_id: String,
    pub device_name: String,
    pub alarm_type: String,
    pub severity: Severity,
    /// The most recent push's action -- drives how renderers present the
    /// entry (new alarm, updated, cleared, repeat reminder).
    pub action: AlarmAction,
    /// How many times the backend has pushed this alarm.
    pub occurrence_count: u32,
    pub state: NotificationState,
    /// When this entry was first opened.
    pub opened_at: DateTime<Utc>,
}

impl NotificationEntry {
    /// Build a fresh `Visible` entry from the first event for a key.
    pub fn open(key: NotificationKey, event: &AlarmEvent) -> Self {
        Self {
            key,
            alarm_id: event.id.clone(),
            device_name: event.device_name.clone(),
            alarm_type: event.alarm_type.clone(),
            severity: event.severity,
            action: event.action,
            occurrence_count: event.notification_count,
            state: NotificationState::Visible,
            opened_at: Utc::now(),
        }
    }

    /// Coalesce a repeat push into this entry: rendered severity, action,
    /// occurrence count, and alarm id update in place. Lifecycle state and
    /// `opened_at` are untouched -- an ingest never advances the state
    /// machine.
    pub fn coalesce(&self, event: &AlarmEvent) -> Self {
        Self {
            alarm_id: event.id.clone(),
            device_name: event.device_name.clone(),
            severity: event.severity,
            action: event.action,
            occurrence_count: event.notification_count,
            ..self.clone()
        }
    }

    /// Copy of this entry with a different lifecycle state.
    pub fn with_state(&self, state: NotificationState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

// ── NotificationChange ──────────────────────────────────────────────

/// Push notification for renderers, broadcast by the manager on every
/// registry mutation. A presentation layer driven purely by these
/// changes stays in lockstep with the registry without polling it.
#[derive(Debug, Clone)]
pub enum NotificationChange {
    /// A new entry appeared -- the only change that creates a rendered slot.
    Opened(Arc<NotificationEntry>),
    /// An existing entry re-rendered in place (severity/action/count).
    Updated(Arc<NotificationEntry>),
    /// A terminal action started; renderers disable interaction now.
    Resolving {
        key: NotificationKey,
        action: TerminalAction,
    },
    /// The backend confirmed the action; a short feedback window runs
    /// before `Closed`.
    Resolved {
        key: NotificationKey,
        action: TerminalAction,
    },
    /// The action failed; the entry is interactive again.
    ActionFailed {
        key: NotificationKey,
        action: TerminalAction,
        message: String,
    },
    /// The entry is gone; its key is free for a brand-new notification.
    Closed { key: NotificationKey },
}

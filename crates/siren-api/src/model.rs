// ── Wire types for the alarm backend ──
//
// AlarmEvent is the SSE notification payload; Alarm is the full REST
// resource. Both come straight off the backend's JSON, camelCase keys.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ── Severity ────────────────────────────────────────────────────────

/// Alarm severity as reported by the backend.
///
/// Unknown strings map to [`Severity::Indeterminate`] rather than failing
/// deserialization -- a *missing* severity is still an error, which is how
/// malformed notification payloads get rejected.
///
/// Ordering is by urgency: `Indeterminate < Warning < Minor < Major <
/// Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Minor,
    Major,
    Critical,
    #[serde(other)]
    Indeterminate,
}

impl Severity {
    fn urgency(self) -> u8 {
        match self {
            Self::Indeterminate => 0,
            Self::Warning => 1,
            Self::Minor => 2,
            Self::Major => 3,
            Self::Critical => 4,
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.urgency().cmp(&other.urgency())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ── AlarmAction ─────────────────────────────────────────────────────

/// What kind of notification push this event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlarmAction {
    Created,
    Updated,
    Cleared,
    Repeat,
    #[serde(other)]
    Other,
}

// ── AlarmEvent ──────────────────────────────────────────────────────

fn default_notification_count() -> u32 {
    1
}

/// One alarm notification as delivered over the SSE stream.
///
/// `id`, `device_name`, `type`, `severity`, and `action` are required;
/// a payload missing any of them fails to deserialize and is treated as
/// malformed by the consumer. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEvent {
    /// Backend alarm id, opaque string.
    pub id: String,

    /// Originating device id. Nullable; key derivation falls back to
    /// `device_name` when absent.
    #[serde(default)]
    pub device_id: Option<String>,

    /// Human-readable device name.
    pub device_name: String,

    /// Alarm type, e.g. `"High Temperature"`.
    #[serde(rename = "type")]
    pub alarm_type: String,

    pub severity: Severity,

    /// Lifecycle status string (`ACTIVE_UNACK`, `CLEARED_ACK`, ...).
    /// Carried opaquely; the notification lifecycle does not branch on it.
    #[serde(default)]
    pub status: Option<String>,

    /// Alarm start time, epoch milliseconds.
    #[serde(default)]
    pub start_ts: i64,

    pub action: AlarmAction,

    /// How many times this alarm has been pushed (repeat reminders).
    #[serde(default = "default_notification_count")]
    pub notification_count: u32,
}

impl AlarmEvent {
    /// Alarm start time as a `DateTime`, if `start_ts` is sensible.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.start_ts).single()
    }
}

// ── Alarm ───────────────────────────────────────────────────────────

/// Full alarm resource returned by the REST read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    #[serde(default)]
    pub originator: Option<String>,
    #[serde(default)]
    pub originator_name: Option<String>,
    #[serde(rename = "type")]
    pub alarm_type: String,
    pub severity: Severity,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_ts: i64,
    #[serde(default)]
    pub end_ts: i64,
    /// Details blob, backend-defined shape.
    #[serde(default)]
    pub details: serde_json::Value,
}

// ── AlarmStats ──────────────────────────────────────────────────────

/// Aggregate counters from `GET /api/alarms/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmStats {
    pub total: u64,
    pub active: u64,
    pub unacknowledged: u64,
    pub cleared: u64,
    /// Per-severity breakdown keyed by severity name.
    #[serde(default)]
    pub by_severity: std::collections::HashMap<String, u64>,
}

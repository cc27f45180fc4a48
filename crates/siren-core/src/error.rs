use thiserror::Error;

use crate::model::TerminalAction;

/// Errors surfaced by the notification lifecycle manager.
///
/// All of these are local to one operation -- none poison the manager,
/// which keeps processing subsequent events and actions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying API failure (transport, status, deserialization).
    #[error(transparent)]
    Api(#[from] siren_api::Error),

    /// No live notification carries this alarm id.
    #[error("no live notification for alarm '{alarm_id}'")]
    UnknownAlarm { alarm_id: String },

    /// A terminal action is already in flight for this entry; the
    /// double-click guard rejects the second attempt.
    #[error("an action is already in flight for alarm '{alarm_id}'")]
    ActionInFlight { alarm_id: String },

    /// The backend rejected an acknowledge/ignore call. The entry has
    /// been rolled back to its interactive state; retry is allowed.
    #[error("{action} failed for alarm '{alarm_id}': {source}")]
    ActionFailed {
        action: TerminalAction,
        alarm_id: String,
        #[source]
        source: siren_api::Error,
    },

    /// The manager's event loop is not running (not connected, or shut
    /// down).
    #[error("notification manager is not running")]
    NotRunning,
}

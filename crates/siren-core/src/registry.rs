// ── Reactive notification registry ──
//
// Keyed storage for live notification entries with O(1) lookups by
// key or alarm id, and push-based change notification via `watch`
// channels. The manager's event loop is the only writer.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{NotificationEntry, NotificationKey};

/// The keyed set of live notifications.
///
/// At most one entry exists per [`NotificationKey`] (primary map), and
/// terminal actions resolve entries by data lookup through the alarm-id
/// index, never by walking a presentation tree. Every mutation bumps a
/// version counter and rebuilds the snapshot that subscribers receive.
pub struct NotificationRegistry {
    /// Primary storage: notification key -> entry.
    by_key: DashMap<NotificationKey, Arc<NotificationEntry>>,

    /// Secondary index: alarm id -> notification key.
    alarm_to_key: DashMap<String, NotificationKey>,

    /// Reverse of `alarm_to_key` for efficient removal.
    key_to_alarm: DashMap<NotificationKey, String>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<NotificationEntry>>>>,
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationRegistry {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            alarm_to_key: DashMap::new(),
            key_to_alarm: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace the entry for its key. Returns `true` if the
    /// key was new.
    ///
    /// If the key already existed under a different alarm id (a later
    /// push re-keyed the same device+type to a new alarm), the stale
    /// alarm-id mapping is cleaned up.
    pub(crate) fn upsert(&self, entry: NotificationEntry) -> bool {
        let key = entry.key.clone();
        let alarm_id = entry.alarm_id.clone();

        if let Some(old_id) = self.key_to_alarm.get(&key) {
            if *old_id != alarm_id {
                self.alarm_to_key.remove(&*old_id);
            }
        }

        let is_new = !self.by_key.contains_key(&key);
        self.by_key.insert(key.clone(), Arc::new(entry));
        self.alarm_to_key.insert(alarm_id.clone(), key.clone());
        self.key_to_alarm.insert(key, alarm_id);

        self.rebuild_snapshot();
        self.bump_version();

        is_new
    }

    /// Remove an entry by key. Returns the removed entry if it existed.
    pub(crate) fn remove(&self, key: &NotificationKey) -> Option<Arc<NotificationEntry>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            if let Some((_, alarm_id)) = self.key_to_alarm.remove(key) {
                self.alarm_to_key.remove(&alarm_id);
            }
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Look up an entry by its notification key.
    pub fn get(&self, key: &NotificationKey) -> Option<Arc<NotificationEntry>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Look up an entry by the backend alarm id (secondary index).
    pub fn get_by_alarm_id(&self, alarm_id: &str) -> Option<Arc<NotificationEntry>> {
        let key = self.alarm_to_key.get(alarm_id)?;
        self.by_key.get(key.value()).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<NotificationEntry>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<NotificationEntry>>>> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<NotificationEntry>> =
            self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

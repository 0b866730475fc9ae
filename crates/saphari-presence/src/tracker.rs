//! Device presence tracker.
//!
//! States cycle `unseen → online → offline → online`. Every inbound
//! message refreshes `last_seen`; only state *transitions* produce side
//! effects (an immutable presence-event record plus a normalized broadcast
//! to the device's authorized users).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use saphari_core::config::presence::PresenceConfig;
use saphari_core::result::AppResult;
use saphari_core::traits::{AccessResolver, BroadcastEvent, EventBroadcaster, PresenceStore};

use crate::normalize::{canonical_status_topic, is_online_payload, is_status_topic};

/// In-memory presence state for one device.
///
/// Created lazily on the first message from the device and never removed;
/// the map is bounded by the number of distinct devices seen in the
/// process lifetime.
#[derive(Debug, Clone)]
pub struct DevicePresence {
    /// Device identifier.
    pub device_id: String,
    /// Last time any traffic was seen (epoch milliseconds).
    pub last_seen_ms: i64,
    /// Current online flag.
    pub online: bool,
    /// When the snapshot was last persisted (epoch milliseconds).
    pub last_flush_ms: i64,
}

/// One observed state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceTransition {
    /// Device that transitioned.
    pub device_id: String,
    /// The state the device transitioned into.
    pub online: bool,
    /// When the transition was observed (epoch milliseconds).
    pub at_ms: i64,
}

/// Tracks per-device presence and emits transition side effects.
#[derive(Clone)]
pub struct PresenceTracker {
    /// Device id → presence state.
    devices: Arc<DashMap<String, DevicePresence>>,
    /// Durable store for events and snapshots.
    store: Arc<dyn PresenceStore>,
    /// Access resolver for broadcast targeting.
    resolver: Arc<dyn AccessResolver>,
    /// Fan-out sink for transition events.
    broadcaster: Arc<dyn EventBroadcaster>,
    /// Topic prefix for the canonical status topic.
    topic_prefix: String,
    /// Tracker timing configuration.
    config: PresenceConfig,
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("tracked_devices", &self.devices.len())
            .finish()
    }
}

impl PresenceTracker {
    /// Creates a new presence tracker.
    pub fn new(
        store: Arc<dyn PresenceStore>,
        resolver: Arc<dyn AccessResolver>,
        broadcaster: Arc<dyn EventBroadcaster>,
        topic_prefix: impl Into<String>,
        config: PresenceConfig,
    ) -> Self {
        Self {
            devices: Arc::new(DashMap::new()),
            store,
            resolver,
            broadcaster,
            topic_prefix: topic_prefix.into(),
            config,
        }
    }

    /// Observe one inbound message for a device.
    ///
    /// Updates in-memory state and spawns the side effects for any
    /// resulting transitions. Store failures are logged, never propagated;
    /// message handling is not blocked on persistence.
    pub fn observe(&self, device_id: &str, topic: &str, payload: &str) {
        let now_ms = Utc::now().timestamp_millis();
        for transition in self.observe_at(device_id, topic, payload, now_ms) {
            self.spawn_transition(transition);
        }
    }

    /// State-machine core of [`observe`](Self::observe); takes an explicit
    /// clock so the TTL behavior stays testable.
    fn observe_at(
        &self,
        device_id: &str,
        topic: &str,
        payload: &str,
        now_ms: i64,
    ) -> Vec<PresenceTransition> {
        let mut transitions = Vec::new();

        match self.devices.entry(device_id.to_string()) {
            Entry::Vacant(slot) => {
                // First traffic ever seen from this device.
                let mut state = DevicePresence {
                    device_id: device_id.to_string(),
                    last_seen_ms: now_ms,
                    online: true,
                    last_flush_ms: 0,
                };
                transitions.push(PresenceTransition {
                    device_id: device_id.to_string(),
                    online: true,
                    at_ms: now_ms,
                });

                // An explicit offline status on the very first message
                // still wins over the implicit online creation.
                if is_status_topic(topic) && !is_online_payload(payload) {
                    state.online = false;
                    transitions.push(PresenceTransition {
                        device_id: device_id.to_string(),
                        online: false,
                        at_ms: now_ms,
                    });
                }

                slot.insert(state);
            }
            Entry::Occupied(mut entry) => {
                let state = entry.get_mut();

                if is_status_topic(topic) {
                    let reported_online = is_online_payload(payload);
                    if reported_online != state.online {
                        state.online = reported_online;
                        transitions.push(PresenceTransition {
                            device_id: device_id.to_string(),
                            online: reported_online,
                            at_ms: now_ms,
                        });
                    }
                } else if !state.online {
                    // Any traffic proves liveness.
                    state.online = true;
                    transitions.push(PresenceTransition {
                        device_id: device_id.to_string(),
                        online: true,
                        at_ms: now_ms,
                    });
                }

                state.last_seen_ms = now_ms;
            }
        }

        transitions
    }

    /// Run one TTL sweep: demote every online device whose last traffic is
    /// at least the offline TTL ago, spawning the transition side effects.
    ///
    /// This is what detects silent disconnects with no explicit offline
    /// message.
    pub fn sweep(&self) {
        let now_ms = Utc::now().timestamp_millis();
        for transition in self.sweep_at(now_ms) {
            self.spawn_transition(transition);
        }
    }

    fn sweep_at(&self, now_ms: i64) -> Vec<PresenceTransition> {
        let ttl_ms = self.config.offline_ttl_seconds as i64 * 1_000;
        let mut transitions = Vec::new();

        for mut entry in self.devices.iter_mut() {
            let state = entry.value_mut();
            if state.online && now_ms - state.last_seen_ms >= ttl_ms {
                state.online = false;
                debug!(
                    device_id = %state.device_id,
                    silent_ms = now_ms - state.last_seen_ms,
                    "Demoting silent device to offline"
                );
                transitions.push(PresenceTransition {
                    device_id: state.device_id.clone(),
                    online: false,
                    at_ms: now_ms,
                });
            }
        }

        transitions
    }

    /// Persist the snapshot of every device whose last flush is older than
    /// the configured minimum age. Errors leave in-memory state intact and
    /// the row stale until the next successful flush.
    pub async fn flush(&self) {
        let now_ms = Utc::now().timestamp_millis();
        for snapshot in self.flush_candidates_at(now_ms) {
            let last_seen = timestamp_from_ms(snapshot.last_seen_ms);
            if let Err(e) = self
                .store
                .upsert_device_presence(&snapshot.device_id, snapshot.online, last_seen)
                .await
            {
                warn!(
                    device_id = %snapshot.device_id,
                    error = %e,
                    "Failed to flush device presence snapshot"
                );
            }
        }
    }

    fn flush_candidates_at(&self, now_ms: i64) -> Vec<DevicePresence> {
        let min_age_ms = self.config.min_flush_age_seconds as i64 * 1_000;
        let mut due = Vec::new();

        for mut entry in self.devices.iter_mut() {
            let state = entry.value_mut();
            if now_ms - state.last_flush_ms >= min_age_ms {
                state.last_flush_ms = now_ms;
                due.push(state.clone());
            }
        }

        due
    }

    /// Persist and broadcast one transition.
    ///
    /// The event record is appended regardless of authorization; the
    /// broadcast is skipped when no user may observe the device. Returns
    /// the persistence result so callers can decide to await, log, or
    /// ignore it.
    pub async fn record_transition(&self, transition: &PresenceTransition) -> AppResult<()> {
        let occurred_at = timestamp_from_ms(transition.at_ms);
        let persisted = self
            .store
            .append_presence_event(&transition.device_id, transition.online, occurred_at)
            .await;

        let users = self.resolver.resolve(&transition.device_id).await;
        if !users.is_empty() {
            let event = BroadcastEvent {
                topic: canonical_status_topic(&self.topic_prefix, &transition.device_id),
                payload: if transition.online {
                    "online".to_string()
                } else {
                    "offline".to_string()
                },
                ts: transition.at_ms,
            };
            self.broadcaster.broadcast_to_users(&users, &event).await;
        }

        persisted
    }

    fn spawn_transition(&self, transition: PresenceTransition) {
        let tracker = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tracker.record_transition(&transition).await {
                warn!(
                    device_id = %transition.device_id,
                    online = transition.online,
                    error = %e,
                    "Failed to persist presence transition"
                );
            }
        });
    }

    /// Whether a device is currently tracked as online.
    pub fn is_online(&self, device_id: &str) -> bool {
        self.devices
            .get(device_id)
            .map(|s| s.online)
            .unwrap_or(false)
    }

    /// Snapshot of one device's presence state.
    pub fn snapshot(&self, device_id: &str) -> Option<DevicePresence> {
        self.devices.get(device_id).map(|s| s.clone())
    }

    /// Number of devices seen so far.
    pub fn tracked_devices(&self) -> usize {
        self.devices.len()
    }
}

fn timestamp_from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

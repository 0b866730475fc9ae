//! Room registry — live connections indexed by user.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe registry of rooms.
///
/// A room is the set of connections belonging to one user id. Rooms are
/// created when the first connection for a user joins and removed when
/// the last one leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// User ID → connections in that user's room.
    by_user: DashMap<Uuid, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins a connection to its user's room.
    pub fn join(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_user.entry(handle.user_id).or_default().push(handle);
    }

    /// Removes a connection; deletes the room if it becomes empty.
    pub fn leave(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove(&handle.user_id);
            }
        }
        Some(handle)
    }

    /// All connections in one user's room.
    pub fn room(&self, user_id: &Uuid) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// All connections across the given users' rooms, de-duplicated by
    /// connection identity.
    pub fn connections_for_users(&self, user_ids: &HashSet<Uuid>) -> Vec<Arc<ConnectionHandle>> {
        let mut seen: HashSet<ConnectionId> = HashSet::new();
        let mut connections = Vec::new();

        for user_id in user_ids {
            for handle in self.room(user_id) {
                if seen.insert(handle.id) {
                    connections.push(handle);
                }
            }
        }

        connections
    }

    /// All live connections.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Total number of connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.by_user.len()
    }

    /// Removes every connection.
    pub fn clear(&self) -> Vec<Arc<ConnectionHandle>> {
        let all = self.all_connections();
        self.by_id.clear();
        self.by_user.clear();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_handle(user_id: Uuid) -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::channel(8);
        Arc::new(ConnectionHandle::new(user_id, tx))
    }

    #[test]
    fn test_room_created_and_removed() {
        let rooms = RoomRegistry::new();
        let user = Uuid::new_v4();
        let handle = make_handle(user);

        rooms.join(handle.clone());
        assert_eq!(rooms.room_count(), 1);
        assert_eq!(rooms.room(&user).len(), 1);

        rooms.leave(&handle.id);
        assert_eq!(rooms.room_count(), 0, "empty room must be deleted");
        assert_eq!(rooms.connection_count(), 0);
    }

    #[test]
    fn test_room_survives_while_other_connections_remain() {
        let rooms = RoomRegistry::new();
        let user = Uuid::new_v4();
        let first = make_handle(user);
        let second = make_handle(user);

        rooms.join(first.clone());
        rooms.join(second);
        rooms.leave(&first.id);

        assert_eq!(rooms.room_count(), 1);
        assert_eq!(rooms.room(&user).len(), 1);
    }

    #[test]
    fn test_connections_for_users_deduplicates() {
        let rooms = RoomRegistry::new();
        let user = Uuid::new_v4();
        rooms.join(make_handle(user));
        rooms.join(make_handle(user));

        let targets: HashSet<Uuid> = [user].into_iter().collect();
        let connections = rooms.connections_for_users(&targets);

        assert_eq!(connections.len(), 2, "both tabs get the message once each");
        let ids: HashSet<ConnectionId> = connections.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_unknown_user_has_empty_room() {
        let rooms = RoomRegistry::new();
        assert!(rooms.room(&Uuid::new_v4()).is_empty());
    }
}

//! Room registry: which rooms exist and which connection sits in which.

use std::collections::HashMap;

use faceoff_protocol::{MatchId, Role};
use faceoff_transport::ConnectionId;

use crate::room::{MemberSender, RoomHandle, spawn_room};
use crate::RelayError;

/// Maps match ids to room actors and connections to their room.
///
/// A connection is in at most one room. Rooms are created by the first
/// `join` for their match and destroyed when the last member leaves.
pub struct RoomRegistry {
    rooms: HashMap<MatchId, RoomHandle>,
    members: HashMap<ConnectionId, MatchId>,
    room_buffer: usize,
}

impl RoomRegistry {
    pub fn new(room_buffer: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            members: HashMap::new(),
            room_buffer: room_buffer.max(1),
        }
    }

    /// Puts `conn_id` into the room for `match_id`, creating the room if
    /// needed. Joining the room the connection is already in refreshes
    /// its membership; joining another room leaves the old one first.
    ///
    /// Returns the member count of the joined room.
    pub async fn join(
        &mut self,
        conn_id: ConnectionId,
        match_id: MatchId,
        role: Role,
        sender: MemberSender,
    ) -> Result<usize, RelayError> {
        if self
            .members
            .get(&conn_id)
            .is_some_and(|current| *current != match_id)
        {
            self.leave(conn_id).await?;
        }

        let room = match self.rooms.get(&match_id) {
            Some(room) => room.clone(),
            None => {
                let room = spawn_room(match_id.clone(), self.room_buffer);
                tracing::info!(%match_id, "room created");
                self.rooms.insert(match_id.clone(), room.clone());
                room
            }
        };

        let members = room.join(conn_id, role, sender).await?;
        self.members.insert(conn_id, match_id);
        Ok(members)
    }

    /// Takes `conn_id` out of its room, destroying the room if it is
    /// now empty. Returns the room it was in, if any.
    pub async fn leave(&mut self, conn_id: ConnectionId) -> Result<Option<MatchId>, RelayError> {
        let Some(match_id) = self.members.remove(&conn_id) else {
            return Ok(None);
        };
        let Some(room) = self.rooms.get(&match_id).cloned() else {
            return Ok(Some(match_id));
        };

        let remaining = match room.leave(conn_id).await {
            Ok(n) => n,
            Err(e) => {
                // The actor is gone; forget the room.
                self.rooms.remove(&match_id);
                return Err(e);
            }
        };
        if remaining == 0 {
            self.destroy(&match_id).await;
        }
        Ok(Some(match_id))
    }

    /// The room `conn_id` is in.
    pub fn room_of(&self, conn_id: ConnectionId) -> Option<RoomHandle> {
        self.members
            .get(&conn_id)
            .and_then(|match_id| self.rooms.get(match_id))
            .cloned()
    }

    pub fn room(&self, match_id: &MatchId) -> Option<RoomHandle> {
        self.rooms.get(match_id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    async fn destroy(&mut self, match_id: &MatchId) {
        if let Some(room) = self.rooms.remove(match_id) {
            let _ = room.shutdown().await;
            tracing::info!(%match_id, "room destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::room::Frame;

    fn member() -> (MemberSender, mpsc::UnboundedReceiver<Frame>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_first_join_creates_room() {
        let mut registry = RoomRegistry::new(8);
        let conn = ConnectionId::new(1);

        let n = registry
            .join(conn, MatchId::new("g-1"), Role::Host, member().0)
            .await
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.room_of(conn).unwrap().match_id().as_str(), "g-1");
    }

    #[tokio::test]
    async fn test_second_member_shares_room() {
        let mut registry = RoomRegistry::new(8);
        let id = MatchId::new("g-1");

        registry.join(ConnectionId::new(1), id.clone(), Role::Host, member().0).await.unwrap();
        let n = registry.join(ConnectionId::new(2), id, Role::Viewer, member().0).await.unwrap();

        assert_eq!(n, 2);
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn test_switching_rooms_leaves_old_one() {
        let mut registry = RoomRegistry::new(8);
        let conn = ConnectionId::new(1);

        registry.join(conn, MatchId::new("g-1"), Role::Host, member().0).await.unwrap();
        registry.join(conn, MatchId::new("g-2"), Role::Host, member().0).await.unwrap();

        assert!(registry.room(&MatchId::new("g-1")).is_none());
        assert_eq!(registry.room_of(conn).unwrap().match_id().as_str(), "g-2");
    }

    #[tokio::test]
    async fn test_last_leave_destroys_room() {
        let mut registry = RoomRegistry::new(8);
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(2);
        let id = MatchId::new("g-1");
        registry.join(a, id.clone(), Role::Host, member().0).await.unwrap();
        registry.join(b, id.clone(), Role::Viewer, member().0).await.unwrap();

        assert_eq!(registry.leave(a).await.unwrap(), Some(id.clone()));
        assert_eq!(registry.room_count(), 1);

        registry.leave(b).await.unwrap();
        assert_eq!(registry.room_count(), 0);
        assert!(registry.room_of(b).is_none());
    }

    #[tokio::test]
    async fn test_leave_without_room_is_noop() {
        let mut registry = RoomRegistry::new(8);
        assert_eq!(registry.leave(ConnectionId::new(9)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let mut registry = RoomRegistry::new(8);
        let (tx1, mut rx1) = member();
        let (tx2, mut rx2) = member();
        let (tx3, _rx3) = member();
        registry.join(ConnectionId::new(1), MatchId::new("g-1"), Role::Viewer, tx1).await.unwrap();
        registry.join(ConnectionId::new(2), MatchId::new("g-2"), Role::Viewer, tx2).await.unwrap();
        registry.join(ConnectionId::new(3), MatchId::new("g-1"), Role::Host, tx3).await.unwrap();

        let room = registry.room_of(ConnectionId::new(3)).unwrap();
        room.forward(ConnectionId::new(3), Arc::from(&b"hi"[..])).await.unwrap();
        room.get_info().await.unwrap();

        assert_eq!(&*rx1.recv().await.unwrap(), b"hi");
        assert!(rx2.try_recv().is_err());
    }
}

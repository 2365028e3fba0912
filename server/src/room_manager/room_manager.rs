use std::{collections::HashMap, sync::Arc};

use comms::{event::Event, segment::Segment};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use super::room::{BoardRoom, RoomMemberHandle};

pub type RoomJoinResult = (
    broadcast::Receiver<Event>,
    RoomMemberHandle,
    (Vec<Segment>, i64),
);

/// [RoomManager] maps room ids to live rooms.
///
/// Rooms are created the first time a session joins them and evicted when
/// their last member leaves, so the set of rooms held in memory is bounded
/// by the set of rooms someone is actually looking at. Each room is an
/// isolated unit behind its own lock; operations on different rooms never
/// serialize against each other.
#[derive(Debug, Clone, Default)]
pub struct RoomManager {
    rooms: Arc<Mutex<HashMap<String, Arc<Mutex<BoardRoom>>>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a room given a session id, creating the room on first join.
    ///
    /// The registry lock is held across the join itself so that a concurrent
    /// last-member leave cannot evict the room between lookup and join.
    pub async fn join_room(&self, room_id: &str, session_id: &str) -> RoomJoinResult {
        let mut rooms = self.rooms.lock().await;

        let room = Arc::clone(rooms.entry(String::from(room_id)).or_insert_with(|| {
            info!(room_id, "creating room on first join");
            Arc::new(Mutex::new(BoardRoom::new(room_id)))
        }));

        // the guard is a named local so it drops before `room` does
        let mut room_guard = room.lock().await;

        room_guard.join(session_id)
    }

    /// Drop a membership handle, consuming it. Evicts the room when its last
    /// member is gone; any state it held is discarded, a later join starts
    /// from an empty canvas.
    pub async fn drop_member_handle(&self, handle: RoomMemberHandle) {
        let mut rooms = self.rooms.lock().await;
        let room_id = String::from(handle.room_id());

        if let Some(room) = rooms.get(&room_id) {
            let now_empty = room.lock().await.leave(handle);

            if now_empty {
                rooms.remove(&room_id);
                info!(room_id, "evicting empty room");
            }
        }
    }

    /// Append a drawn segment to a room and broadcast it to the members.
    ///
    /// Unknown rooms are ignored: the session layer only routes commands for
    /// rooms it has joined, so a miss here means the room was already
    /// evicted and there is nobody left to notify.
    pub async fn draw(&self, room_id: &str, session_id: &str, segment: Segment) {
        if let Some(room) = self.get_room(room_id).await {
            room.lock().await.draw(session_id, segment);
        }
    }

    /// Undo a room's last visible segment. No-ops are swallowed silently so
    /// a stale client request produces no broadcast at all.
    pub async fn undo(&self, room_id: &str) {
        if let Some(room) = self.get_room(room_id).await {
            if let Err(err) = room.lock().await.undo() {
                debug!(room_id, %err, "swallowing no-op undo");
            }
        }
    }

    /// Redo a room's first hidden segment, with the same no-op policy as undo.
    pub async fn redo(&self, room_id: &str) {
        if let Some(room) = self.get_room(room_id).await {
            if let Err(err) = room.lock().await.redo() {
                debug!(room_id, %err, "swallowing no-op redo");
            }
        }
    }

    /// Hard-reset a room's history and notify its members.
    pub async fn clear(&self, room_id: &str) {
        if let Some(room) = self.get_room(room_id).await {
            room.lock().await.clear();
        }
    }

    /// Re-broadcast a room's authoritative state to all members.
    pub async fn broadcast_snapshot(&self, room_id: &str) {
        if let Some(room) = self.get_room(room_id).await {
            room.lock().await.broadcast_snapshot();
        }
    }

    /// The full snapshot of a room, for a session re-joining a room it is
    /// already a member of.
    pub async fn snapshot(&self, room_id: &str) -> Option<(Vec<Segment>, i64)> {
        let room = self.get_room(room_id).await?;
        let snapshot = room.lock().await.snapshot();

        Some(snapshot)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    // The room arc is cloned out so the registry lock is released before the
    // room mutation; only join/eviction hold both locks, always in the same
    // registry-then-room order.
    async fn get_room(&self, room_id: &str) -> Option<Arc<Mutex<BoardRoom>>> {
        self.rooms.lock().await.get(room_id).cloned()
    }
}

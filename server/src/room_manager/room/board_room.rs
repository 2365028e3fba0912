use comms::{
    event::{self, Event},
    segment::Segment,
};
use tokio::sync::broadcast;

use super::{
    history::{BoardHistory, HistoryError},
    member_registry::MemberRegistry,
    room_member_handle::RoomMemberHandle,
};

const BROADCAST_CHANNEL_CAPACITY: usize = 100;

/// [BoardRoom] owns the drawing history and the primary broadcast channel of
/// a single room. A [RoomMemberHandle] is handed out to a session when it
/// joins the room.
///
/// All mutations must happen with the room lock held; events are sent from
/// inside that critical section, so every member observes the same per-room
/// total order of operations.
#[derive(Debug)]
pub struct BoardRoom {
    room_id: String,
    broadcast_tx: broadcast::Sender<Event>,
    history: BoardHistory,
    members: MemberRegistry,
}

impl BoardRoom {
    pub fn new(room_id: &str) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);

        BoardRoom {
            room_id: String::from(room_id),
            broadcast_tx,
            history: BoardHistory::new(),
            members: MemberRegistry::new(),
        }
    }

    /// Add a member to the room.
    ///
    /// # Returns
    ///
    /// - A broadcast receiver for the member to receive room events
    /// - A [RoomMemberHandle] to be consumed when the member leaves
    /// - The full history snapshot, to be replied to this member only
    pub fn join(
        &mut self,
        session_id: &str,
    ) -> (
        broadcast::Receiver<Event>,
        RoomMemberHandle,
        (Vec<Segment>, i64),
    ) {
        let broadcast_rx = self.broadcast_tx.subscribe();
        self.members.insert(session_id);

        let handle = RoomMemberHandle::new(self.room_id.clone(), String::from(session_id));

        (broadcast_rx, handle, self.history.snapshot())
    }

    /// Remove a member from the room, consuming its handle. Returns true
    /// when the room no longer has any members and can be evicted.
    pub fn leave(&mut self, handle: RoomMemberHandle) -> bool {
        self.members.remove(handle.session_id());

        self.members.is_empty()
    }

    /// Append a segment drawn by `session_id` and notify every member, the
    /// originator included. The event carries the origin session id and the
    /// new cursor so receivers advance in lock-step and the originator can
    /// reconcile its optimistic stroke.
    pub fn draw(&mut self, session_id: &str, segment: Segment) {
        self.history.append(segment.clone());

        let _ = self
            .broadcast_tx
            .send(Event::DrawLine(event::SegmentDrawnBroadcastEvent {
                room_id: self.room_id.clone(),
                session_id: String::from(session_id),
                current_index: self.history.current_index(),
                segment,
            }));
    }

    /// Hide the last visible segment and broadcast the full snapshot, since
    /// a cursor move changes the visible prefix rather than appending.
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        self.history.undo()?;
        self.broadcast_snapshot();

        Ok(())
    }

    /// Restore the first hidden segment and broadcast the full snapshot.
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        self.history.redo()?;
        self.broadcast_snapshot();

        Ok(())
    }

    /// Discard the history and notify every member to reset their canvas.
    pub fn clear(&mut self) {
        self.history.clear();

        let _ = self
            .broadcast_tx
            .send(Event::BoardCleared(event::BoardClearedBroadcastEvent {
                room_id: self.room_id.clone(),
            }));
    }

    /// The full history snapshot without broadcasting it.
    pub fn snapshot(&self) -> (Vec<Segment>, i64) {
        self.history.snapshot()
    }

    /// Re-broadcast the authoritative state to every member, e.g. when a
    /// client finishes a stroke and asks for a resync.
    pub fn broadcast_snapshot(&self) {
        let (drawings, current_index) = self.history.snapshot();

        let _ = self
            .broadcast_tx
            .send(Event::UpdateState(event::UpdateStateBroadcastEvent {
                room_id: self.room_id.clone(),
                drawings,
                current_index,
            }));
    }
}

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use comms::{
    command::UserCommand,
    event::{self, Event},
};
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::{AbortHandle, JoinSet},
};
use tracing::warn;

use crate::room_manager::{RoomManager, RoomMemberHandle};

/// [BoardSession] abstracts the board interactions of a single connection,
/// which may be a member of multiple rooms at once.
pub(super) struct BoardSession {
    session_id: String,
    room_manager: Arc<RoomManager>,
    joined_rooms: HashMap<String, (RoomMemberHandle, AbortHandle)>,
    join_set: JoinSet<()>,
    mpsc_tx: mpsc::Sender<Event>,
    mpsc_rx: mpsc::Receiver<Event>,
}

impl BoardSession {
    pub fn new(session_id: &str, room_manager: Arc<RoomManager>) -> Self {
        let (mpsc_tx, mpsc_rx) = mpsc::channel(100);

        BoardSession {
            session_id: String::from(session_id),
            room_manager,
            joined_rooms: HashMap::new(),
            join_set: JoinSet::new(),
            mpsc_tx,
            mpsc_rx,
        }
    }

    /// Handle a user command in the context of this session.
    ///
    /// Commands that reference a room the session has not joined are dropped
    /// silently: the client gates them on its own mirrored state, which is a
    /// hint only and may be stale. Nothing a client sends here can tear down
    /// the session or the room.
    pub async fn handle_user_command(&mut self, cmd: UserCommand) -> anyhow::Result<()> {
        match cmd {
            UserCommand::JoinRoom(cmd) => {
                if self.joined_rooms.contains_key(&cmd.room_id) {
                    // re-join of a joined room only refreshes the snapshot,
                    // which makes reconnecting clients self-healing
                    if let Some((drawings, current_index)) =
                        self.room_manager.snapshot(&cmd.room_id).await
                    {
                        self.mpsc_tx
                            .send(Event::InitState(event::InitStateReplyEvent {
                                room_id: cmd.room_id,
                                drawings,
                                current_index,
                            }))
                            .await?;
                    }

                    return Ok(());
                }

                let (mut broadcast_rx, handle, (drawings, current_index)) = self
                    .room_manager
                    .join_room(&cmd.room_id, &self.session_id)
                    .await;

                // reply with the initial snapshot before the forwarder task
                // starts, so the client always receives its base state first
                self.mpsc_tx
                    .send(Event::InitState(event::InitStateReplyEvent {
                        room_id: cmd.room_id.clone(),
                        drawings,
                        current_index,
                    }))
                    .await?;

                // spawn a task to forward broadcasted room events to the
                // session's mpsc channel, so the session receives events
                // from all of its rooms via a single channel. A receiver
                // that falls behind the broadcast channel misses events for
                // good, so a lagged member is handed a fresh snapshot
                // instead of incremental events it can no longer replay
                let abort_handle = self.join_set.spawn({
                    let mpsc_tx = self.mpsc_tx.clone();
                    let room_manager = Arc::clone(&self.room_manager);
                    let room_id = cmd.room_id.clone();

                    async move {
                        loop {
                            match broadcast_rx.recv().await {
                                Ok(event) => {
                                    if mpsc_tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                                Err(RecvError::Lagged(missed_events)) => {
                                    warn!(%room_id, missed_events, "session lagged behind the room, resyncing");

                                    if let Some((drawings, current_index)) =
                                        room_manager.snapshot(&room_id).await
                                    {
                                        let resync =
                                            Event::UpdateState(event::UpdateStateBroadcastEvent {
                                                room_id: room_id.clone(),
                                                drawings,
                                                current_index,
                                            });

                                        if mpsc_tx.send(resync).await.is_err() {
                                            break;
                                        }
                                    }
                                }
                                Err(RecvError::Closed) => break,
                            }
                        }
                    }
                });

                // store references to the member handle and abort handle,
                // used to drop the membership and to cancel the forwarder
                // when the session leaves the room
                self.joined_rooms
                    .insert(cmd.room_id.clone(), (handle, abort_handle));
            }
            UserCommand::DrawLine(cmd) => {
                if !self.joined_rooms.contains_key(&cmd.room_id) {
                    return Ok(());
                }

                // the transport already rejected lines that do not parse,
                // this rejects values that parse but cannot be rendered
                if !cmd.segment.is_well_formed() {
                    warn!(
                        session_id = %self.session_id,
                        room_id = %cmd.room_id,
                        "dropping malformed segment"
                    );
                    return Ok(());
                }

                self.room_manager
                    .draw(&cmd.room_id, &self.session_id, cmd.segment)
                    .await;
            }
            UserCommand::CompleteDrawing(cmd) => {
                if self.joined_rooms.contains_key(&cmd.room_id) {
                    self.room_manager.broadcast_snapshot(&cmd.room_id).await;
                }
            }
            UserCommand::UndoAction(cmd) => {
                if self.joined_rooms.contains_key(&cmd.room_id) {
                    self.room_manager.undo(&cmd.room_id).await;
                }
            }
            UserCommand::RedoAction(cmd) => {
                if self.joined_rooms.contains_key(&cmd.room_id) {
                    self.room_manager.redo(&cmd.room_id).await;
                }
            }
            UserCommand::ClearBoard(cmd) => {
                if self.joined_rooms.contains_key(&cmd.room_id) {
                    self.room_manager.clear(&cmd.room_id).await;
                }
            }
            UserCommand::LeaveRoom(cmd) => {
                // remove the room from joined rooms and drop the membership
                if let Some(entry) = self.joined_rooms.remove(&cmd.room_id) {
                    self.cleanup_room(entry).await;
                }
            }
            UserCommand::Quit(_) => {}
        }

        Ok(())
    }

    /// Leave all the rooms the session is currently a member of
    pub async fn leave_all_rooms(&mut self) {
        // drain the joined rooms to a variable, necessary to avoid borrowing self
        let drained = self.joined_rooms.drain().collect::<Vec<_>>();

        for (_, entry) in drained {
            self.cleanup_room(entry).await;
        }
    }

    /// Cleanup the room by dropping the membership handle and aborting the
    /// task that forwards broadcasted room events to the session
    async fn cleanup_room(&mut self, (handle, abort_handle): (RoomMemberHandle, AbortHandle)) {
        self.room_manager.drop_member_handle(handle).await;

        abort_handle.abort();
    }

    /// Receive an event that may have originated from any of the rooms the
    /// session is actively a member of
    pub async fn recv(&mut self) -> anyhow::Result<Event> {
        self.mpsc_rx
            .recv()
            .await
            .context("could not recv from the session channel")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use comms::{command, segment::Segment};
    use tokio::time::timeout;

    use super::*;

    fn segment(label: f64) -> Segment {
        Segment {
            start_x: label,
            start_y: 0.0,
            end_x: 1.0,
            end_y: 1.0,
            color: "#000000".to_string(),
            brush_size: 5.0,
        }
    }

    // a member that falls behind the room broadcast channel must be resynced
    // with a snapshot, not silently cut off from all further room events
    #[tokio::test]
    async fn test_lagging_member_is_resynced_instead_of_cut_off() {
        let room_manager = Arc::new(RoomManager::new());
        let mut session = BoardSession::new("session-1", Arc::clone(&room_manager));

        session
            .handle_user_command(UserCommand::JoinRoom(command::JoinRoomCommand {
                room_id: "room-1".to_string(),
            }))
            .await
            .unwrap();
        assert!(matches!(session.recv().await.unwrap(), Event::InitState(_)));

        // flood the room well past the broadcast and mpsc capacities while
        // the session is not draining its channel
        for i in 0..400 {
            room_manager
                .draw("room-1", "other-session", segment(i as f64))
                .await;
        }

        // drain everything that was buffered before the session fell behind
        while timeout(Duration::from_millis(100), session.recv())
            .await
            .is_ok()
        {}

        // a fresh draw must still reach the member, either incrementally or
        // inside a resync snapshot
        let fresh = segment(1000.0);
        room_manager
            .draw("room-1", "other-session", fresh.clone())
            .await;

        let mut caught_up = false;
        for _ in 0..500 {
            let event = timeout(Duration::from_secs(5), session.recv())
                .await
                .expect("session stopped receiving room events")
                .unwrap();

            match event {
                Event::DrawLine(event) if event.segment == fresh => {
                    caught_up = true;
                    break;
                }
                Event::UpdateState(event) if event.drawings.last() == Some(&fresh) => {
                    caught_up = true;
                    break;
                }
                _ => {}
            }
        }

        assert!(caught_up);
    }
}

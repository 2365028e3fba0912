use std::collections::HashMap;

use comms::{event::Event, segment::Segment};

use crate::surface::CanvasSurface;

/// Mirrored authoritative state for a single room
#[derive(Debug, Clone)]
pub struct BoardData {
    /// The full authoritative segment log, redo candidates included
    pub drawings: Vec<Segment>,
    /// Index of the last visible segment, -1 for an empty canvas
    pub current_index: i64,
    /// Has received the initial snapshot for the room
    pub has_joined: bool,
    /// Own strokes drawn optimistically but not yet echoed by the server
    in_flight: usize,
}

impl Default for BoardData {
    fn default() -> Self {
        BoardData {
            drawings: Vec::new(),
            current_index: -1,
            has_joined: false,
            in_flight: 0,
        }
    }
}

impl BoardData {
    /// Best-effort hint for gating an undo request; the server re-validates
    pub fn can_undo(&self) -> bool {
        self.current_index >= 0
    }

    /// Best-effort hint for gating a redo request; the server re-validates
    pub fn can_redo(&self) -> bool {
        self.current_index < self.drawings.len() as i64 - 1
    }

    fn visible_len(&self) -> usize {
        (self.current_index + 1) as usize
    }
}

#[derive(Debug, Clone)]
pub enum ServerConnectionStatus {
    Uninitialized,
    Connecting,
    Connected { addr: String },
    Errored { err: String },
}

/// State holds the client-side mirror of the server's authoritative state.
///
/// The client never originates cursor changes; it requests operations and
/// reconciles whatever the server echoes back. The only local liberty taken
/// is drawing own strokes optimistically before their echo arrives, to hide
/// latency.
#[derive(Debug, Clone)]
pub struct State {
    pub server_connection_status: ServerConnectionStatus,
    /// The session id assigned by the server, used to recognize own echoes
    pub session_id: String,
    /// The room the surface currently shows
    pub active_room: Option<String>,
    /// Mirrored state per room
    pub board_data_map: HashMap<String, BoardData>,
}

impl Default for State {
    fn default() -> Self {
        State {
            server_connection_status: ServerConnectionStatus::Uninitialized,
            session_id: String::new(),
            active_room: None,
            board_data_map: HashMap::new(),
        }
    }
}

impl State {
    /// Apply an authoritative server event to the mirror, and to the surface
    /// when the event concerns the active room.
    pub fn handle_server_event<S: CanvasSurface>(&mut self, event: &Event, surface: &mut S) {
        match event {
            Event::Connected(event) => {
                self.session_id = event.session_id.clone();
            }
            Event::InitState(event) => {
                self.apply_snapshot(&event.room_id, &event.drawings, event.current_index, surface);
            }
            Event::UpdateState(event) => {
                self.apply_snapshot(&event.room_id, &event.drawings, event.current_index, surface);
            }
            Event::DrawLine(event) => {
                let own_echo = event.session_id == self.session_id;
                let is_active = self.is_active(&event.room_id);

                if let Some(board) = self.board_data_map.get_mut(&event.room_id) {
                    // a confirmed append discards any redo candidates, in
                    // lock-step with the server-side history
                    board.drawings.truncate(board.visible_len());
                    board.drawings.push(event.segment.clone());
                    board.current_index = event.current_index;

                    if own_echo && board.in_flight > 0 {
                        // already on the surface from the optimistic draw
                        board.in_flight -= 1;
                    } else if is_active {
                        // appends never alter earlier indices, so a single
                        // incremental draw is enough
                        surface.draw_segment(&event.segment);
                    }
                }
            }
            Event::BoardCleared(event) => {
                if let Some(board) = self.board_data_map.get_mut(&event.room_id) {
                    board.drawings.clear();
                    board.current_index = -1;
                    board.in_flight = 0;
                }

                if self.is_active(&event.room_id) {
                    surface.clear();
                }
            }
        }
    }

    /// Optimistically draw a local stroke before the server confirms it.
    /// Returns false when there is no active joined room to draw into, in
    /// which case nothing was drawn and no command should be sent.
    pub fn draw_local<S: CanvasSurface>(&mut self, segment: &Segment, surface: &mut S) -> bool {
        let Some(room_id) = self.active_room.as_ref() else {
            return false;
        };
        let Some(board) = self.board_data_map.get_mut(room_id) else {
            return false;
        };
        if !board.has_joined {
            return false;
        }

        board.in_flight += 1;
        surface.draw_segment(segment);

        true
    }

    /// Make `room_id` the active room, creating an empty local mirror when
    /// the room is not known yet, and rebuild the surface from its mirrored
    /// state. Returns whether the session has already joined the room.
    pub fn set_active_room<S: CanvasSurface>(&mut self, room_id: &str, surface: &mut S) -> bool {
        let board = self
            .board_data_map
            .entry(String::from(room_id))
            .or_default();
        self.active_room = Some(String::from(room_id));

        Self::redraw(board, surface);

        board.has_joined
    }

    /// Drop the local mirror for a room being left. When the room was the
    /// one on display the surface is wiped as well.
    pub fn forget_room<S: CanvasSurface>(&mut self, room_id: &str, surface: &mut S) {
        self.board_data_map.remove(room_id);

        if self.is_active(room_id) {
            self.active_room = None;
            surface.clear();
        }
    }

    pub fn can_undo(&self) -> bool {
        self.active_board().map_or(false, BoardData::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.active_board().map_or(false, BoardData::can_redo)
    }

    pub fn mark_connection_request_start(&mut self) {
        self.server_connection_status = ServerConnectionStatus::Connecting;
    }

    /// Processes the result of a connection request to change the state of the application
    pub fn process_connection_request_result(&mut self, result: anyhow::Result<String>) {
        self.server_connection_status = match result {
            Ok(addr) => ServerConnectionStatus::Connected { addr },
            Err(err) => ServerConnectionStatus::Errored {
                err: err.to_string(),
            },
        }
    }

    fn active_board(&self) -> Option<&BoardData> {
        self.active_room
            .as_ref()
            .and_then(|room_id| self.board_data_map.get(room_id))
    }

    fn is_active(&self, room_id: &str) -> bool {
        self.active_room.as_deref() == Some(room_id)
    }

    fn apply_snapshot<S: CanvasSurface>(
        &mut self,
        room_id: &str,
        drawings: &[Segment],
        current_index: i64,
        surface: &mut S,
    ) {
        let is_active = self.is_active(room_id);
        let board = self
            .board_data_map
            .entry(String::from(room_id))
            .or_default();

        board.has_joined = true;
        board.drawings = drawings.to_vec();
        board.current_index = current_index;
        // a full snapshot supersedes any optimistic strokes still awaiting
        // their echo; a late echo is then drawn on arrival, an idempotent
        // overdraw of identical pixels. Per-room broadcast ordering means an
        // echo can never arrive after a snapshot that already contains it.
        board.in_flight = 0;

        if is_active {
            Self::redraw(board, surface);
        }
    }

    /// Wipe the surface and redraw every visible segment in log order. The
    /// only correctness-preserving strategy after a cursor move, since a
    /// draw-after-undo can replace segments at already-rendered indices.
    fn redraw<S: CanvasSurface>(board: &BoardData, surface: &mut S) {
        surface.clear();

        for segment in board.drawings.iter().take(board.visible_len()) {
            surface.draw_segment(segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comms::event::{
        BoardClearedBroadcastEvent, ConnectedReplyEvent, InitStateReplyEvent,
        SegmentDrawnBroadcastEvent, UpdateStateBroadcastEvent,
    };

    use crate::surface::RecordingSurface;

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

    // a state connected as "me" with "room-1" active and joined
    fn joined_state(surface: &mut RecordingSurface) -> State {
        let mut state = State::default();
        state.handle_server_event(
            &Event::Connected(ConnectedReplyEvent {
                session_id: "me".to_string(),
            }),
            surface,
        );
        state.set_active_room("room-1", surface);
        state.handle_server_event(
            &Event::InitState(InitStateReplyEvent {
                room_id: "room-1".to_string(),
                drawings: Vec::new(),
                current_index: -1,
            }),
            surface,
        );

        state
    }

    fn draw_line_event(session_id: &str, current_index: i64, label: f64) -> Event {
        Event::DrawLine(SegmentDrawnBroadcastEvent {
            room_id: "room-1".to_string(),
            session_id: session_id.to_string(),
            current_index,
            segment: segment(label),
        })
    }

    #[test]
    fn test_init_state_redraws_visible_prefix_in_order() {
        let mut surface = RecordingSurface::new();
        let mut state = State::default();
        state.set_active_room("room-1", &mut surface);

        state.handle_server_event(
            &Event::InitState(InitStateReplyEvent {
                room_id: "room-1".to_string(),
                drawings: vec![segment(1.0), segment(2.0), segment(3.0)],
                current_index: 1,
            }),
            &mut surface,
        );

        // the redo candidate beyond the cursor is mirrored but not drawn
        assert_eq!(surface.visible(), vec![segment(1.0), segment(2.0)]);
        assert_eq!(state.board_data_map["room-1"].drawings.len(), 3);
        assert!(state.board_data_map["room-1"].has_joined);
    }

    #[test]
    fn test_remote_draw_is_applied_incrementally() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);
        let ops_before = surface.ops().len();

        state.handle_server_event(&draw_line_event("someone-else", 0, 1.0), &mut surface);

        // exactly one draw call, no full rebuild
        assert_eq!(surface.ops().len(), ops_before + 1);
        assert_eq!(surface.visible(), vec![segment(1.0)]);
        assert_eq!(state.board_data_map["room-1"].current_index, 0);
    }

    #[test]
    fn test_own_echo_is_not_double_drawn() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        assert!(state.draw_local(&segment(1.0), &mut surface));
        assert_eq!(surface.visible(), vec![segment(1.0)]);

        let ops_before = surface.ops().len();
        state.handle_server_event(&draw_line_event("me", 0, 1.0), &mut surface);

        // the echo only reconciles the mirror, the surface is untouched
        assert_eq!(surface.ops().len(), ops_before);
        assert_eq!(surface.visible(), vec![segment(1.0)]);
        assert_eq!(state.board_data_map["room-1"].drawings, vec![segment(1.0)]);
    }

    #[test]
    fn test_other_sessions_echo_is_drawn() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        assert!(state.draw_local(&segment(1.0), &mut surface));
        // another member's stroke was serialized before ours
        state.handle_server_event(&draw_line_event("someone-else", 0, 2.0), &mut surface);
        state.handle_server_event(&draw_line_event("me", 1, 1.0), &mut surface);

        assert_eq!(surface.visible(), vec![segment(1.0), segment(2.0)]);
        assert_eq!(
            state.board_data_map["room-1"].drawings,
            vec![segment(2.0), segment(1.0)]
        );
    }

    #[test]
    fn test_update_state_rebuilds_the_surface() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        state.handle_server_event(&draw_line_event("someone-else", 0, 1.0), &mut surface);
        state.handle_server_event(&draw_line_event("someone-else", 1, 2.0), &mut surface);

        // an undo happened on the server, B becomes a redo candidate
        state.handle_server_event(
            &Event::UpdateState(UpdateStateBroadcastEvent {
                room_id: "room-1".to_string(),
                drawings: vec![segment(1.0), segment(2.0)],
                current_index: 0,
            }),
            &mut surface,
        );

        assert_eq!(surface.visible(), vec![segment(1.0)]);
        assert!(state.can_undo());
        assert!(state.can_redo());
    }

    #[test]
    fn test_draw_after_undo_truncates_the_mirror() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        state.handle_server_event(&draw_line_event("someone-else", 0, 1.0), &mut surface);
        state.handle_server_event(&draw_line_event("someone-else", 1, 2.0), &mut surface);
        state.handle_server_event(
            &Event::UpdateState(UpdateStateBroadcastEvent {
                room_id: "room-1".to_string(),
                drawings: vec![segment(1.0), segment(2.0)],
                current_index: 0,
            }),
            &mut surface,
        );

        // a new stroke arrives, discarding the redo candidate
        state.handle_server_event(&draw_line_event("someone-else", 1, 3.0), &mut surface);

        assert_eq!(
            state.board_data_map["room-1"].drawings,
            vec![segment(1.0), segment(3.0)]
        );
        assert_eq!(surface.visible(), vec![segment(1.0), segment(3.0)]);
        assert!(!state.can_redo());
    }

    #[test]
    fn test_board_cleared_resets_everything() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        state.handle_server_event(&draw_line_event("someone-else", 0, 1.0), &mut surface);
        state.handle_server_event(
            &Event::BoardCleared(BoardClearedBroadcastEvent {
                room_id: "room-1".to_string(),
            }),
            &mut surface,
        );

        assert_eq!(surface.visible(), Vec::<Segment>::new());
        assert_eq!(state.board_data_map["room-1"].drawings.len(), 0);
        assert_eq!(state.board_data_map["room-1"].current_index, -1);
        assert!(!state.can_undo());
        assert!(!state.can_redo());
    }

    #[test]
    fn test_undo_redo_hints_on_fresh_room() {
        let mut surface = RecordingSurface::new();
        let state = joined_state(&mut surface);

        assert!(!state.can_undo());
        assert!(!state.can_redo());
    }

    #[test]
    fn test_draw_local_requires_a_joined_active_room() {
        let mut surface = RecordingSurface::new();
        let mut state = State::default();

        // no active room at all
        assert!(!state.draw_local(&segment(1.0), &mut surface));

        // active but not joined yet
        state.set_active_room("room-1", &mut surface);
        assert!(!state.draw_local(&segment(1.0), &mut surface));

        assert_eq!(surface.visible(), Vec::<Segment>::new());
    }

    #[test]
    fn test_snapshot_resets_the_in_flight_counter() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        assert!(state.draw_local(&segment(1.0), &mut surface));

        // a full snapshot not containing the stroke arrives first
        state.handle_server_event(
            &Event::UpdateState(UpdateStateBroadcastEvent {
                room_id: "room-1".to_string(),
                drawings: Vec::new(),
                current_index: -1,
            }),
            &mut surface,
        );
        assert_eq!(surface.visible(), Vec::<Segment>::new());

        // the late echo is drawn normally, restoring the wiped stroke
        state.handle_server_event(&draw_line_event("me", 0, 1.0), &mut surface);
        assert_eq!(surface.visible(), vec![segment(1.0)]);
    }

    #[test]
    fn test_forget_room_wipes_the_active_surface() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        state.handle_server_event(&draw_line_event("someone-else", 0, 1.0), &mut surface);
        state.forget_room("room-1", &mut surface);

        assert_eq!(surface.visible(), Vec::<Segment>::new());
        assert!(state.active_room.is_none());
        assert!(!state.board_data_map.contains_key("room-1"));
    }

    #[test]
    fn test_events_for_inactive_rooms_do_not_touch_the_surface() {
        let mut surface = RecordingSurface::new();
        let mut state = joined_state(&mut surface);

        state.handle_server_event(
            &Event::InitState(InitStateReplyEvent {
                room_id: "room-2".to_string(),
                drawings: vec![segment(9.0)],
                current_index: 0,
            }),
            &mut surface,
        );

        assert_eq!(surface.visible(), Vec::<Segment>::new());

        // switching rooms rebuilds the surface from the other mirror
        state.set_active_room("room-2", &mut surface);
        assert_eq!(surface.visible(), vec![segment(9.0)]);
    }
}

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// The session has been accepted by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedReplyEvent {
    /// The id assigned to this connection. Clients compare it against the
    /// origin of `draw_line` broadcasts to recognize echoes of their own
    /// optimistically drawn strokes.
    pub session_id: String,
}

/// The full authoritative state of a room, sent to a single session right
/// after it joins the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitStateReplyEvent {
    /// The id of the joined room
    pub room_id: String,
    /// The full segment log, redo candidates included
    pub drawings: Vec<Segment>,
    /// Index of the last visible segment, -1 for an empty canvas
    pub current_index: i64,
}

/// A segment has been appended to a room's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDrawnBroadcastEvent {
    /// The id of the room the segment was drawn into
    pub room_id: String,
    /// The session that drew the segment
    pub session_id: String,
    /// The cursor after the append, always the index of this segment
    pub current_index: i64,
    /// The appended segment, flattened to the flat wire shape
    #[serde(flatten)]
    pub segment: Segment,
}

/// The full authoritative state of a room, broadcast after any operation
/// that moved the cursor without appending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStateBroadcastEvent {
    /// The id of the room whose cursor moved
    pub room_id: String,
    /// The full segment log, redo candidates included
    pub drawings: Vec<Segment>,
    /// Index of the last visible segment, -1 for an empty canvas
    pub current_index: i64,
}

/// A room's log has been hard-reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardClearedBroadcastEvent {
    /// The id of the cleared room
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
/// Events that can be sent to the client
/// Events may relate to any of the rooms a session has joined, the recipient is a single session
pub enum Event {
    Connected(ConnectedReplyEvent),
    InitState(InitStateReplyEvent),
    DrawLine(SegmentDrawnBroadcastEvent),
    UpdateState(UpdateStateBroadcastEvent),
    BoardCleared(BoardClearedBroadcastEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment {
            start_x: 1.0,
            start_y: 2.0,
            end_x: 3.0,
            end_y: 4.0,
            color: "#000000".to_string(),
            brush_size: 5.0,
        }
    }

    // given an event enum, and an expect string, asserts that event is serialized / deserialized appropiately
    fn assert_event_serialization(event: &Event, expected: &str) {
        let serialized = serde_json::to_string(&event).unwrap();
        assert_eq!(serialized, expected);
        let deserialized: Event = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, *event);
    }

    #[test]
    fn test_connected_event() {
        let event = Event::Connected(ConnectedReplyEvent {
            session_id: "session-1".to_string(),
        });

        assert_event_serialization(&event, r#"{"t":"connected","session_id":"session-1"}"#);
    }

    #[test]
    fn test_init_state_event() {
        let event = Event::InitState(InitStateReplyEvent {
            room_id: "test".to_string(),
            drawings: vec![segment()],
            current_index: 0,
        });

        assert_event_serialization(
            &event,
            r##"{"t":"init_state","room_id":"test","drawings":[{"startX":1.0,"startY":2.0,"endX":3.0,"endY":4.0,"color":"#000000","brushSize":5.0}],"current_index":0}"##,
        );
    }

    #[test]
    fn test_draw_line_event() {
        let event = Event::DrawLine(SegmentDrawnBroadcastEvent {
            room_id: "test".to_string(),
            session_id: "session-1".to_string(),
            current_index: 0,
            segment: segment(),
        });

        assert_event_serialization(
            &event,
            r##"{"t":"draw_line","room_id":"test","session_id":"session-1","current_index":0,"startX":1.0,"startY":2.0,"endX":3.0,"endY":4.0,"color":"#000000","brushSize":5.0}"##,
        );
    }

    #[test]
    fn test_update_state_event() {
        let event = Event::UpdateState(UpdateStateBroadcastEvent {
            room_id: "test".to_string(),
            drawings: vec![segment()],
            current_index: -1,
        });

        assert_event_serialization(
            &event,
            r##"{"t":"update_state","room_id":"test","drawings":[{"startX":1.0,"startY":2.0,"endX":3.0,"endY":4.0,"color":"#000000","brushSize":5.0}],"current_index":-1}"##,
        );
    }

    #[test]
    fn test_board_cleared_event() {
        let event = Event::BoardCleared(BoardClearedBroadcastEvent {
            room_id: "test".to_string(),
        });

        assert_event_serialization(&event, r#"{"t":"board_cleared","room_id":"test"}"#);
    }
}

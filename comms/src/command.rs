use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// User Command for joining a board room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoomCommand {
    // The room to join.
    pub room_id: String,
}

/// User Command for leaving a board room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRoomCommand {
    // The room to leave.
    pub room_id: String,
}

/// User Command for appending a drawn segment to a room's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawLineCommand {
    // The room to draw into.
    pub room_id: String,
    // The drawn segment, flattened so the payload stays a single flat
    // `{room_id, startX, ...}` object.
    #[serde(flatten)]
    pub segment: Segment,
}

/// User Command signalling the end of a stroke, requesting a full resync
/// broadcast for the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteDrawingCommand {
    pub room_id: String,
}

/// User Command requesting an undo of the room's last visible segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoActionCommand {
    pub room_id: String,
}

/// User Command requesting a redo of the room's next hidden segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedoActionCommand {
    pub room_id: String,
}

/// User Command requesting a hard reset of the room's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearBoardCommand {
    pub room_id: String,
}

/// User Command for quitting the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuitCommand;

/// A user command which can be sent to the server by a single user session.
/// All commands are processed in the context of the board server paired with an individual user session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_ct", rename_all = "snake_case")]
pub enum UserCommand {
    JoinRoom(JoinRoomCommand),
    LeaveRoom(LeaveRoomCommand),
    DrawLine(DrawLineCommand),
    CompleteDrawing(CompleteDrawingCommand),
    UndoAction(UndoActionCommand),
    RedoAction(RedoActionCommand),
    ClearBoard(ClearBoardCommand),
    Quit(QuitCommand),
}

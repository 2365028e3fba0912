use comms::segment::Segment;

#[derive(Debug, Clone)]
pub enum Action {
    ConnectToServerRequest { addr: String },
    SelectRoom { room_id: String },
    DrawSegment { segment: Segment },
    CompleteDrawing,
    Undo,
    Redo,
    ClearBoard,
    LeaveRoom { room_id: String },
    Exit,
}

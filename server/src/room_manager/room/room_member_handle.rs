/// [RoomMemberHandle] ties a session's membership in one room back to that
/// room. It is handed out when the session joins and consumed when it
/// leaves, so a membership can only be dropped once.
#[derive(Debug)]
pub struct RoomMemberHandle {
    /// The id of the room which is associated with this handle
    room_id: String,
    /// The session this membership belongs to
    session_id: String,
}

impl RoomMemberHandle {
    pub(super) fn new(room_id: String, session_id: String) -> Self {
        RoomMemberHandle {
            room_id,
            session_id,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

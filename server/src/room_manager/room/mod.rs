mod board_room;
mod history;
mod member_registry;
mod room_member_handle;

pub use self::board_room::BoardRoom;
pub use self::room_member_handle::RoomMemberHandle;

mod room;
#[allow(clippy::module_inception)]
mod room_manager;

pub use self::room::RoomMemberHandle;
pub use self::room_manager::RoomManager;

// Use cases layer: application workflows for the arena server.

pub mod items;
pub mod registry;
pub mod room;
pub mod room_task;
pub mod types;

pub use registry::{RegistrySettings, RoomHandle, RoomRegistry};
pub use room::{Room, RoomSettings};
pub use types::{
    DropRequest, GamePhase, JoinError, LeaveReason, Outbound, RoomEvent, RoomSnapshot,
};

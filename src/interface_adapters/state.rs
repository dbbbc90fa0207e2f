use crate::domain::tuning::RoomTuning;
use crate::interface_adapters::clients::platform::PlatformClient;
use crate::use_cases::RoomRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // The single owner of the room table; all room access goes through it.
    pub registry: Arc<RoomRegistry>,
    // Outbound client for the external arena platform.
    pub platform: Arc<PlatformClient>,
    // Gameplay tuning shared with rooms, used when translating platform
    // drops that arrive without an explicit position.
    pub tuning: RoomTuning,
}

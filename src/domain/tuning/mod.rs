// Gameplay tuning, separate from runtime/server configuration.

pub mod arena;
pub mod combat;
pub mod items;
pub mod player;

pub use arena::ArenaTuning;
pub use combat::CombatTuning;
pub use items::ItemTuning;
pub use player::PlayerTuning;

/// All gameplay tuning a room needs, bundled for easy passing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomTuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub combat: CombatTuning,
    pub items: ItemTuning,
}

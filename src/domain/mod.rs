// Domain layer: core simulation types and rules.

pub mod item;
pub mod state;
pub mod systems;
pub mod tuning;

pub use item::{EquippedShield, EquippedWeapon, ItemOrigin, ItemPayload, Rarity, WorldItem};
pub use state::{ControlFlags, Facing, Fighter, FighterSnapshot, Vec2};

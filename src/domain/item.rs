// World items and equipment. Category-specific payloads are tagged variants
// so equip effects are an exhaustive match, not optional-field probing.

use crate::domain::Vec2;

/// Display weighting only; has no effect on combat math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Who put the item on the arena floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOrigin {
    /// Spawned by the periodic system weapon spawner.
    System,
    /// Dropped through the external arena platform; carries the
    /// contributor identity for display.
    Contributor(String),
}

/// Category payload of a ground item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
    Weapon {
        kind: String,
        /// Added to the fighter's base damage while equipped.
        attack: i32,
        /// Replaces attack range while equipped, when set.
        range: Option<f32>,
        /// Display metadata; the attack cooldown itself is global.
        cooldown_ms: u64,
        rarity: Rarity,
    },
    Shield {
        /// Replaces (not adds to) the fighter's defense while equipped.
        defense: i32,
    },
    Consumable {
        heal: i32,
        /// Multiplier applied to move speed for `duration_ms`.
        speed_boost: f32,
        duration_ms: u64,
    },
}

impl ItemPayload {
    /// Short category tag used in item id construction and logs.
    pub fn category(&self) -> &'static str {
        match self {
            ItemPayload::Weapon { .. } => "weapon",
            ItemPayload::Shield { .. } => "shield",
            ItemPayload::Consumable { .. } => "consumable",
        }
    }
}

/// An item lying on the arena floor, owned by the room until picked up.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldItem {
    /// Unique within the room's lifetime.
    pub id: String,
    pub name: String,
    pub pos: Vec2,
    pub payload: ItemPayload,
    pub icon: String,
    pub origin: ItemOrigin,
    /// Unix epoch milliseconds at spawn time.
    pub created_at_ms: u64,
}

/// Weapon reference held by a fighter after pickup; the source world item
/// no longer exists in the ground mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct EquippedWeapon {
    pub item_id: String,
    pub name: String,
    pub kind: String,
    pub attack: i32,
    pub range: Option<f32>,
    pub cooldown_ms: u64,
    pub rarity: Rarity,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquippedShield {
    pub item_id: String,
    pub name: String,
    pub defense: i32,
    pub icon: String,
}

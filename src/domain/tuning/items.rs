// Gameplay tuning for world items: spawn cadence, pickup reach and the
// system weapon pool.

use crate::domain::Vec2;
use crate::domain::item::Rarity;
use std::time::Duration;

/// Static definition of a spawnable weapon.
#[derive(Debug, Clone, Copy)]
pub struct WeaponDef {
    pub name: &'static str,
    pub kind: &'static str,
    /// Added on top of the fighter's base damage while equipped.
    pub attack: i32,
    /// Replaces the fighter's attack range while equipped, when set.
    pub range: Option<f32>,
    /// Display metadata only; the attack cooldown itself is global.
    pub cooldown_ms: u64,
    pub rarity: Rarity,
    pub icon: &'static str,
}

/// Weapons the periodic system spawner picks from uniformly.
pub const COMMON_WEAPONS: [WeaponDef; 4] = [
    WeaponDef {
        name: "Rusty Sword",
        kind: "sword",
        attack: 15,
        range: None,
        cooldown_ms: 800,
        rarity: Rarity::Common,
        icon: "sword",
    },
    WeaponDef {
        name: "Hand Axe",
        kind: "axe",
        attack: 20,
        range: None,
        cooldown_ms: 900,
        rarity: Rarity::Common,
        icon: "axe",
    },
    WeaponDef {
        name: "Short Spear",
        kind: "spear",
        attack: 12,
        range: Some(90.0),
        cooldown_ms: 800,
        rarity: Rarity::Rare,
        icon: "spear",
    },
    WeaponDef {
        name: "Twin Daggers",
        kind: "dagger",
        attack: 8,
        range: Some(45.0),
        cooldown_ms: 500,
        rarity: Rarity::Rare,
        icon: "dagger",
    },
];

/// The single rarest weapon, selected by the low-probability override
/// regardless of the common pool.
pub const RARE_WEAPON: WeaponDef = WeaponDef {
    name: "Starfall Blade",
    kind: "greatsword",
    attack: 40,
    range: Some(75.0),
    cooldown_ms: 1000,
    rarity: Rarity::Legendary,
    icon: "greatsword",
};

#[derive(Debug, Clone, Copy)]
pub struct ItemTuning {
    /// Transfer distance for both auto and manual pickup.
    pub pickup_radius: f32,

    /// Period between system weapon spawns while a match runs.
    pub spawn_interval: Duration,

    /// Chance that a system spawn yields the rare weapon instead of a
    /// common pool pick; evaluated independently each spawn.
    pub rare_override_chance: f64,

    /// Arena-safe coordinates used when no explicit drop position is given.
    pub spawn_points: [Vec2; 4],
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            pickup_radius: 50.0,
            spawn_interval: Duration::from_secs(15),
            rare_override_chance: 0.05,
            spawn_points: [
                Vec2::new(200.0, 520.0),
                Vec2::new(350.0, 520.0),
                Vec2::new(450.0, 520.0),
                Vec2::new(600.0, 520.0),
            ],
        }
    }
}

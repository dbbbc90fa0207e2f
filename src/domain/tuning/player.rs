// Gameplay tuning for fighters. Keep this separate from runtime/server
// configuration (channel sizes, ports, etc.).

use crate::domain::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Health assigned on spawn; also the heal clamp ceiling.
    pub max_health: i32,

    /// Unarmed attack damage before defense is applied.
    pub base_damage: i32,

    /// Unarmed attack reach in pixels.
    pub base_range: f32,

    /// Defense with no shield equipped.
    pub base_defense: i32,

    /// Spawn points by join order: first joiner left, second right.
    pub spawn_points: [Vec2; 2],
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            base_damage: 10,
            base_range: 60.0,
            base_defense: 0,
            spawn_points: [Vec2::new(150.0, 520.0), Vec2::new(650.0, 520.0)],
        }
    }
}

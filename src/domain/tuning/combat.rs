// Gameplay tuning for melee combat resolution.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct CombatTuning {
    /// Minimum wait between two attacks by the same fighter.
    pub attack_cooldown: Duration,

    /// How long the attacking pose is held before it clears.
    pub attack_clear_delay: Duration,

    /// Horizontal knockback distance in pixels, away from the attacker.
    pub knockback_push: f32,

    /// Upward lift applied together with the horizontal push.
    pub knockback_lift: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            attack_cooldown: Duration::from_millis(800),
            attack_clear_delay: Duration::from_millis(300),
            knockback_push: 60.0,
            knockback_lift: 20.0,
        }
    }
}

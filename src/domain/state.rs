// Domain-level simulation types: fighters, their derived combat stats and
// the snapshot forms broadcast to clients.

use crate::domain::item::{EquippedShield, EquippedWeapon};
use crate::domain::tuning::PlayerTuning;
use std::time::{Duration, Instant};

/// 2D point/vector in arena pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Directional input flags reported with each move event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlFlags {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// One connected player inside a room, owned exclusively by that room.
#[derive(Debug, Clone)]
pub struct Fighter {
    /// Connection id; doubles as the player id on the wire.
    pub id: u64,
    pub name: String,
    /// Which of the two spawn points this fighter took (0 left, 1 right).
    pub spawn_slot: usize,

    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    pub grounded: bool,

    pub health: i32,
    pub max_health: i32,
    pub alive: bool,

    pub is_attacking: bool,
    pub last_attack_at: Option<Instant>,
    /// Explicit ready signal for the pre-match fast start.
    pub ready: bool,

    pub weapon: Option<EquippedWeapon>,
    pub shield: Option<EquippedShield>,

    // Derived combat stats; defaults come from tuning, equipment overrides.
    pub attack_damage: i32,
    pub attack_range: f32,
    pub defense: i32,
    pub speed_multiplier: f32,
    /// Pending revert deadline for an active speed consumable. A later
    /// pickup overwrites this, so effects never stack.
    pub speed_reset_at: Option<Instant>,
}

impl Fighter {
    /// Spawns a fresh fighter on the given side with base stats.
    pub fn spawn(id: u64, name: String, spawn_slot: usize, tuning: &PlayerTuning) -> Self {
        let pos = tuning.spawn_points[spawn_slot.min(tuning.spawn_points.len() - 1)];
        Self {
            id,
            name,
            spawn_slot,
            pos,
            vel: Vec2::new(0.0, 0.0),
            facing: if spawn_slot == 0 {
                Facing::Right
            } else {
                Facing::Left
            },
            grounded: true,
            health: tuning.max_health,
            max_health: tuning.max_health,
            alive: true,
            is_attacking: false,
            last_attack_at: None,
            ready: false,
            weapon: None,
            shield: None,
            attack_damage: tuning.base_damage,
            attack_range: tuning.base_range,
            defense: tuning.base_defense,
            speed_multiplier: 1.0,
            speed_reset_at: None,
        }
    }

    /// Remaining attack cooldown at `now`; zero once elapsed.
    pub fn cooldown_remaining(&self, now: Instant, cooldown: Duration) -> Duration {
        match self.last_attack_at {
            Some(at) => cooldown.saturating_sub(now.duration_since(at)),
            None => Duration::ZERO,
        }
    }
}

/// Broadcastable view of a fighter. All combat-relevant fields are included
/// so clients can render and predict without extra round trips.
#[derive(Debug, Clone, PartialEq)]
pub struct FighterSnapshot {
    pub id: u64,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub grounded: bool,
    pub health: i32,
    pub max_health: i32,
    pub alive: bool,
    pub is_attacking: bool,
    pub cooldown_remaining_ms: u64,
    pub weapon: Option<EquippedWeapon>,
    pub shield: Option<EquippedShield>,
    pub attack_damage: i32,
    pub attack_range: f32,
    pub defense: i32,
    pub speed_multiplier: f32,
}

impl FighterSnapshot {
    pub fn capture(f: &Fighter, now: Instant, cooldown: Duration) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            x: f.pos.x,
            y: f.pos.y,
            vx: f.vel.x,
            vy: f.vel.y,
            facing: f.facing,
            grounded: f.grounded,
            health: f.health,
            max_health: f.max_health,
            alive: f.alive,
            is_attacking: f.is_attacking,
            cooldown_remaining_ms: f.cooldown_remaining(now, cooldown).as_millis() as u64,
            weapon: f.weapon.clone(),
            shield: f.shield.clone(),
            attack_damage: f.attack_damage,
            attack_range: f.attack_range,
            defense: f.defense,
            speed_multiplier: f.speed_multiplier,
        }
    }
}

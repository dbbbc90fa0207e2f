// Melee combat resolution: directional hit tests, damage with defense,
// knockback placement and the attack cooldown gate.

use crate::domain::systems::physics;
use crate::domain::tuning::{ArenaTuning, CombatTuning};
use crate::domain::{Facing, Fighter, Vec2};
use std::time::Instant;

/// True iff the attacker is mid-swing, the target is alive, and the
/// attacker's reach rectangle overlaps the target's bounding box.
///
/// The reach rectangle is anchored in front of the attacker based on facing
/// and is `attack_range` wide at standard fighter height.
pub fn check_hit(attacker: &Fighter, target: &Fighter, arena: &ArenaTuning) -> bool {
    if !attacker.is_attacking || !target.alive {
        return false;
    }

    let reach = attacker.attack_range;
    let reach_center_x = match attacker.facing {
        Facing::Right => attacker.pos.x + arena.fighter_width / 2.0 + reach / 2.0,
        Facing::Left => attacker.pos.x - arena.fighter_width / 2.0 - reach / 2.0,
    };
    let reach_center = Vec2::new(reach_center_x, attacker.pos.y);
    let reach_size = Vec2::new(reach, arena.fighter_height);
    let target_size = Vec2::new(arena.fighter_width, arena.fighter_height);

    physics::rects_overlap(reach_center, reach_size, target.pos, target_size)
}

/// Damage after defense, never below 1 so armor can't fully negate a hit.
pub fn effective_damage(raw: i32, defense: i32) -> i32 {
    (raw - defense).max(1)
}

/// Applies raw damage to the target and returns the new health. Health is
/// clamped to [0, max_health] and `alive` recomputed.
pub fn apply_damage(target: &mut Fighter, raw: i32) -> i32 {
    let dealt = effective_damage(raw, target.defense);
    target.health = (target.health - dealt).clamp(0, target.max_health);
    target.alive = target.health > 0;
    target.health
}

/// Where knockback places the target: pushed horizontally away from the
/// attacker plus a small lift. Does not clamp to arena bounds; the room
/// re-clamps after applying it.
pub fn knockback_position(attacker: &Fighter, target: &Fighter, combat: &CombatTuning) -> Vec2 {
    let dir = if target.pos.x >= attacker.pos.x {
        1.0
    } else {
        -1.0
    };
    Vec2::new(
        target.pos.x + dir * combat.knockback_push,
        target.pos.y - combat.knockback_lift,
    )
}

/// Pure time comparison; attacks attempted early are dropped, not queued.
pub fn cooldown_elapsed(fighter: &Fighter, now: Instant, combat: &CombatTuning) -> bool {
    match fighter.last_attack_at {
        Some(at) => now.duration_since(at) >= combat.attack_cooldown,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::PlayerTuning;
    use std::time::Duration;

    fn fighter(id: u64, x: f32) -> Fighter {
        let mut f = Fighter::spawn(id, format!("f{id}"), 0, &PlayerTuning::default());
        f.pos = Vec2::new(x, 520.0);
        f
    }

    #[test]
    fn hit_requires_attacking_flag() {
        let arena = ArenaTuning::default();
        let a = fighter(1, 100.0);
        let b = fighter(2, 140.0);
        assert!(!check_hit(&a, &b, &arena));
    }

    #[test]
    fn hit_lands_in_facing_direction_only() {
        let arena = ArenaTuning::default();
        let mut a = fighter(1, 300.0);
        a.is_attacking = true;
        a.facing = Facing::Right;
        let right = fighter(2, 350.0);
        let left = fighter(3, 250.0);
        assert!(check_hit(&a, &right, &arena));
        assert!(!check_hit(&a, &left, &arena));

        a.facing = Facing::Left;
        assert!(!check_hit(&a, &right, &arena));
        assert!(check_hit(&a, &left, &arena));
    }

    #[test]
    fn hit_respects_attack_range() {
        let arena = ArenaTuning::default();
        let mut a = fighter(1, 100.0);
        a.is_attacking = true;
        a.facing = Facing::Right;
        let far = fighter(2, 400.0);
        assert!(!check_hit(&a, &far, &arena));

        a.attack_range = 300.0;
        assert!(check_hit(&a, &far, &arena));
    }

    #[test]
    fn dead_targets_cannot_be_hit() {
        let arena = ArenaTuning::default();
        let mut a = fighter(1, 100.0);
        a.is_attacking = true;
        a.facing = Facing::Right;
        let mut b = fighter(2, 140.0);
        b.health = 0;
        b.alive = false;
        assert!(!check_hit(&a, &b, &arena));
    }

    #[test]
    fn damage_never_drops_below_one() {
        assert_eq!(effective_damage(10, 0), 10);
        assert_eq!(effective_damage(10, 8), 2);
        assert_eq!(effective_damage(10, 50), 1);
    }

    #[test]
    fn apply_damage_clamps_health_and_recomputes_alive() {
        let mut b = fighter(2, 140.0);
        b.health = 5;
        let health = apply_damage(&mut b, 100);
        assert_eq!(health, 0);
        assert!(!b.alive);

        // Further damage keeps health pinned at zero.
        apply_damage(&mut b, 100);
        assert_eq!(b.health, 0);
    }

    #[test]
    fn knockback_pushes_away_from_attacker() {
        let combat = CombatTuning::default();
        let a = fighter(1, 100.0);
        let b = fighter(2, 140.0);
        let pos = knockback_position(&a, &b, &combat);
        assert_eq!(pos.x, 140.0 + combat.knockback_push);
        assert_eq!(pos.y, 520.0 - combat.knockback_lift);

        let pos = knockback_position(&b, &a, &combat);
        assert_eq!(pos.x, 100.0 - combat.knockback_push);
    }

    #[test]
    fn cooldown_gates_by_pure_time_comparison() {
        let combat = CombatTuning::default();
        let mut a = fighter(1, 100.0);
        let t0 = Instant::now();
        assert!(cooldown_elapsed(&a, t0, &combat));

        a.last_attack_at = Some(t0);
        assert!(!cooldown_elapsed(&a, t0 + Duration::from_millis(100), &combat));
        assert!(cooldown_elapsed(&a, t0 + combat.attack_cooldown, &combat));
    }
}

// Pure, stateless spatial helpers shared by the authoritative room and the
// reference client's local prediction. Constants live in ArenaTuning and
// must stay identical on both sides to avoid visible desync.

use crate::domain::Vec2;
use crate::domain::tuning::ArenaTuning;

/// Axis-aligned overlap test between two rectangles given by center + size.
pub fn rects_overlap(a_center: Vec2, a_size: Vec2, b_center: Vec2, b_size: Vec2) -> bool {
    (a_center.x - b_center.x).abs() * 2.0 <= a_size.x + b_size.x
        && (a_center.y - b_center.y).abs() * 2.0 <= a_size.y + b_size.y
}

pub fn distance(a: Vec2, b: Vec2) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Gravity integration for an airborne body: accelerates downward and
/// advances the position by the (new) velocity.
pub fn integrate_gravity(pos: &mut Vec2, vel: &mut Vec2, dt: f32, arena: &ArenaTuning) {
    vel.y += arena.gravity * dt;
    pos.x += vel.x * dt;
    pos.y += vel.y * dt;
}

/// Clamps a body to the ground plane. Returns the new grounded flag; landing
/// zeroes the vertical velocity.
pub fn settle_on_ground(pos: &mut Vec2, vel: &mut Vec2, arena: &ArenaTuning) -> bool {
    if pos.y >= arena.ground_y {
        pos.y = arena.ground_y;
        vel.y = 0.0;
        true
    } else {
        false
    }
}

/// Horizontal friction while grounded: decay per tick, snapped to zero below
/// the epsilon so fighters come to a full stop.
pub fn apply_friction(vel: &mut Vec2, arena: &ArenaTuning) {
    vel.x *= arena.friction;
    if vel.x.abs() < arena.friction_epsilon {
        vel.x = 0.0;
    }
}

/// Horizontal clamp keeping the whole fighter box inside the arena.
pub fn clamp_to_bounds(pos: &mut Vec2, arena: &ArenaTuning) {
    let half = arena.fighter_width / 2.0;
    pos.x = pos.x.clamp(half, arena.width - half);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ArenaTuning {
        ArenaTuning::default()
    }

    #[test]
    fn overlapping_rects_detected() {
        let size = Vec2::new(40.0, 80.0);
        assert!(rects_overlap(
            Vec2::new(100.0, 520.0),
            size,
            Vec2::new(130.0, 520.0),
            size
        ));
        assert!(!rects_overlap(
            Vec2::new(100.0, 520.0),
            size,
            Vec2::new(200.0, 520.0),
            size
        ));
    }

    #[test]
    fn touching_edges_count_as_overlap() {
        let size = Vec2::new(40.0, 80.0);
        assert!(rects_overlap(
            Vec2::new(100.0, 520.0),
            size,
            Vec2::new(140.0, 520.0),
            size
        ));
    }

    #[test]
    fn distance_is_euclidean() {
        let d = distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn gravity_accelerates_downward() {
        let mut pos = Vec2::new(100.0, 400.0);
        let mut vel = Vec2::new(0.0, 0.0);
        integrate_gravity(&mut pos, &mut vel, 0.1, &arena());
        assert!(vel.y > 0.0);
        assert!(pos.y > 400.0);
    }

    #[test]
    fn landing_zeroes_vertical_velocity() {
        let mut pos = Vec2::new(100.0, 530.0);
        let mut vel = Vec2::new(10.0, 50.0);
        let grounded = settle_on_ground(&mut pos, &mut vel, &arena());
        assert!(grounded);
        assert_eq!(pos.y, 520.0);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn airborne_body_stays_airborne() {
        let mut pos = Vec2::new(100.0, 300.0);
        let mut vel = Vec2::new(0.0, 10.0);
        assert!(!settle_on_ground(&mut pos, &mut vel, &arena()));
        assert_eq!(pos.y, 300.0);
    }

    #[test]
    fn friction_snaps_small_speeds_to_zero() {
        let mut vel = Vec2::new(1.0, 0.0);
        apply_friction(&mut vel, &arena());
        assert_eq!(vel.x, 0.0);

        let mut vel = Vec2::new(100.0, 0.0);
        apply_friction(&mut vel, &arena());
        assert!((vel.x - 85.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_clamp_keeps_fighter_box_inside() {
        let a = arena();
        let mut pos = Vec2::new(-50.0, 520.0);
        clamp_to_bounds(&mut pos, &a);
        assert_eq!(pos.x, 20.0);

        let mut pos = Vec2::new(10_000.0, 520.0);
        clamp_to_bounds(&mut pos, &a);
        assert_eq!(pos.x, 780.0);
    }
}

// Item lifecycle: system weapon spawning, pickup eligibility and the
// category-specific transfer effects applied to a fighter.

use crate::domain::item::{EquippedShield, EquippedWeapon, ItemOrigin, ItemPayload, WorldItem};
use crate::domain::systems::physics;
use crate::domain::tuning::items::WeaponDef;
use crate::domain::tuning::{ItemTuning, PlayerTuning};
use crate::domain::{Fighter, Vec2};
use rand::Rng;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds for item creation stamps.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Builds an item id unique within any room's lifetime. Timestamp-based with
/// a monotonic counter so same-instant spawns cannot collide.
pub fn allocate_item_id(category: &str, name: &str) -> String {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    let nonce = counter.fetch_add(1, Ordering::Relaxed);
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("{category}-{slug}-{nonce}")
}

/// Materializes a weapon definition into a ground item at `pos`.
pub fn weapon_item(def: &WeaponDef, pos: Vec2, origin: ItemOrigin) -> WorldItem {
    WorldItem {
        id: allocate_item_id("weapon", def.name),
        name: def.name.to_string(),
        pos,
        payload: ItemPayload::Weapon {
            kind: def.kind.to_string(),
            attack: def.attack,
            range: def.range,
            cooldown_ms: def.cooldown_ms,
            rarity: def.rarity,
        },
        icon: def.icon.to_string(),
        origin,
        created_at_ms: unix_millis(),
    }
}

/// Picks the next system-spawned weapon: uniform over the common pool, with
/// a small independent chance of the single rarest weapon instead. Spawn
/// position is a uniform choice among the configured arena-safe points
/// unless an explicit position is supplied.
pub fn spawn_system_weapon<R: Rng>(
    rng: &mut R,
    tuning: &ItemTuning,
    explicit_pos: Option<Vec2>,
) -> WorldItem {
    use crate::domain::tuning::items::{COMMON_WEAPONS, RARE_WEAPON};

    let def = if rng.gen_bool(tuning.rare_override_chance) {
        &RARE_WEAPON
    } else {
        &COMMON_WEAPONS[rng.gen_range(0..COMMON_WEAPONS.len())]
    };
    let pos = explicit_pos
        .unwrap_or_else(|| tuning.spawn_points[rng.gen_range(0..tuning.spawn_points.len())]);
    weapon_item(def, pos, ItemOrigin::System)
}

/// Ground item ids within pickup reach of `pos`, by Euclidean distance.
pub fn items_in_range(
    pos: Vec2,
    items: &HashMap<String, WorldItem>,
    tuning: &ItemTuning,
) -> Vec<String> {
    items
        .values()
        .filter(|item| physics::distance(pos, item.pos) <= tuning.pickup_radius)
        .map(|item| item.id.clone())
        .collect()
}

/// What a transfer did, so the room knows what to broadcast and schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum PickupOutcome {
    /// Weapon or shield now occupies the fighter's equipped slot.
    Equipped,
    /// Consumable applied immediately; carries the speed revert deadline
    /// when the effect was a timed boost.
    Consumed { speed_reset_at: Option<Instant> },
}

/// Transfers a ground item onto a fighter. The caller removes the item from
/// the ground mapping; this only applies the category effect.
pub fn apply_pickup(
    fighter: &mut Fighter,
    item: &WorldItem,
    base: &PlayerTuning,
    now: Instant,
) -> PickupOutcome {
    match &item.payload {
        ItemPayload::Weapon {
            kind,
            attack,
            range,
            cooldown_ms,
            rarity,
        } => {
            fighter.weapon = Some(EquippedWeapon {
                item_id: item.id.clone(),
                name: item.name.clone(),
                kind: kind.clone(),
                attack: *attack,
                range: *range,
                cooldown_ms: *cooldown_ms,
                rarity: *rarity,
                icon: item.icon.clone(),
            });
            fighter.attack_damage = base.base_damage + attack;
            fighter.attack_range = range.unwrap_or(base.base_range);
            PickupOutcome::Equipped
        }
        ItemPayload::Shield { defense } => {
            fighter.shield = Some(EquippedShield {
                item_id: item.id.clone(),
                name: item.name.clone(),
                defense: *defense,
                icon: item.icon.clone(),
            });
            // Shield defense replaces the base value, it is not additive.
            fighter.defense = *defense;
            PickupOutcome::Equipped
        }
        ItemPayload::Consumable {
            heal,
            speed_boost,
            duration_ms,
        } => {
            if *heal > 0 {
                fighter.health = (fighter.health + heal).clamp(0, fighter.max_health);
            }
            let mut reset_at = None;
            if *speed_boost != 1.0 && *duration_ms > 0 {
                fighter.speed_multiplier = *speed_boost;
                let deadline = now + std::time::Duration::from_millis(*duration_ms);
                // Overwrites any pending revert; effects do not stack.
                fighter.speed_reset_at = Some(deadline);
                reset_at = Some(deadline);
            }
            PickupOutcome::Consumed {
                speed_reset_at: reset_at,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::items::{COMMON_WEAPONS, RARE_WEAPON};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn fighter() -> Fighter {
        Fighter::spawn(1, "alice".into(), 0, &PlayerTuning::default())
    }

    #[test]
    fn item_ids_are_unique_and_slugged() {
        let a = allocate_item_id("weapon", "Rusty Sword");
        let b = allocate_item_id("weapon", "Rusty Sword");
        assert_ne!(a, b);
        assert!(a.starts_with("weapon-rusty-sword-"));
    }

    #[test]
    fn system_spawn_comes_from_pool_at_configured_point() {
        let tuning = ItemTuning::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let item = spawn_system_weapon(&mut rng, &tuning, None);
            let known = COMMON_WEAPONS
                .iter()
                .chain(std::iter::once(&RARE_WEAPON))
                .any(|def| def.name == item.name);
            assert!(known, "spawned unknown weapon {}", item.name);
            assert!(tuning.spawn_points.contains(&item.pos));
            assert_eq!(item.origin, ItemOrigin::System);
        }
    }

    #[test]
    fn explicit_position_wins_over_spawn_points() {
        let tuning = ItemTuning::default();
        let mut rng = StdRng::seed_from_u64(7);
        let pos = Vec2::new(123.0, 456.0);
        let item = spawn_system_weapon(&mut rng, &tuning, Some(pos));
        assert_eq!(item.pos, pos);
    }

    #[test]
    fn range_filter_uses_pickup_radius() {
        let tuning = ItemTuning::default();
        let mut rng = StdRng::seed_from_u64(1);
        let near = spawn_system_weapon(&mut rng, &tuning, Some(Vec2::new(100.0, 520.0)));
        let far = spawn_system_weapon(&mut rng, &tuning, Some(Vec2::new(400.0, 520.0)));
        let mut items = HashMap::new();
        items.insert(near.id.clone(), near.clone());
        items.insert(far.id.clone(), far);

        let hits = items_in_range(Vec2::new(110.0, 520.0), &items, &tuning);
        assert_eq!(hits, vec![near.id]);
    }

    #[test]
    fn weapon_pickup_overrides_damage_and_range() {
        let base = PlayerTuning::default();
        let mut f = fighter();
        let def = WeaponDef {
            name: "Test Spear",
            kind: "spear",
            attack: 25,
            range: Some(90.0),
            cooldown_ms: 800,
            rarity: crate::domain::Rarity::Common,
            icon: "spear",
        };
        let item = weapon_item(&def, Vec2::new(150.0, 520.0), ItemOrigin::System);

        let outcome = apply_pickup(&mut f, &item, &base, Instant::now());
        assert_eq!(outcome, PickupOutcome::Equipped);
        assert_eq!(f.attack_damage, 35);
        assert_eq!(f.attack_range, 90.0);
        assert_eq!(f.weapon.as_ref().unwrap().item_id, item.id);
    }

    #[test]
    fn weapon_without_range_keeps_base_reach() {
        let base = PlayerTuning::default();
        let mut f = fighter();
        let def = WeaponDef {
            range: None,
            ..COMMON_WEAPONS[0]
        };
        let item = weapon_item(&def, Vec2::new(150.0, 520.0), ItemOrigin::System);
        apply_pickup(&mut f, &item, &base, Instant::now());
        assert_eq!(f.attack_range, base.base_range);
    }

    #[test]
    fn shield_defense_replaces_rather_than_adds() {
        let base = PlayerTuning::default();
        let mut f = fighter();
        f.defense = 3;
        let item = WorldItem {
            id: allocate_item_id("shield", "Buckler"),
            name: "Buckler".into(),
            pos: Vec2::new(150.0, 520.0),
            payload: ItemPayload::Shield { defense: 8 },
            icon: "shield".into(),
            origin: ItemOrigin::System,
            created_at_ms: unix_millis(),
        };
        apply_pickup(&mut f, &item, &base, Instant::now());
        assert_eq!(f.defense, 8);
    }

    #[test]
    fn consumable_heals_with_clamp_and_sets_speed_revert() {
        let base = PlayerTuning::default();
        let mut f = fighter();
        f.health = 90;
        let now = Instant::now();
        let item = WorldItem {
            id: allocate_item_id("consumable", "Tonic"),
            name: "Tonic".into(),
            pos: Vec2::new(150.0, 520.0),
            payload: ItemPayload::Consumable {
                heal: 30,
                speed_boost: 1.5,
                duration_ms: 4000,
            },
            icon: "potion".into(),
            origin: ItemOrigin::Contributor("viewer42".into()),
            created_at_ms: unix_millis(),
        };

        let outcome = apply_pickup(&mut f, &item, &base, now);
        assert_eq!(f.health, 100);
        assert_eq!(f.speed_multiplier, 1.5);
        let expected = now + Duration::from_millis(4000);
        assert_eq!(
            outcome,
            PickupOutcome::Consumed {
                speed_reset_at: Some(expected)
            }
        );
        assert_eq!(f.speed_reset_at, Some(expected));
    }

    #[test]
    fn later_consumable_overwrites_pending_reset() {
        let base = PlayerTuning::default();
        let mut f = fighter();
        let now = Instant::now();
        let boost = |duration_ms| WorldItem {
            id: allocate_item_id("consumable", "Sprint"),
            name: "Sprint".into(),
            pos: Vec2::new(150.0, 520.0),
            payload: ItemPayload::Consumable {
                heal: 0,
                speed_boost: 2.0,
                duration_ms,
            },
            icon: "boots".into(),
            origin: ItemOrigin::System,
            created_at_ms: unix_millis(),
        };

        apply_pickup(&mut f, &boost(1000), &base, now);
        apply_pickup(&mut f, &boost(9000), &base, now);
        assert_eq!(f.speed_reset_at, Some(now + Duration::from_millis(9000)));
    }
}

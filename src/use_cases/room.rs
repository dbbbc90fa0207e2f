// The authoritative match state machine. One Room owns one match: its
// fighters, ground items, phase transitions and scheduled actions. All
// mutation happens synchronously through these methods; the room task in
// `room_task.rs` serializes events so there is never a concurrent writer.

use crate::domain::systems::{combat, physics};
use crate::domain::tuning::RoomTuning;
use crate::domain::{ControlFlags, Facing, Fighter, FighterSnapshot, ItemPayload, Vec2, WorldItem};
use crate::use_cases::items::{self, PickupOutcome};
use crate::use_cases::types::{
    GamePhase, JoinError, LeaveReason, Outbound, RoomEvent, RoomSnapshot,
};
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::info;

/// Room-level runtime settings, separate from gameplay tuning.
#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
    /// Fixed at two for arena duels.
    pub capacity: usize,
    /// Delay between reaching capacity and the automatic match start.
    pub auto_start_delay: Duration,
    /// How long a room that nobody ever joined is kept alive.
    pub idle_expiry: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            capacity: 2,
            auto_start_delay: Duration::from_secs(3),
            idle_expiry: Duration::from_secs(60),
        }
    }
}

/// Deferred state changes, stored as explicit (deadline, action) entries
/// rather than captured closures. Every handler re-validates current room
/// state when it fires, since the room may have moved on since scheduling.
#[derive(Debug, Clone, PartialEq)]
enum RoomAction {
    AutoStart,
    ClearAttack { conn_id: u64 },
    SpeedReset { conn_id: u64 },
    SpawnWeapon,
    IdleExpiry,
}

pub struct Room {
    id: String,
    settings: RoomSettings,
    tuning: RoomTuning,
    players: HashMap<u64, Fighter>,
    items: HashMap<String, WorldItem>,
    phase: GamePhase,
    created_at: Instant,
    started_at: Option<Instant>,
    schedule: Vec<(Instant, RoomAction)>,
    rng: StdRng,
    /// Set once the room should be torn down; the room task exits on it.
    closed: bool,
    ever_joined: bool,
}

impl Room {
    pub fn new(
        id: String,
        tuning: RoomTuning,
        settings: RoomSettings,
        rng: StdRng,
        now: Instant,
    ) -> Self {
        Self {
            id,
            settings,
            tuning,
            players: HashMap::new(),
            items: HashMap::new(),
            phase: GamePhase::Waiting,
            created_at: now,
            started_at: None,
            schedule: vec![(now + settings.idle_expiry, RoomAction::IdleExpiry)],
            rng,
            closed: false,
            ever_joined: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Match start timestamp, set on the `Ready → InProgress` transition.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Earliest pending scheduled action, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.iter().map(|(deadline, _)| *deadline).min()
    }

    /// Applies one inbound event and returns everything to broadcast.
    pub fn handle(&mut self, event: RoomEvent, now: Instant) -> Vec<Outbound> {
        match event {
            RoomEvent::Join {
                conn_id,
                name,
                reply,
            } => match self.join(conn_id, name, now) {
                Ok((snapshot, out)) => {
                    let _ = reply.send(Ok(snapshot));
                    out
                }
                Err(err) => {
                    let _ = reply.send(Err(err));
                    Vec::new()
                }
            },
            RoomEvent::Leave { conn_id, reason } => self.leave(conn_id, reason, now),
            RoomEvent::Move {
                conn_id,
                pos,
                vel,
                flags,
            } => self.apply_move(conn_id, pos, vel, flags, now),
            RoomEvent::Attack { conn_id } => self.apply_attack(conn_id, now),
            RoomEvent::Ready { conn_id } => self.set_ready(conn_id, now),
            RoomEvent::Pickup { conn_id, item_id } => self.request_pickup(conn_id, &item_id, now),
            RoomEvent::PlatformDrop(req) => self.drop_item(req.item, now),
            RoomEvent::PlatformBoost {
                player_id, amount, ..
            } => self.apply_boost(player_id, amount, now),
        }
    }

    /// Adds a player, assigning the left spawn to the first joiner and the
    /// right to the second. Reaching capacity moves the room to `Ready` and
    /// schedules the automatic start.
    pub fn join(
        &mut self,
        conn_id: u64,
        name: String,
        now: Instant,
    ) -> Result<(RoomSnapshot, Vec<Outbound>), JoinError> {
        if self.players.len() >= self.settings.capacity
            || matches!(self.phase, GamePhase::Finished { .. })
        {
            return Err(JoinError::RoomFull);
        }

        let slot = if self.players.values().any(|f| f.spawn_slot == 0) {
            1
        } else {
            0
        };
        let fighter = Fighter::spawn(conn_id, name, slot, &self.tuning.player);
        info!(room_id = %self.id, player_id = conn_id, name = %fighter.name, "player joined");

        let mut out = vec![Outbound::PlayerJoined(self.capture(&fighter, now))];
        self.players.insert(conn_id, fighter);
        self.ever_joined = true;

        if self.players.len() == self.settings.capacity && self.phase == GamePhase::Waiting {
            self.phase = GamePhase::Ready;
            out.push(Outbound::PhaseChanged(GamePhase::Ready));
            self.schedule
                .push((now + self.settings.auto_start_delay, RoomAction::AutoStart));
        }

        let snapshot = self.snapshot(now);
        out.push(Outbound::Snapshot(snapshot.clone()));
        Ok((snapshot, out))
    }

    /// Removes a player. Leaving mid-match forfeits immediately: the sole
    /// remaining player wins with no reconnection grace period. The room
    /// closes once its last player is gone.
    pub fn leave(&mut self, conn_id: u64, reason: LeaveReason, now: Instant) -> Vec<Outbound> {
        if self.players.remove(&conn_id).is_none() {
            return Vec::new();
        }
        info!(room_id = %self.id, player_id = conn_id, ?reason, "player left");

        let mut out = vec![Outbound::PlayerLeft {
            player_id: conn_id,
            reason,
        }];

        match self.phase {
            GamePhase::InProgress => {
                let winner = self.players.keys().next().copied();
                self.finish(winner, &mut out);
            }
            GamePhase::Ready => {
                // Back to waiting for an opponent; drop the pending start.
                self.phase = GamePhase::Waiting;
                self.schedule
                    .retain(|(_, action)| *action != RoomAction::AutoStart);
                out.push(Outbound::PhaseChanged(GamePhase::Waiting));
            }
            _ => {}
        }

        if self.players.is_empty() {
            self.closed = true;
        }

        out.push(Outbound::Snapshot(self.snapshot(now)));
        out
    }

    /// Applies a client-reported move. The server trusts the reported
    /// position but re-clamps it into legal bounds and recomputes the
    /// grounded flag; anything outside `InProgress` or from a dead fighter
    /// is silently dropped.
    pub fn apply_move(
        &mut self,
        conn_id: u64,
        pos: Vec2,
        vel: Vec2,
        flags: ControlFlags,
        now: Instant,
    ) -> Vec<Outbound> {
        if self.phase != GamePhase::InProgress {
            return Vec::new();
        }
        let arena = self.tuning.arena;
        let Some(fighter) = self.players.get_mut(&conn_id) else {
            return Vec::new();
        };
        if !fighter.alive {
            return Vec::new();
        }

        fighter.pos = pos;
        fighter.vel = vel;
        if flags.left && !flags.right {
            fighter.facing = Facing::Left;
        } else if flags.right && !flags.left {
            fighter.facing = Facing::Right;
        }

        physics::clamp_to_bounds(&mut fighter.pos, &arena);
        fighter.grounded = physics::settle_on_ground(&mut fighter.pos, &mut fighter.vel, &arena);
        if fighter.grounded {
            physics::apply_friction(&mut fighter.vel, &arena);
        }

        let mut out = vec![Outbound::PlayerMoved {
            player_id: conn_id,
            pos: fighter.pos,
            vel: fighter.vel,
        }];

        // Proximity transfer: immediate and unconditional. When both
        // fighters are in range the first processed move wins.
        let in_range = items::items_in_range(fighter.pos, &self.items, &self.tuning.items);
        self.transfer_items(conn_id, in_range, now, &mut out);

        out.push(Outbound::Snapshot(self.snapshot(now)));
        out
    }

    /// Resolves one attack: cooldown gate, directional hit test against
    /// every other living fighter, damage before knockback, then the win
    /// condition check. Early or out-of-state attacks are dropped.
    pub fn apply_attack(&mut self, conn_id: u64, now: Instant) -> Vec<Outbound> {
        if self.phase != GamePhase::InProgress {
            return Vec::new();
        }
        let arena = self.tuning.arena;
        let combat_tuning = self.tuning.combat;

        let Some(attacker) = self.players.get_mut(&conn_id) else {
            return Vec::new();
        };
        if !attacker.alive || !combat::cooldown_elapsed(attacker, now, &combat_tuning) {
            return Vec::new();
        }

        attacker.is_attacking = true;
        attacker.last_attack_at = Some(now);
        let attacker_view = attacker.clone();
        self.schedule.push((
            now + combat_tuning.attack_clear_delay,
            RoomAction::ClearAttack { conn_id },
        ));

        let mut health_events = Vec::new();
        let mut first_target = None;
        for target in self
            .players
            .values_mut()
            .filter(|t| t.id != conn_id && t.alive)
        {
            if !combat::check_hit(&attacker_view, target, &arena) {
                continue;
            }

            // Damage first; knockback is applied even if the hit kills.
            let health = combat::apply_damage(target, attacker_view.attack_damage);
            health_events.push(Outbound::HealthChanged {
                player_id: target.id,
                health,
            });
            target.pos = combat::knockback_position(&attacker_view, target, &combat_tuning);
            physics::clamp_to_bounds(&mut target.pos, &arena);
            target.grounded =
                physics::settle_on_ground(&mut target.pos, &mut target.vel, &arena);

            if first_target.is_none() {
                first_target = Some(target.id);
            }
        }

        let mut out = vec![Outbound::PlayerAttacked {
            player_id: conn_id,
            target_id: first_target,
        }];
        out.extend(health_events);

        self.resolve_win(&mut out);
        out.push(Outbound::Snapshot(self.snapshot(now)));
        out
    }

    /// Marks a player ready. When every player has signalled ready the
    /// match starts immediately instead of waiting out the countdown.
    pub fn set_ready(&mut self, conn_id: u64, now: Instant) -> Vec<Outbound> {
        if self.phase != GamePhase::Ready {
            return Vec::new();
        }
        let Some(fighter) = self.players.get_mut(&conn_id) else {
            return Vec::new();
        };
        fighter.ready = true;

        let mut out = Vec::new();
        if self.players.values().all(|f| f.ready) {
            self.start(now, &mut out);
        }
        out.push(Outbound::Snapshot(self.snapshot(now)));
        out
    }

    /// Explicit pickup request, gated by a distance check at request time.
    /// Unknown item ids are a silent no-op.
    pub fn request_pickup(&mut self, conn_id: u64, item_id: &str, now: Instant) -> Vec<Outbound> {
        if self.phase != GamePhase::InProgress {
            return Vec::new();
        }
        let Some(fighter) = self.players.get(&conn_id) else {
            return Vec::new();
        };
        if !fighter.alive {
            return Vec::new();
        }
        let Some(item) = self.items.get(item_id) else {
            return Vec::new();
        };
        if physics::distance(fighter.pos, item.pos) > self.tuning.items.pickup_radius {
            return Vec::new();
        }

        let mut out = Vec::new();
        self.transfer_items(conn_id, vec![item_id.to_string()], now, &mut out);
        out.push(Outbound::Snapshot(self.snapshot(now)));
        out
    }

    /// Places an item on the arena floor. Used by both the system spawner
    /// and externally triggered drops; no-ops once the match is over.
    pub fn drop_item(&mut self, item: WorldItem, now: Instant) -> Vec<Outbound> {
        if matches!(self.phase, GamePhase::Finished { .. }) || self.closed {
            return Vec::new();
        }
        info!(room_id = %self.id, item_id = %item.id, origin = ?item.origin, "item dropped");

        let mut out = vec![Outbound::ItemDropped(item.clone())];
        self.items.insert(item.id.clone(), item);
        out.push(Outbound::Snapshot(self.snapshot(now)));
        out
    }

    /// Viewer boost from the platform, applied as a clamped heal.
    pub fn apply_boost(&mut self, player_id: u64, amount: i32, now: Instant) -> Vec<Outbound> {
        if self.phase != GamePhase::InProgress || amount <= 0 {
            return Vec::new();
        }
        let Some(fighter) = self.players.get_mut(&player_id) else {
            return Vec::new();
        };
        if !fighter.alive {
            return Vec::new();
        }

        fighter.health = (fighter.health + amount).clamp(0, fighter.max_health);
        let health = fighter.health;
        vec![
            Outbound::HealthChanged { player_id, health },
            Outbound::Snapshot(self.snapshot(now)),
        ]
    }

    /// Fires every scheduled action whose deadline has passed. Each handler
    /// re-validates current state: the room may have changed phase or lost
    /// the player since the action was scheduled.
    pub fn fire_due_actions(&mut self, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();
        let mut mutated = false;

        while let Some(idx) = self
            .schedule
            .iter()
            .position(|(deadline, _)| *deadline <= now)
        {
            let (_, action) = self.schedule.swap_remove(idx);
            match action {
                RoomAction::AutoStart => {
                    if self.phase == GamePhase::Ready {
                        self.start(now, &mut out);
                        mutated = true;
                    }
                }
                RoomAction::ClearAttack { conn_id } => {
                    if let Some(fighter) = self.players.get_mut(&conn_id) {
                        if fighter.is_attacking {
                            fighter.is_attacking = false;
                            mutated = true;
                        }
                    }
                }
                RoomAction::SpeedReset { conn_id } => {
                    if let Some(fighter) = self.players.get_mut(&conn_id) {
                        // Only revert if this deadline is still the pending
                        // one; a later pickup overwrites it.
                        if fighter.speed_reset_at.is_some_and(|d| d <= now) {
                            fighter.speed_multiplier = 1.0;
                            fighter.speed_reset_at = None;
                            mutated = true;
                        }
                    }
                }
                RoomAction::SpawnWeapon => {
                    if self.phase == GamePhase::InProgress {
                        let item =
                            items::spawn_system_weapon(&mut self.rng, &self.tuning.items, None);
                        out.push(Outbound::ItemDropped(item.clone()));
                        self.items.insert(item.id.clone(), item);
                        self.schedule
                            .push((now + self.tuning.items.spawn_interval, RoomAction::SpawnWeapon));
                        mutated = true;
                    }
                }
                RoomAction::IdleExpiry => {
                    if !self.ever_joined && self.players.is_empty() {
                        info!(room_id = %self.id, "idle room expired");
                        self.closed = true;
                    }
                }
            }
        }

        if mutated {
            out.push(Outbound::Snapshot(self.snapshot(now)));
        }
        out
    }

    /// Authoritative full-room view; players ordered by spawn slot and
    /// items by id for stable output.
    pub fn snapshot(&self, now: Instant) -> RoomSnapshot {
        let mut players: Vec<FighterSnapshot> = self
            .players
            .values()
            .map(|f| self.capture(f, now))
            .collect();
        players.sort_by_key(|p| self.players[&p.id].spawn_slot);

        let mut items: Vec<WorldItem> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));

        RoomSnapshot {
            room_id: self.id.clone(),
            phase: self.phase.clone(),
            players,
            items,
        }
    }

    fn capture(&self, fighter: &Fighter, now: Instant) -> FighterSnapshot {
        FighterSnapshot::capture(fighter, now, self.tuning.combat.attack_cooldown)
    }

    fn start(&mut self, now: Instant, out: &mut Vec<Outbound>) {
        self.phase = GamePhase::InProgress;
        self.started_at = Some(now);
        info!(room_id = %self.id, "match started");
        out.push(Outbound::GameStarted);
        out.push(Outbound::PhaseChanged(GamePhase::InProgress));
        self.schedule
            .push((now + self.tuning.items.spawn_interval, RoomAction::SpawnWeapon));
    }

    /// Terminal transition. Zero survivors is a draw, never a win for the
    /// attacker.
    fn resolve_win(&mut self, out: &mut Vec<Outbound>) {
        if self.phase != GamePhase::InProgress {
            return;
        }
        let mut alive = self.players.values().filter(|f| f.alive);
        let first = alive.next().map(|f| f.id);
        let second = alive.next();
        if second.is_some() {
            return;
        }
        self.finish(first, out);
    }

    fn finish(&mut self, winner: Option<u64>, out: &mut Vec<Outbound>) {
        info!(room_id = %self.id, ?winner, "match finished");
        self.phase = GamePhase::Finished { winner };
        out.push(Outbound::GameEnded { winner });
        out.push(Outbound::PhaseChanged(self.phase.clone()));
    }

    /// Moves ground items onto a fighter. Each id is removed from the
    /// ground mapping before its effect applies, so an item can never be
    /// granted twice.
    fn transfer_items(
        &mut self,
        conn_id: u64,
        item_ids: Vec<String>,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let base = self.tuning.player;
        for item_id in item_ids {
            let Some(item) = self.items.remove(&item_id) else {
                continue;
            };
            let Some(fighter) = self.players.get_mut(&conn_id) else {
                self.items.insert(item_id, item);
                return;
            };

            let heals = matches!(item.payload, ItemPayload::Consumable { heal, .. } if heal > 0);
            let outcome = items::apply_pickup(fighter, &item, &base, now);
            info!(
                room_id = %self.id,
                player_id = conn_id,
                item_id = %item.id,
                category = item.payload.category(),
                "item picked up"
            );
            out.push(Outbound::ItemPickedUp {
                player_id: conn_id,
                item_id: item_id.clone(),
            });
            match outcome {
                PickupOutcome::Equipped => out.push(Outbound::ItemEquipped {
                    player_id: conn_id,
                    item_id,
                }),
                PickupOutcome::Consumed { speed_reset_at } => {
                    if heals {
                        out.push(Outbound::HealthChanged {
                            player_id: conn_id,
                            health: fighter.health,
                        });
                    }
                    if let Some(deadline) = speed_reset_at {
                        self.schedule
                            .push((deadline, RoomAction::SpeedReset { conn_id }));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const ALICE: u64 = 1;
    const BOB: u64 = 2;

    fn new_room(now: Instant) -> Room {
        Room::new(
            "TEST01".to_string(),
            RoomTuning::default(),
            RoomSettings::default(),
            StdRng::seed_from_u64(42),
            now,
        )
    }

    /// Joins Alice and Bob and fires the auto-start; returns the in-match time.
    fn start_match(room: &mut Room, t0: Instant) -> Instant {
        room.join(ALICE, "Alice".into(), t0).expect("alice joins");
        room.join(BOB, "Bob".into(), t0).expect("bob joins");
        let t1 = t0 + room.settings.auto_start_delay;
        room.fire_due_actions(t1);
        assert_eq!(room.phase, GamePhase::InProgress);
        t1
    }

    fn move_to(room: &mut Room, id: u64, x: f32, y: f32, now: Instant) -> Vec<Outbound> {
        room.apply_move(
            id,
            Vec2::new(x, y),
            Vec2::new(0.0, 0.0),
            ControlFlags::default(),
            now,
        )
    }

    #[test]
    fn join_assigns_sides_and_capacity_readies_the_room() {
        let t0 = Instant::now();
        let mut room = new_room(t0);

        let (snap, _) = room.join(ALICE, "Alice".into(), t0).unwrap();
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].x, 150.0);
        assert_eq!(snap.players[0].health, 100);
        assert_eq!(room.phase, GamePhase::Waiting);

        let (snap, out) = room.join(BOB, "Bob".into(), t0).unwrap();
        assert_eq!(snap.players[1].x, 650.0);
        assert_eq!(room.phase, GamePhase::Ready);
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::PhaseChanged(GamePhase::Ready))));

        // Auto-start after the configured delay.
        let out = room.fire_due_actions(t0 + room.settings.auto_start_delay);
        assert!(out.iter().any(|o| matches!(o, Outbound::GameStarted)));
        assert_eq!(room.phase, GamePhase::InProgress);
        assert_eq!(room.started_at(), Some(t0 + room.settings.auto_start_delay));
    }

    #[test]
    fn third_join_is_rejected_with_room_full() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        room.join(ALICE, "Alice".into(), t0).unwrap();
        room.join(BOB, "Bob".into(), t0).unwrap();
        assert_eq!(
            room.join(3, "Carol".into(), t0).unwrap_err(),
            JoinError::RoomFull
        );
    }

    #[test]
    fn both_ready_starts_before_the_countdown() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        room.join(ALICE, "Alice".into(), t0).unwrap();
        room.join(BOB, "Bob".into(), t0).unwrap();

        room.set_ready(ALICE, t0);
        assert_eq!(room.phase, GamePhase::Ready);
        let out = room.set_ready(BOB, t0);
        assert!(out.iter().any(|o| matches!(o, Outbound::GameStarted)));
        assert_eq!(room.phase, GamePhase::InProgress);

        // The stale auto-start re-checks phase and does nothing.
        let out = room.fire_due_actions(t0 + room.settings.auto_start_delay);
        assert!(!out.iter().any(|o| matches!(o, Outbound::GameStarted)));
    }

    #[test]
    fn attack_in_range_applies_defense_adjusted_damage() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        move_to(&mut room, ALICE, 600.0, 520.0, t1);
        let out = room.apply_attack(ALICE, t1);

        let bob = &room.players[&BOB];
        assert_eq!(bob.health, 90);
        assert!(out.iter().any(|o| matches!(
            o,
            Outbound::HealthChanged {
                player_id: BOB,
                health: 90
            }
        )));
        assert!(out.iter().any(|o| matches!(
            o,
            Outbound::PlayerAttacked {
                player_id: ALICE,
                target_id: Some(BOB)
            }
        )));
        // Knockback pushed Bob away and is applied on top of the damage.
        assert!(bob.pos.x > 650.0);
    }

    #[test]
    fn attacks_within_cooldown_are_dropped() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        move_to(&mut room, ALICE, 600.0, 520.0, t1);
        room.apply_attack(ALICE, t1);
        assert_eq!(room.players[&BOB].health, 90);

        let out = room.apply_attack(ALICE, t1 + Duration::from_millis(100));
        assert!(out.is_empty());
        assert_eq!(room.players[&BOB].health, 90);

        let cooldown = room.tuning.combat.attack_cooldown;
        let out = room.apply_attack(ALICE, t1 + cooldown);
        assert!(!out.is_empty());
    }

    #[test]
    fn attack_pose_clears_after_the_animation_delay() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        room.apply_attack(ALICE, t1);
        assert!(room.players[&ALICE].is_attacking);
        room.fire_due_actions(t1 + room.tuning.combat.attack_clear_delay);
        assert!(!room.players[&ALICE].is_attacking);
    }

    #[test]
    fn weapon_pickup_transfers_ownership_and_stats() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        let def = crate::domain::tuning::items::WeaponDef {
            name: "Test Blade",
            kind: "sword",
            attack: 25,
            range: None,
            cooldown_ms: 800,
            rarity: crate::domain::Rarity::Common,
            icon: "sword",
        };
        let item = items::weapon_item(&def, Vec2::new(150.0, 520.0), crate::domain::ItemOrigin::System);
        let item_id = item.id.clone();
        room.drop_item(item, t1);

        let out = move_to(&mut room, ALICE, 160.0, 520.0, t1);
        assert!(out.iter().any(|o| matches!(
            o,
            Outbound::ItemPickedUp { player_id: ALICE, .. }
        )));

        let alice = &room.players[&ALICE];
        assert_eq!(alice.attack_damage, 35);
        assert_eq!(alice.weapon.as_ref().unwrap().item_id, item_id);
        assert!(room.items.is_empty());
    }

    #[test]
    fn a_transferred_item_never_reaches_a_second_player() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        let def = crate::domain::tuning::items::COMMON_WEAPONS[0];
        let item = items::weapon_item(&def, Vec2::new(400.0, 520.0), crate::domain::ItemOrigin::System);
        room.drop_item(item, t1);

        // Both fighters end up in pickup range; the first processed move wins.
        move_to(&mut room, ALICE, 390.0, 520.0, t1);
        let out = move_to(&mut room, BOB, 410.0, 520.0, t1);

        assert!(room.players[&ALICE].weapon.is_some());
        assert!(room.players[&BOB].weapon.is_none());
        assert!(!out
            .iter()
            .any(|o| matches!(o, Outbound::ItemPickedUp { .. })));
    }

    #[test]
    fn pickup_of_unknown_item_id_is_a_silent_no_op() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        let out = room.request_pickup(ALICE, "weapon-ghost-1", t1);
        assert!(out.is_empty());
    }

    #[test]
    fn manual_pickup_requires_proximity() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        let def = crate::domain::tuning::items::COMMON_WEAPONS[1];
        let item = items::weapon_item(&def, Vec2::new(650.0, 520.0), crate::domain::ItemOrigin::System);
        let item_id = item.id.clone();
        room.drop_item(item, t1);

        // Alice is on the far side of the arena.
        assert!(room.request_pickup(ALICE, &item_id, t1).is_empty());
        assert!(room.items.contains_key(&item_id));

        // Bob spawned right next to it.
        let out = room.request_pickup(BOB, &item_id, t1);
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::ItemPickedUp { player_id: BOB, .. })));
        assert!(!room.items.contains_key(&item_id));
    }

    #[test]
    fn lethal_hit_finishes_the_match_and_freezes_it() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        room.players.get_mut(&BOB).unwrap().health = 5;
        move_to(&mut room, ALICE, 600.0, 520.0, t1);
        let out = room.apply_attack(ALICE, t1);

        assert_eq!(room.players[&BOB].health, 0);
        assert!(!room.players[&BOB].alive);
        assert_eq!(
            room.phase,
            GamePhase::Finished {
                winner: Some(ALICE)
            }
        );
        assert!(out.iter().any(|o| matches!(
            o,
            Outbound::GameEnded {
                winner: Some(ALICE)
            }
        )));

        // Terminal: further events from either player are no-ops.
        let t2 = t1 + Duration::from_secs(2);
        assert!(room.apply_attack(ALICE, t2).is_empty());
        assert!(move_to(&mut room, BOB, 100.0, 520.0, t2).is_empty());
    }

    #[test]
    fn simultaneous_knockout_is_a_draw() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        start_match(&mut room, t0);

        for fighter in room.players.values_mut() {
            fighter.health = 0;
            fighter.alive = false;
        }
        let mut out = Vec::new();
        room.resolve_win(&mut out);

        assert_eq!(room.phase, GamePhase::Finished { winner: None });
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::GameEnded { winner: None })));
    }

    #[test]
    fn disconnect_mid_match_forfeits_to_the_opponent() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        let out = room.leave(ALICE, LeaveReason::Disconnected, t1);
        assert_eq!(room.phase, GamePhase::Finished { winner: Some(BOB) });
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::GameEnded { winner: Some(BOB) })));
        assert!(!room.is_closed());

        room.leave(BOB, LeaveReason::Explicit, t1);
        assert!(room.is_closed());
    }

    #[test]
    fn leaving_a_ready_room_reverts_to_waiting() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        room.join(ALICE, "Alice".into(), t0).unwrap();
        room.join(BOB, "Bob".into(), t0).unwrap();
        assert_eq!(room.phase, GamePhase::Ready);

        room.leave(BOB, LeaveReason::Explicit, t0);
        assert_eq!(room.phase, GamePhase::Waiting);

        // The cancelled countdown must not start a one-player match.
        room.fire_due_actions(t0 + room.settings.auto_start_delay);
        assert_eq!(room.phase, GamePhase::Waiting);
    }

    #[test]
    fn moves_are_clamped_and_grounded_recomputed() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        move_to(&mut room, ALICE, -500.0, 520.0, t1);
        assert_eq!(room.players[&ALICE].pos.x, 20.0);
        assert!(room.players[&ALICE].grounded);

        move_to(&mut room, ALICE, 300.0, 200.0, t1);
        assert!(!room.players[&ALICE].grounded);
    }

    #[test]
    fn moves_before_start_are_dropped() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        room.join(ALICE, "Alice".into(), t0).unwrap();
        let out = move_to(&mut room, ALICE, 400.0, 520.0, t0);
        assert!(out.is_empty());
        assert_eq!(room.players[&ALICE].pos.x, 150.0);
    }

    #[test]
    fn system_weapons_spawn_periodically_once_in_progress() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        assert!(room.items.is_empty());
        let t2 = t1 + room.tuning.items.spawn_interval;
        let out = room.fire_due_actions(t2);
        assert!(out.iter().any(|o| matches!(o, Outbound::ItemDropped(_))));
        assert_eq!(room.items.len(), 1);

        // And again one interval later.
        room.fire_due_actions(t2 + room.tuning.items.spawn_interval);
        assert_eq!(room.items.len(), 2);
    }

    #[test]
    fn speed_boost_reverts_after_its_duration() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        let item = WorldItem {
            id: items::allocate_item_id("consumable", "Sprint"),
            name: "Sprint".into(),
            pos: Vec2::new(150.0, 520.0),
            payload: ItemPayload::Consumable {
                heal: 0,
                speed_boost: 1.5,
                duration_ms: 4000,
            },
            icon: "boots".into(),
            origin: crate::domain::ItemOrigin::System,
            created_at_ms: items::unix_millis(),
        };
        room.drop_item(item, t1);
        move_to(&mut room, ALICE, 150.0, 520.0, t1);
        assert_eq!(room.players[&ALICE].speed_multiplier, 1.5);

        room.fire_due_actions(t1 + Duration::from_millis(4000));
        assert_eq!(room.players[&ALICE].speed_multiplier, 1.0);
        assert_eq!(room.players[&ALICE].speed_reset_at, None);
    }

    #[test]
    fn boost_heals_with_clamp() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        let t1 = start_match(&mut room, t0);

        room.players.get_mut(&ALICE).unwrap().health = 95;
        let out = room.apply_boost(ALICE, 20, t1);
        assert_eq!(room.players[&ALICE].health, 100);
        assert!(out.iter().any(|o| matches!(
            o,
            Outbound::HealthChanged {
                player_id: ALICE,
                health: 100
            }
        )));

        // Boosts for unknown players are dropped.
        assert!(room.apply_boost(99, 20, t1).is_empty());
    }

    #[test]
    fn idle_room_expires_when_nobody_ever_joined() {
        let t0 = Instant::now();
        let mut room = new_room(t0);
        room.fire_due_actions(t0 + room.settings.idle_expiry);
        assert!(room.is_closed());
    }
}

// Wire protocol DTOs and conversions for public arena server messages.
// Internal service-to-service DTOs live in `net::internal`.

use crate::domain::item::{EquippedShield, EquippedWeapon, ItemOrigin, ItemPayload, Rarity, WorldItem};
use crate::domain::{ControlFlags, Facing, FighterSnapshot, Vec2};
use crate::use_cases::{GamePhase, JoinError, LeaveReason, Outbound, RoomSnapshot};
use serde::{Deserialize, Serialize};

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Creates a room; the generated code comes back in RoomCreated.
    CreateRoom,
    // Joins an existing room by its code.
    JoinRoom(JoinRoomPayload),
    // Explicitly leaves the current room; the socket then closes.
    LeaveRoom,
    // Client-reported movement, trusted but re-clamped server-side.
    Move(MovePayload),
    Attack,
    Ready,
    PickupItem { item_id: String },
    // Manual equip request; resolves through the same transfer path.
    EquipItem { item_id: String, slot: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub player_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovePayload {
    pub pos: Vec2Dto,
    pub vel: Vec2Dto,
    #[serde(default)]
    pub flags: ControlFlagsDto,
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    RoomCreated { room_id: String },
    // Authoritative snapshot returned to the joining client only.
    RoomJoined(RoomSnapshotDto),
    // Join/create failures surfaced synchronously to the requester.
    JoinRejected { reason: JoinRejectReason },
    PlayerJoined(FighterDto),
    PlayerLeft { player_id: String },
    PlayerDisconnected { player_id: String },
    PlayerMoved { player_id: String, pos: Vec2Dto, vel: Vec2Dto },
    PlayerAttacked { player_id: String, target_id: Option<String> },
    HealthChanged { player_id: String, health: i32 },
    GameStateChanged(GamePhaseDto),
    GameStarted,
    // `winner` is null on a draw.
    GameEnded { winner: Option<String> },
    ItemDropped(WorldItemDto),
    ItemPickedUp { player_id: String, item_id: String },
    ItemEquipped { player_id: String, item_id: String },
    // Full authoritative state, sent after every mutating event.
    Snapshot(RoomSnapshotDto),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JoinRejectReason {
    RoomFull,
    RoomNotFound,
}

impl From<JoinError> for JoinRejectReason {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::RoomFull => JoinRejectReason::RoomFull,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec2Dto {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Vec2Dto {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vec2Dto> for Vec2 {
    fn from(v: Vec2Dto) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacingDto {
    Left,
    Right,
}

impl From<Facing> for FacingDto {
    fn from(f: Facing) -> Self {
        match f {
            Facing::Left => FacingDto::Left,
            Facing::Right => FacingDto::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ControlFlagsDto {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub jump: bool,
}

impl From<ControlFlagsDto> for ControlFlags {
    fn from(f: ControlFlagsDto) -> Self {
        Self {
            left: f.left,
            right: f.right,
            jump: f.jump,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RarityDto {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl From<Rarity> for RarityDto {
    fn from(r: Rarity) -> Self {
        match r {
            Rarity::Common => RarityDto::Common,
            Rarity::Rare => RarityDto::Rare,
            Rarity::Epic => RarityDto::Epic,
            Rarity::Legendary => RarityDto::Legendary,
        }
    }
}

impl From<RarityDto> for Rarity {
    fn from(r: RarityDto) -> Self {
        match r {
            RarityDto::Common => Rarity::Common,
            RarityDto::Rare => Rarity::Rare,
            RarityDto::Epic => Rarity::Epic,
            RarityDto::Legendary => Rarity::Legendary,
        }
    }
}

/// Item category with its category-specific effect payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum ItemPayloadDto {
    Weapon {
        kind: String,
        attack: i32,
        range: Option<f32>,
        cooldown_ms: u64,
        rarity: RarityDto,
    },
    Shield {
        defense: i32,
    },
    Consumable {
        heal: i32,
        speed_boost: f32,
        duration_ms: u64,
    },
}

impl From<&ItemPayload> for ItemPayloadDto {
    fn from(p: &ItemPayload) -> Self {
        match p {
            ItemPayload::Weapon {
                kind,
                attack,
                range,
                cooldown_ms,
                rarity,
            } => ItemPayloadDto::Weapon {
                kind: kind.clone(),
                attack: *attack,
                range: *range,
                cooldown_ms: *cooldown_ms,
                rarity: (*rarity).into(),
            },
            ItemPayload::Shield { defense } => ItemPayloadDto::Shield { defense: *defense },
            ItemPayload::Consumable {
                heal,
                speed_boost,
                duration_ms,
            } => ItemPayloadDto::Consumable {
                heal: *heal,
                speed_boost: *speed_boost,
                duration_ms: *duration_ms,
            },
        }
    }
}

impl From<ItemPayloadDto> for ItemPayload {
    fn from(p: ItemPayloadDto) -> Self {
        match p {
            ItemPayloadDto::Weapon {
                kind,
                attack,
                range,
                cooldown_ms,
                rarity,
            } => ItemPayload::Weapon {
                kind,
                attack,
                range,
                cooldown_ms,
                rarity: rarity.into(),
            },
            ItemPayloadDto::Shield { defense } => ItemPayload::Shield { defense },
            ItemPayloadDto::Consumable {
                heal,
                speed_boost,
                duration_ms,
            } => ItemPayload::Consumable {
                heal,
                speed_boost,
                duration_ms,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ItemOriginDto {
    System,
    Contributor { name: String },
}

impl From<&ItemOrigin> for ItemOriginDto {
    fn from(o: &ItemOrigin) -> Self {
        match o {
            ItemOrigin::System => ItemOriginDto::System,
            ItemOrigin::Contributor(name) => ItemOriginDto::Contributor { name: name.clone() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldItemDto {
    pub id: String,
    pub name: String,
    pub pos: Vec2Dto,
    pub payload: ItemPayloadDto,
    pub icon: String,
    pub origin: ItemOriginDto,
    pub created_at_ms: u64,
}

impl From<&WorldItem> for WorldItemDto {
    fn from(item: &WorldItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            pos: item.pos.into(),
            payload: (&item.payload).into(),
            icon: item.icon.clone(),
            origin: (&item.origin).into(),
            created_at_ms: item.created_at_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquippedWeaponDto {
    pub item_id: String,
    pub name: String,
    pub kind: String,
    pub attack: i32,
    pub range: Option<f32>,
    pub cooldown_ms: u64,
    pub rarity: RarityDto,
    pub icon: String,
}

impl From<&EquippedWeapon> for EquippedWeaponDto {
    fn from(w: &EquippedWeapon) -> Self {
        Self {
            item_id: w.item_id.clone(),
            name: w.name.clone(),
            kind: w.kind.clone(),
            attack: w.attack,
            range: w.range,
            cooldown_ms: w.cooldown_ms,
            rarity: w.rarity.into(),
            icon: w.icon.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquippedShieldDto {
    pub item_id: String,
    pub name: String,
    pub defense: i32,
    pub icon: String,
}

impl From<&EquippedShield> for EquippedShieldDto {
    fn from(s: &EquippedShield) -> Self {
        Self {
            item_id: s.item_id.clone(),
            name: s.name.clone(),
            defense: s.defense,
            icon: s.icon.clone(),
        }
    }
}

/// Flattened fighter state for wire transmission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FighterDto {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: FacingDto,
    pub grounded: bool,
    pub health: i32,
    pub max_health: i32,
    pub alive: bool,
    pub is_attacking: bool,
    pub cooldown_remaining_ms: u64,
    pub weapon: Option<EquippedWeaponDto>,
    pub shield: Option<EquippedShieldDto>,
    pub attack_damage: i32,
    pub attack_range: f32,
    pub defense: i32,
    pub speed_multiplier: f32,
}

impl From<&FighterSnapshot> for FighterDto {
    fn from(f: &FighterSnapshot) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            x: f.x,
            y: f.y,
            vx: f.vx,
            vy: f.vy,
            facing: f.facing.into(),
            grounded: f.grounded,
            health: f.health,
            max_health: f.max_health,
            alive: f.alive,
            is_attacking: f.is_attacking,
            cooldown_remaining_ms: f.cooldown_remaining_ms,
            weapon: f.weapon.as_ref().map(EquippedWeaponDto::from),
            shield: f.shield.as_ref().map(EquippedShieldDto::from),
            attack_damage: f.attack_damage,
            attack_range: f.attack_range,
            defense: f.defense,
            speed_multiplier: f.speed_multiplier,
        }
    }
}

/// Match lifecycle state sent to clients for UI flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GamePhaseDto {
    Waiting,
    Ready,
    InProgress,
    Finished { winner: Option<String> },
}

impl From<&GamePhase> for GamePhaseDto {
    fn from(phase: &GamePhase) -> Self {
        match phase {
            GamePhase::Waiting => GamePhaseDto::Waiting,
            GamePhase::Ready => GamePhaseDto::Ready,
            GamePhase::InProgress => GamePhaseDto::InProgress,
            GamePhase::Finished { winner } => GamePhaseDto::Finished {
                winner: winner.map(|id| id.to_string()),
            },
        }
    }
}

/// Authoritative full-room view; overrides client-side prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshotDto {
    pub room_id: String,
    pub phase: GamePhaseDto,
    pub players: Vec<FighterDto>,
    pub items: Vec<WorldItemDto>,
}

impl From<&RoomSnapshot> for RoomSnapshotDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            room_id: snapshot.room_id.clone(),
            phase: (&snapshot.phase).into(),
            players: snapshot.players.iter().map(FighterDto::from).collect(),
            items: snapshot.items.iter().map(WorldItemDto::from).collect(),
        }
    }
}

impl From<&Outbound> for ServerMessage {
    fn from(event: &Outbound) -> Self {
        match event {
            Outbound::PlayerJoined(f) => ServerMessage::PlayerJoined(f.into()),
            Outbound::PlayerLeft { player_id, reason } => match reason {
                LeaveReason::Explicit => ServerMessage::PlayerLeft {
                    player_id: player_id.to_string(),
                },
                LeaveReason::Disconnected => ServerMessage::PlayerDisconnected {
                    player_id: player_id.to_string(),
                },
            },
            Outbound::PlayerMoved {
                player_id,
                pos,
                vel,
            } => ServerMessage::PlayerMoved {
                player_id: player_id.to_string(),
                pos: (*pos).into(),
                vel: (*vel).into(),
            },
            Outbound::PlayerAttacked {
                player_id,
                target_id,
            } => ServerMessage::PlayerAttacked {
                player_id: player_id.to_string(),
                target_id: target_id.map(|id| id.to_string()),
            },
            Outbound::HealthChanged { player_id, health } => ServerMessage::HealthChanged {
                player_id: player_id.to_string(),
                health: *health,
            },
            Outbound::PhaseChanged(phase) => ServerMessage::GameStateChanged(phase.into()),
            Outbound::GameStarted => ServerMessage::GameStarted,
            Outbound::GameEnded { winner } => ServerMessage::GameEnded {
                winner: winner.map(|id| id.to_string()),
            },
            Outbound::ItemDropped(item) => ServerMessage::ItemDropped(item.into()),
            Outbound::ItemPickedUp { player_id, item_id } => ServerMessage::ItemPickedUp {
                player_id: player_id.to_string(),
                item_id: item_id.clone(),
            },
            Outbound::ItemEquipped { player_id, item_id } => ServerMessage::ItemEquipped {
                player_id: player_id.to_string(),
                item_id: item_id.clone(),
            },
            Outbound::Snapshot(snapshot) => ServerMessage::Snapshot(snapshot.into()),
        }
    }
}

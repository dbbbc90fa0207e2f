// Use-case level inputs/outputs for the room event loop.

use crate::domain::{ControlFlags, FighterSnapshot, Vec2, WorldItem};
use tokio::sync::oneshot;

/// Match lifecycle. `Finished` is terminal; `winner` is `None` on a draw.
#[derive(Debug, Clone, PartialEq)]
pub enum GamePhase {
    /// Zero or one players present.
    Waiting,
    /// Capacity reached; countdown to start pending.
    Ready,
    /// Physics and combat active.
    InProgress,
    Finished { winner: Option<u64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    RoomFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// Client sent an explicit leave-room message.
    Explicit,
    /// Socket dropped without a leave; no grace period, immediate forfeit.
    Disconnected,
}

/// Item drop requested through the external arena platform.
#[derive(Debug, Clone)]
pub struct DropRequest {
    pub item: WorldItem,
}

/// Inbound events serialized into a room's single event queue.
#[derive(Debug)]
pub enum RoomEvent {
    Join {
        conn_id: u64,
        name: String,
        reply: oneshot::Sender<Result<RoomSnapshot, JoinError>>,
    },
    Leave {
        conn_id: u64,
        reason: LeaveReason,
    },
    Move {
        conn_id: u64,
        pos: Vec2,
        vel: Vec2,
        flags: ControlFlags,
    },
    Attack {
        conn_id: u64,
    },
    Ready {
        conn_id: u64,
    },
    Pickup {
        conn_id: u64,
        item_id: String,
    },
    /// Item drop pushed in from the external arena platform.
    PlatformDrop(DropRequest),
    /// Viewer boost from the external arena platform, applied as a heal.
    PlatformBoost {
        player_id: u64,
        amount: i32,
        contributor: String,
    },
}

/// Authoritative full-room view broadcast after every mutating event.
/// Clients must treat it as overriding local prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub phase: GamePhase,
    pub players: Vec<FighterSnapshot>,
    pub items: Vec<WorldItem>,
}

/// Events a room emits for broadcast to its members. The transport layer
/// serializes each once and fans the bytes out to every connection.
#[derive(Debug, Clone)]
pub enum Outbound {
    PlayerJoined(FighterSnapshot),
    PlayerLeft {
        player_id: u64,
        reason: LeaveReason,
    },
    PlayerMoved {
        player_id: u64,
        pos: Vec2,
        vel: Vec2,
    },
    PlayerAttacked {
        player_id: u64,
        target_id: Option<u64>,
    },
    HealthChanged {
        player_id: u64,
        health: i32,
    },
    PhaseChanged(GamePhase),
    GameStarted,
    GameEnded {
        winner: Option<u64>,
    },
    ItemDropped(WorldItem),
    ItemPickedUp {
        player_id: u64,
        item_id: String,
    },
    ItemEquipped {
        player_id: u64,
        item_id: String,
    },
    Snapshot(RoomSnapshot),
}

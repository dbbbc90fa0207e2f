// Session registry: the single owner of the room table. All room creation,
// lookup and teardown funnels through this object so the single-writer
// invariant stays explicit and testable.

use crate::domain::tuning::RoomTuning;
use crate::use_cases::room::{Room, RoomSettings};
use crate::use_cases::room_task::room_task;
use crate::use_cases::types::{Outbound, RoomEvent};
use axum::extract::ws::Utf8Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning rooms.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Capacity for inbound room events.
    pub event_channel_capacity: usize,
    /// Capacity for broadcast outbound events.
    pub broadcast_capacity: usize,
    /// Length of generated room codes.
    pub room_code_len: usize,
    pub tuning: RoomTuning,
    pub room: RoomSettings,
}

/// Per-room channels handed to connections and internal routes.
#[derive(Clone)]
pub struct RoomHandle {
    /// Code clients type to join this room.
    pub room_id: Arc<str>,
    /// Sender for events into the room task.
    pub events_tx: mpsc::Sender<RoomEvent>,
    /// Broadcast sender for raw outbound events.
    pub outbound_tx: broadcast::Sender<Outbound>,
    /// Broadcast sender for serialized outbound events.
    pub bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized snapshot for lag recovery.
    pub latest_tx: watch::Sender<Utf8Bytes>,
}

/// Thread-safe registry for active rooms.
pub struct RoomRegistry {
    settings: RegistrySettings,
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a room under a freshly generated code and spawns its task.
    pub async fn create_room(self: &Arc<Self>) -> RoomHandle {
        let mut rooms = self.rooms.write().await;

        // Regenerate on the rare code collision; the write lock is held, so
        // the chosen code cannot race another creation.
        let mut room_id = generate_room_code(self.settings.room_code_len);
        while rooms.contains_key(&room_id) {
            room_id = generate_room_code(self.settings.room_code_len);
        }

        let (events_tx, events_rx) =
            mpsc::channel::<RoomEvent>(self.settings.event_channel_capacity);
        let (outbound_tx, _outbound_rx) =
            broadcast::channel::<Outbound>(self.settings.broadcast_capacity);
        let (bytes_tx, _bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.broadcast_capacity);
        let (latest_tx, _latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

        let room = Room::new(
            room_id.clone(),
            self.settings.tuning,
            self.settings.room,
            StdRng::from_entropy(),
            Instant::now(),
        );

        // Spawn the authoritative event loop for this room.
        tokio::spawn(room_task(
            room,
            Arc::clone(self),
            events_rx,
            outbound_tx.clone(),
        ));

        let handle = RoomHandle {
            room_id: Arc::from(room_id.as_str()),
            events_tx,
            outbound_tx,
            bytes_tx,
            latest_tx,
        };

        info!(room_id = %room_id, "room created");
        rooms.insert(room_id, handle.clone());
        handle
    }

    /// Returns a room handle for the provided code, if it exists.
    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    /// Removes a room from the table; called by the room task on teardown.
    pub async fn remove_room(&self, room_id: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms.remove(room_id).is_some() {
            info!(room_id = %room_id, "room removed");
        }
    }

    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

/// Fixed-length uppercase alphanumeric code, random and human-typeable.
/// Easily confused characters are excluded.
fn generate_room_code(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_codes_are_fixed_length_uppercase_alphanumeric() {
        for _ in 0..100 {
            let code = generate_room_code(6);
            assert_eq!(code.len(), 6);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[tokio::test]
    async fn create_lookup_and_remove_round_trip() {
        let registry = Arc::new(RoomRegistry::new(RegistrySettings {
            event_channel_capacity: 16,
            broadcast_capacity: 16,
            room_code_len: 6,
            tuning: RoomTuning::default(),
            room: RoomSettings::default(),
        }));

        let handle = registry.create_room().await;
        assert_eq!(registry.room_count().await, 1);
        assert!(registry.get_room(&handle.room_id).await.is_some());

        registry.remove_room(&handle.room_id).await;
        assert_eq!(registry.room_count().await, 0);
        assert!(registry.get_room(&handle.room_id).await.is_none());
    }
}

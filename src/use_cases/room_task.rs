// Per-room event loop. Each room is exclusively owned by one task; inbound
// events and timer firings are serialized here, so the Room itself never
// needs locks.

use crate::use_cases::registry::RoomRegistry;
use crate::use_cases::room::Room;
use crate::use_cases::types::{Outbound, RoomEvent};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

pub async fn room_task(
    mut room: Room,
    registry: Arc<RoomRegistry>,
    mut events_rx: mpsc::Receiver<RoomEvent>,
    outbound_tx: broadcast::Sender<Outbound>,
) {
    info!(room_id = %room.id(), "room task started");

    loop {
        let deadline = room.next_deadline();
        let out = tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                // A failing handler must not take down the room or the
                // process; the room keeps its last-good state.
                match std::panic::catch_unwind(AssertUnwindSafe(|| {
                    room.handle(event, Instant::now())
                })) {
                    Ok(out) => out,
                    Err(_) => {
                        error!(room_id = %room.id(), "event handler panicked; event dropped");
                        Vec::new()
                    }
                }
            }
            _ = sleep_until_deadline(deadline) => {
                room.fire_due_actions(Instant::now())
            }
        };

        for event in out {
            // Send failures just mean no connection is subscribed right now.
            let _ = outbound_tx.send(event);
        }

        if room.is_closed() {
            break;
        }
    }

    registry.remove_room(room.id()).await;
    info!(room_id = %room.id(), "room task exited");
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        // No pending actions; wait for events only.
        None => std::future::pending::<()>().await,
    }
}

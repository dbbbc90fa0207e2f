// Service-to-service routes: platform event ingestion and health.

use crate::domain::Vec2;
use crate::domain::item::{ItemOrigin, WorldItem};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{ItemPayloadDto, Vec2Dto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::items::{allocate_item_id, unix_millis};
use crate::use_cases::{DropRequest, RoomEvent};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events pushed by the external arena platform (viewer purchases).
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEventRequest {
    ItemDrop {
        room_id: String,
        // Platform-side delivery id, echoed back in the acknowledgement.
        drop_id: String,
        contributor: String,
        item: PlatformItemDto,
        // Optional drop position; a random arena-safe point otherwise.
        #[serde(default)]
        pos: Option<Vec2Dto>,
    },
    BoostApplied {
        room_id: String,
        boost_id: String,
        // Player ids are strings on every external surface.
        player_id: String,
        amount: i32,
        contributor: String,
    },
}

#[derive(Debug, serde::Deserialize)]
pub struct PlatformItemDto {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub payload: ItemPayloadDto,
}

#[derive(Debug, serde::Serialize)]
struct PlatformEventAccepted {
    // The platform-side delivery id this acceptance refers to.
    id: String,
}

fn bad_request(msg: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

fn room_not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "room not found".to_string(),
        }),
    )
        .into_response()
}

fn room_busy() -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "room event queue full".to_string(),
        }),
    )
        .into_response()
}

/// Ingests one platform event, queues it onto the target room and
/// acknowledges the delivery back to the platform off the request path.
pub async fn platform_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<PlatformEventRequest>,
) -> impl IntoResponse {
    match payload {
        PlatformEventRequest::ItemDrop {
            room_id,
            drop_id,
            contributor,
            item,
            pos,
        } => {
            let Some(room) = state.registry.get_room(room_id.trim()).await else {
                return room_not_found();
            };

            let pos = match pos {
                Some(p) if p.x.is_finite() && p.y.is_finite() => Vec2::from(p),
                Some(_) => return bad_request("pos must be finite"),
                None => {
                    let points = &state.tuning.items.spawn_points;
                    points[rand::thread_rng().gen_range(0..points.len())]
                }
            };

            let payload: crate::domain::item::ItemPayload = item.payload.into();
            let icon = item
                .icon
                .unwrap_or_else(|| default_icon(payload.category()).to_string());
            let world_item = WorldItem {
                id: allocate_item_id(payload.category(), &item.name),
                name: item.name,
                pos,
                payload,
                icon,
                origin: ItemOrigin::Contributor(contributor),
                created_at_ms: unix_millis(),
            };

            let item_id = world_item.id.clone();
            match room
                .events_tx
                .try_send(RoomEvent::PlatformDrop(DropRequest { item: world_item }))
            {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => return room_busy(),
                Err(mpsc::error::TrySendError::Closed(_)) => return room_not_found(),
            }

            info!(room_id = %room.room_id, %drop_id, %item_id, "platform item drop queued");
            acknowledge_in_background(&state, Ack::Drop, drop_id.clone());
            (StatusCode::ACCEPTED, Json(PlatformEventAccepted { id: drop_id }))
                .into_response()
        }
        PlatformEventRequest::BoostApplied {
            room_id,
            boost_id,
            player_id,
            amount,
            contributor,
        } => {
            let Ok(player_id) = player_id.parse::<u64>() else {
                return bad_request("player_id must be numeric");
            };
            if amount <= 0 {
                return bad_request("amount must be positive");
            }

            let Some(room) = state.registry.get_room(room_id.trim()).await else {
                return room_not_found();
            };

            match room.events_tx.try_send(RoomEvent::PlatformBoost {
                player_id,
                amount,
                contributor,
            }) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => return room_busy(),
                Err(mpsc::error::TrySendError::Closed(_)) => return room_not_found(),
            }

            info!(room_id = %room.room_id, %boost_id, player_id, "platform boost queued");
            acknowledge_in_background(&state, Ack::Boost, boost_id.clone());
            (StatusCode::ACCEPTED, Json(PlatformEventAccepted { id: boost_id }))
                .into_response()
        }
    }
}

fn default_icon(category: &str) -> &'static str {
    match category {
        "weapon" => "sword",
        "shield" => "shield",
        _ => "potion",
    }
}

enum Ack {
    Drop,
    Boost,
}

// Acknowledgement is best-effort; the platform retries unconfirmed
// deliveries and the room has already accepted the event.
fn acknowledge_in_background(state: &AppState, kind: Ack, id: String) {
    let platform = state.platform.clone();
    tokio::spawn(async move {
        let result = match kind {
            Ack::Drop => platform.acknowledge_drop(&id).await,
            Ack::Boost => platform.acknowledge_boost(&id).await,
        };
        if let Err(err) = result {
            warn!(%id, error = ?err, "platform acknowledgement failed");
        }
    });
}

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    rooms: usize,
}

pub async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.registry.room_count().await;
    Json(HealthResponse {
        status: "ok",
        rooms,
    })
}

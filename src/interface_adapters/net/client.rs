use crate::interface_adapters::protocol::{
    ClientMessage, JoinRejectReason, MovePayload, ServerMessage,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_conn_id;
use crate::use_cases::{LeaveReason, Outbound, RoomEvent, RoomHandle};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::SinkExt;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    EventsClosed,
    BroadcastClosed,
    HandshakeTimeout,
    JoinReplyDropped,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_PLAYER_NAME_LEN: usize = 32;
// Covers room creation plus the join that follows it.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Serializes each room event once and broadcasts the shared bytes to all
/// of the room's connections. Snapshots are additionally stored for lag
/// recovery. One serializer task runs per room.
pub async fn room_event_serializer(
    mut outbound_rx: broadcast::Receiver<Outbound>,
    bytes_tx: broadcast::Sender<Utf8Bytes>,
    latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match outbound_rx.recv().await {
            Ok(event) => {
                let msg = ServerMessage::from(&event);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize room event");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                if matches!(event, Outbound::Snapshot(_)) {
                    // Keep the latest authoritative snapshot for resync.
                    let _ = latest_tx.send(bytes.clone());
                }
                let _ = bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "room serializer lagged; skipping to latest");
            }
            Err(broadcast::error::RecvError::Closed) => {
                // Room task exited; nothing more to serialize.
                break;
            }
        }
    }
}

pub fn spawn_room_serializer(room: &RoomHandle) {
    tokio::spawn(room_event_serializer(
        room.outbound_tx.subscribe(),
        room.bytes_tx.clone(),
        room.latest_tx.clone(),
    ));
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // Connection id doubles as the player id once the client joins a room.
        let conn_id = next_conn_id();
        let span = info_span!("conn", conn_id);
        handle_socket(socket, state, conn_id).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, state: AppState, conn_id: u64) {
    let mut ctx = match bootstrap_connection(&mut socket, &state, conn_id).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before joining a room");
            return;
        }
        Err(NetError::HandshakeTimeout) => {
            info!("client never joined a room; closing");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "join timeout").await;
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed")
                .await;
            return;
        }
    };

    info!(
        room_id = %ctx.room.room_id,
        player_name = %ctx.player_name,
        "client joined room"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

struct ConnCtx {
    conn_id: u64,
    player_name: String,
    room: RoomHandle,
    bytes_rx: broadcast::Receiver<Utf8Bytes>,
    latest_rx: watch::Receiver<Utf8Bytes>,
    // Set once a Leave event has been delivered, so cleanup does not
    // double-report the departure.
    left: bool,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recovery_count: u64,

    last_events_full_log: Instant,
    last_lag_log: Instant,
    last_invalid_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    conn_id: u64,
) -> Result<ConnCtx, NetError> {
    match timeout(HANDSHAKE_TIMEOUT, read_handshake(socket, state, conn_id)).await {
        Ok(result) => result,
        Err(_) => Err(NetError::HandshakeTimeout),
    }
}

/// Drives the pre-join phase: the client may create a room, then must join
/// one. Join failures are surfaced as JoinRejected and the client may retry
/// with another code; everything else before a join is dropped.
async fn read_handshake(
    socket: &mut WebSocket,
    state: &AppState,
    conn_id: u64,
) -> Result<ConnCtx, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        let text = match message {
            Message::Text(text) => text,
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::ClosedBeforeJoin);
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::CreateRoom) => {
                let room = state.registry.create_room().await;
                // Serialize this room's events from the start so the first
                // joiner never misses a broadcast.
                spawn_room_serializer(&room);
                send_message(
                    socket,
                    &ServerMessage::RoomCreated {
                        room_id: room.room_id.to_string(),
                    },
                )
                .await?;
            }
            Ok(ClientMessage::JoinRoom(payload)) => {
                let player_name = payload.player_name.trim();
                if player_name.is_empty() || player_name.len() > MAX_PLAYER_NAME_LEN {
                    let _ = send_close_with_reason(
                        socket,
                        close_code::POLICY,
                        "invalid player name",
                    )
                    .await;
                    return Err(NetError::ClosedBeforeJoin);
                }

                let Some(room) = state.registry.get_room(payload.room_id.trim()).await else {
                    send_message(
                        socket,
                        &ServerMessage::JoinRejected {
                            reason: JoinRejectReason::RoomNotFound,
                        },
                    )
                    .await?;
                    continue;
                };

                // Subscribe before joining so the join broadcast itself is
                // never missed.
                let bytes_rx = room.bytes_tx.subscribe();
                let latest_rx = room.latest_tx.subscribe();

                let (reply_tx, reply_rx) = oneshot::channel();
                room.events_tx
                    .send(RoomEvent::Join {
                        conn_id,
                        name: player_name.to_string(),
                        reply: reply_tx,
                    })
                    .await
                    .map_err(|_| NetError::EventsClosed)?;

                match reply_rx.await.map_err(|_| NetError::JoinReplyDropped)? {
                    Ok(snapshot) => {
                        send_message(socket, &ServerMessage::RoomJoined((&snapshot).into()))
                            .await?;
                        let now = Instant::now() - LOG_THROTTLE;
                        return Ok(ConnCtx {
                            conn_id,
                            player_name: player_name.to_string(),
                            room,
                            bytes_rx,
                            latest_rx,
                            left: false,
                            msgs_in: 0,
                            msgs_out: 0,
                            bytes_in: 0,
                            bytes_out: 0,
                            invalid_json: 0,
                            lag_recovery_count: 0,
                            last_events_full_log: now,
                            last_lag_log: now,
                            last_invalid_log: now,
                            close_frame: None,
                        });
                    }
                    Err(err) => {
                        send_message(
                            socket,
                            &ServerMessage::JoinRejected { reason: err.into() },
                        )
                        .await?;
                    }
                }
            }
            Ok(_) => {
                // Gameplay messages before a join are out-of-state; drop them.
                debug!(conn_id, "pre-join gameplay message dropped");
            }
            Err(e) => {
                debug!(conn_id, error = %e, "invalid pre-join message dropped");
            }
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            // Incoming message from the client.
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing room broadcast.
            broadcast_msg = ctx.bytes_rx.recv() => {
                match broadcast_msg {
                    Ok(bytes) => {
                        match forward_bytes(bytes, socket, &mut ctx.msgs_out, &mut ctx.bytes_out).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_lag_log) {
                            warn!(missed = n, "room broadcast lagged; resyncing with snapshot");
                        }

                        // Resync strategy: send the latest authoritative snapshot.
                        let latest = ctx.latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.lag_recovery_count += 1;
                            match forward_bytes(latest, socket, &mut ctx.msgs_out, &mut ctx.bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // The room task exited (room torn down).
                        if ctx.left {
                            true
                        } else {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::NORMAL,
                                reason: "room closed".into(),
                            });
                            fatal = Some(NetError::BroadcastClosed);
                            true
                        }
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => dispatch_client_message(message, ctx).await,
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

/// Routes one parsed gameplay message into the room's event queue. The room
/// itself drops anything its current state forbids.
async fn dispatch_client_message(
    message: ClientMessage,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let event = match message {
        ClientMessage::Move(payload) => {
            let Some((pos, vel, flags)) = sanitize_move(payload) else {
                if should_log(&mut ctx.last_invalid_log) {
                    warn!("invalid move values (NaN/inf); dropping");
                }
                return Ok(LoopControl::Continue);
            };
            RoomEvent::Move {
                conn_id: ctx.conn_id,
                pos,
                vel,
                flags,
            }
        }
        ClientMessage::Attack => RoomEvent::Attack {
            conn_id: ctx.conn_id,
        },
        ClientMessage::Ready => RoomEvent::Ready {
            conn_id: ctx.conn_id,
        },
        ClientMessage::PickupItem { item_id } => RoomEvent::Pickup {
            conn_id: ctx.conn_id,
            item_id,
        },
        // Equip requests resolve through the same transfer path; the slot
        // is implied by the item's category.
        ClientMessage::EquipItem { item_id, slot: _ } => RoomEvent::Pickup {
            conn_id: ctx.conn_id,
            item_id,
        },
        ClientMessage::LeaveRoom => {
            ctx.room
                .events_tx
                .send(RoomEvent::Leave {
                    conn_id: ctx.conn_id,
                    reason: LeaveReason::Explicit,
                })
                .await
                .map_err(|_| NetError::EventsClosed)?;
            ctx.left = true;
            ctx.close_frame = Some(CloseFrame {
                code: close_code::NORMAL,
                reason: "left room".into(),
            });
            return Ok(LoopControl::Disconnect);
        }
        ClientMessage::CreateRoom | ClientMessage::JoinRoom(_) => {
            // One room per connection; repeated create/join is ignored.
            if should_log(&mut ctx.last_invalid_log) {
                warn!("create/join after join ignored");
            }
            return Ok(LoopControl::Continue);
        }
    };

    match ctx.room.events_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_)) => {
            if should_log(&mut ctx.last_events_full_log) {
                warn!("room event queue full; dropping message");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::EventsClosed),
    }
}

fn sanitize_move(
    payload: MovePayload,
) -> Option<(
    crate::domain::Vec2,
    crate::domain::Vec2,
    crate::domain::ControlFlags,
)> {
    let pos: crate::domain::Vec2 = payload.pos.into();
    let vel: crate::domain::Vec2 = payload.vel.into();
    if !pos.x.is_finite() || !pos.y.is_finite() || !vel.x.is_finite() || !vel.y.is_finite() {
        return None;
    }
    Some((pos, vel, payload.flags.into()))
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let len = bytes.len();
    match socket.send(Message::Text(bytes)).await {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect follows immediately.
            warn!(error = ?err, "failed to send room broadcast");
            LoopControl::Disconnect
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Reports the departure to the room unless an explicit leave already did.
/// Disconnection is immediate: the opponent wins by forfeit at once.
async fn disconnect_cleanup(ctx: &mut ConnCtx) -> Result<(), NetError> {
    if !ctx.left {
        // The room may already be gone; that is not an error here.
        let _ = ctx
            .room
            .events_tx
            .send(RoomEvent::Leave {
                conn_id: ctx.conn_id,
                reason: LeaveReason::Disconnected,
            })
            .await;
        ctx.left = true;
    }

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!(player_name = %ctx.player_name, "client disconnected");
    Ok(())
}

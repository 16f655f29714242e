// WebSocket connection handling. Connections never touch the game: they
// translate frames into `WorldEvent`s and forward serialized updates back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::SinkExt;
use tankwars_core::entity::ClientId;
use tankwars_core::game::Command;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::protocol::{sanitize_name, ClientMessage, ServerMessage};
use crate::world::WorldEvent;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub world_tx: mpsc::Sender<WorldEvent>,
    pub outbound_capacity: usize,
}

#[derive(Debug, thiserror::Error)]
enum NetError {
    #[error("websocket error")]
    Ws(#[from] axum::Error),
    #[error("failed to serialize message")]
    Serialization(#[from] serde_json::Error),
    #[error("world task is gone")]
    WorldClosed,
    #[error("too many invalid frames")]
    TooManyInvalid,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_FRAMES: u32 = 10;

/// Hands out connection ids, counting up from the wall clock at first use.
fn next_client_id() -> ClientId {
    static NEXT: OnceLock<AtomicU64> = OnceLock::new();
    let next = NEXT.get_or_init(|| AtomicU64::new(clock_seed()));
    ClientId::new(next.fetch_add(1, Ordering::Relaxed))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| u64::try_from(elapsed.as_nanos()).ok())
        .unwrap_or(u64::MAX / 2)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let client = next_client_id();
        handle_socket(socket, state, client).instrument(info_span!("conn", %client))
    })
}

pub async fn health() -> &'static str {
    "ok"
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, client: ClientId) {
    let (outbound_tx, mut outbound_rx) = mpsc::channel(state.outbound_capacity);
    if state
        .world_tx
        .send(WorldEvent::Connect {
            client,
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        warn!("world task is gone; refusing connection");
        let _ = socket.close().await;
        return;
    }
    info!("client connected");

    let mut conn = Conn::new(client, state.world_tx.clone());
    let result = loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(Ok(frame)) = incoming else {
                    break Ok(());
                };
                match conn.handle_frame(frame).await {
                    Ok(Some(reply)) => {
                        if let Err(e) = send_message(&mut socket, &reply).await {
                            break Err(e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => break Err(e),
                }
            }
            update = outbound_rx.recv() => {
                let Some(bytes) = update else {
                    break Err(NetError::WorldClosed);
                };
                if let Err(e) = socket.send(Message::Text(bytes)).await {
                    break Err(NetError::Ws(e));
                }
            }
        }
    };

    if let Err(e) = result {
        warn!(error = %e, "connection ended with error");
    }
    let _ = socket.close().await;
    if state
        .world_tx
        .send(WorldEvent::Disconnect { client })
        .await
        .is_err()
    {
        debug!("world task gone before disconnect");
    }
    info!(invalid_frames = conn.invalid_frames, "client disconnected");
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), NetError> {
    let txt = serde_json::to_string(msg)?;
    socket.send(Message::Text(Utf8Bytes::from(txt))).await?;
    Ok(())
}

/// Per-connection protocol state, kept free of the socket so it can be
/// tested without one.
struct Conn {
    client: ClientId,
    world_tx: mpsc::Sender<WorldEvent>,
    joined: bool,
    invalid_frames: u32,
    last_invalid_log: Instant,
    last_full_log: Instant,
}

impl Conn {
    fn new(client: ClientId, world_tx: mpsc::Sender<WorldEvent>) -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            client,
            world_tx,
            joined: false,
            invalid_frames: 0,
            last_invalid_log: now,
            last_full_log: now,
        }
    }

    /// Handles one inbound frame, returning a reply to send if any.
    async fn handle_frame(&mut self, frame: Message) -> Result<Option<ServerMessage>, NetError> {
        // Pings are answered by axum; binary frames are not part of the protocol.
        let Message::Text(text) = frame else {
            return Ok(None);
        };
        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                self.invalid_frames += 1;
                if should_log(&mut self.last_invalid_log) {
                    warn!(error = %e, count = self.invalid_frames, "invalid frame");
                }
                if self.invalid_frames >= MAX_INVALID_FRAMES {
                    Err(NetError::TooManyInvalid)
                } else {
                    Ok(None)
                }
            }
        }
    }

    async fn handle_message(
        &mut self,
        msg: ClientMessage,
    ) -> Result<Option<ServerMessage>, NetError> {
        match msg {
            ClientMessage::NewPlayer { name } => {
                if self.joined {
                    warn!("duplicate new-player ignored");
                    return Ok(None);
                }
                // Membership changes wait for room; only inputs may be dropped.
                self.world_tx
                    .send(WorldEvent::Command(Command::AddPlayer {
                        client: self.client,
                        name: sanitize_name(&name),
                    }))
                    .await
                    .map_err(|_| NetError::WorldClosed)?;
                self.joined = true;
                Ok(Some(ServerMessage::NewPlayerAck {
                    client_id: self.client,
                }))
            }
            ClientMessage::PlayerAction(action) => {
                self.forward(Command::Action {
                    client: self.client,
                    action,
                })?;
                Ok(None)
            }
        }
    }

    /// Queues an input without waiting; a full queue drops it.
    fn forward(&mut self, command: Command) -> Result<(), NetError> {
        match self.world_tx.try_send(WorldEvent::Command(command)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                if should_log(&mut self.last_full_log) {
                    warn!("command channel full; dropping input");
                }
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(NetError::WorldClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_PLAYER: &str = r#"{"type":"new-player","data":{"name":"ace"}}"#;
    const IDLE: &str = r#"{"type":"player-action","data":{}}"#;

    fn conn(capacity: usize) -> (Conn, mpsc::Receiver<WorldEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Conn::new(ClientId::new(7), tx), rx)
    }

    fn text(s: &str) -> Message {
        Message::Text(Utf8Bytes::from(s.to_string()))
    }

    fn is_ack(reply: &Option<ServerMessage>) -> bool {
        matches!(
            reply,
            Some(ServerMessage::NewPlayerAck { client_id }) if *client_id == ClientId::new(7)
        )
    }

    #[test]
    fn client_ids_are_unique_and_increasing() {
        let a = next_client_id();
        let b = next_client_id();
        assert!(b > a);
    }

    #[tokio::test]
    async fn new_player_is_forwarded_and_acked() {
        let (mut conn, mut rx) = conn(4);
        let reply = conn
            .handle_frame(text(r#"{"type":"new-player","data":{"name":" ace "}}"#))
            .await
            .unwrap();

        assert!(is_ack(&reply));
        assert!(matches!(
            rx.try_recv(),
            Ok(WorldEvent::Command(Command::AddPlayer { name, .. })) if name == "ace"
        ));
    }

    #[tokio::test]
    async fn second_new_player_is_ignored() {
        let (mut conn, mut rx) = conn(4);
        conn.handle_frame(text(NEW_PLAYER)).await.unwrap();
        let reply = conn.handle_frame(text(NEW_PLAYER)).await.unwrap();

        assert!(reply.is_none());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn new_player_waits_for_room_in_a_full_queue() {
        let (mut conn, mut rx) = conn(1);
        conn.handle_frame(text(IDLE)).await.unwrap();

        let (reply, queued) = tokio::join!(conn.handle_frame(text(NEW_PLAYER)), async {
            let first = rx.recv().await;
            let second = rx.recv().await;
            (first, second)
        });

        assert!(is_ack(&reply.unwrap()));
        assert!(matches!(
            queued.0,
            Some(WorldEvent::Command(Command::Action { .. }))
        ));
        assert!(matches!(
            queued.1,
            Some(WorldEvent::Command(Command::AddPlayer { .. }))
        ));
    }

    #[tokio::test]
    async fn join_against_closed_world_stays_unjoined() {
        let (mut conn, rx) = conn(1);
        drop(rx);
        let result = conn.handle_frame(text(NEW_PLAYER)).await;

        assert!(matches!(result, Err(NetError::WorldClosed)));
        assert!(!conn.joined);
    }

    #[tokio::test]
    async fn actions_are_forwarded() {
        let (mut conn, mut rx) = conn(4);
        conn.handle_frame(text(r#"{"type":"player-action","data":{"shoot":true}}"#))
            .await
            .unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(WorldEvent::Command(Command::Action { action, .. })) if action.shoot
        ));
    }

    #[tokio::test]
    async fn badly_typed_action_fields_are_not_invalid_frames() {
        let (mut conn, mut rx) = conn(4);
        conn.handle_frame(text(
            r#"{"type":"player-action","data":{"up":null,"down":false,"turretAngle":1.0}}"#,
        ))
        .await
        .unwrap();

        assert_eq!(conn.invalid_frames, 0);
        assert!(matches!(
            rx.try_recv(),
            Ok(WorldEvent::Command(Command::Action { action, .. }))
                if !action.up && action.turret_angle == Some(1.0)
        ));
    }

    #[tokio::test]
    async fn full_queue_drops_actions_without_error() {
        let (mut conn, _rx) = conn(1);
        assert!(conn.handle_frame(text(IDLE)).await.is_ok());
        assert!(conn.handle_frame(text(IDLE)).await.is_ok());
    }

    #[tokio::test]
    async fn closed_world_is_an_error() {
        let (mut conn, rx) = conn(1);
        drop(rx);
        let result = conn.handle_frame(text(IDLE)).await;
        assert!(matches!(result, Err(NetError::WorldClosed)));
    }

    #[tokio::test]
    async fn repeated_garbage_ends_the_connection() {
        let (mut conn, _rx) = conn(1);
        for _ in 1..MAX_INVALID_FRAMES {
            assert!(conn.handle_frame(text("not json")).await.is_ok());
        }
        assert!(matches!(
            conn.handle_frame(text("not json")).await,
            Err(NetError::TooManyInvalid)
        ));
    }
}

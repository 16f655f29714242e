// The tick task: sole owner of the `Game`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::extract::ws::Utf8Bytes;
use tankwars_core::entity::ClientId;
use tankwars_core::event::TickEvent;
use tankwars_core::game::{Command, Game};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::protocol::ServerMessage;

/// Everything connections can ask of the tick task.
#[derive(Debug)]
pub enum WorldEvent {
    // A socket opened; `outbound` receives its serialized updates.
    Connect {
        client: ClientId,
        outbound: mpsc::Sender<Utf8Bytes>,
    },
    // A socket closed.
    Disconnect { client: ClientId },
    // A gameplay request for the next tick.
    Command(Command),
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

struct Outbound {
    tx: mpsc::Sender<Utf8Bytes>,
    dropped: u64,
    last_drop_log: Option<Instant>,
}

/// The game plus the outbound channel of every open connection.
pub struct World {
    game: Game,
    outbound: BTreeMap<ClientId, Outbound>,
}

impl World {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            outbound: BTreeMap::new(),
        }
    }

    pub fn handle(&mut self, event: WorldEvent) {
        match event {
            WorldEvent::Connect { client, outbound } => {
                debug!(%client, "connection registered");
                self.outbound.insert(
                    client,
                    Outbound {
                        tx: outbound,
                        dropped: 0,
                        last_drop_log: None,
                    },
                );
            }
            WorldEvent::Disconnect { client } => {
                if let Some(out) = self.outbound.remove(&client) {
                    if out.dropped > 0 {
                        info!(%client, dropped = out.dropped, "connection closed after dropping updates");
                    }
                }
                self.game.enqueue(Command::RemovePlayer { client });
            }
            WorldEvent::Command(command) => self.game.enqueue(command),
        }
    }

    /// Runs one tick at `now` ms and pushes each snapshot to its client.
    pub fn tick(&mut self, now: f64) {
        let out = self.game.step(now);
        for event in &out.events {
            if let TickEvent::PlayerKilled { victim, killer } = event {
                debug!(tick = out.tick, %victim, ?killer, "kill");
            }
        }

        let mut closed = Vec::new();
        for snapshot in out.snapshots {
            let Some(conn) = self.outbound.get_mut(&snapshot.client) else {
                continue;
            };
            let txt = match serde_json::to_string(&ServerMessage::Update(snapshot.update)) {
                Ok(txt) => txt,
                Err(e) => {
                    error!(error = %e, "failed to serialize update");
                    continue;
                }
            };
            match conn.tx.try_send(Utf8Bytes::from(txt)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    conn.dropped += 1;
                    let due = conn
                        .last_drop_log
                        .map_or(true, |last| last.elapsed() >= LOG_THROTTLE);
                    if due {
                        conn.last_drop_log = Some(Instant::now());
                        warn!(client = %snapshot.client, dropped = conn.dropped, "client lagging; dropping update");
                    }
                }
                Err(TrySendError::Closed(_)) => closed.push(snapshot.client),
            }
        }
        for client in closed {
            self.outbound.remove(&client);
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }
}

/// Drives the world at a fixed interval until every command sender is gone.
///
/// An overrunning tick is followed immediately by the next one; missed ticks
/// are not replayed.
pub async fn world_task(mut events: mpsc::Receiver<WorldEvent>, mut world: World, tick_interval: Duration) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let start = Instant::now();
    info!(seed = world.game().seed(), ?tick_interval, "tick task started");

    loop {
        interval.tick().await;

        loop {
            match events.try_recv() {
                Ok(event) => world.handle(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!(ticks = world.game().tick(), "world event channel closed; stopping tick task");
                    return;
                }
            }
        }

        world.tick(start.elapsed().as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankwars_core::input::PlayerAction;
    use tankwars_core::GameConfig;

    fn world() -> World {
        World::new(Game::new(GameConfig::default(), 3))
    }

    fn join(world: &mut World, client: ClientId, capacity: usize) -> mpsc::Receiver<Utf8Bytes> {
        let (tx, rx) = mpsc::channel(capacity);
        world.handle(WorldEvent::Connect {
            client,
            outbound: tx,
        });
        world.handle(WorldEvent::Command(Command::AddPlayer {
            client,
            name: format!("c{client}"),
        }));
        rx
    }

    #[test]
    fn tick_delivers_update_to_each_client() {
        let mut world = world();
        let mut a = join(&mut world, ClientId::new(1), 4);
        let mut b = join(&mut world, ClientId::new(2), 4);

        world.tick(0.0);

        for rx in [&mut a, &mut b] {
            let msg = rx.try_recv().unwrap();
            let json: serde_json::Value = serde_json::from_str(msg.as_str()).unwrap();
            assert_eq!(json["type"], "update");
            assert_eq!(json["data"]["players"].as_array().map(Vec::len), Some(2));
        }
    }

    #[test]
    fn full_channel_drops_frames_without_blocking() {
        let mut world = world();
        let mut rx = join(&mut world, ClientId::new(1), 1);

        world.tick(0.0);
        world.tick(16.0);
        world.tick(32.0);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(world.outbound[&ClientId::new(1)].dropped, 2);
    }

    #[test]
    fn disconnect_removes_player_next_tick() {
        let mut world = world();
        let _rx = join(&mut world, ClientId::new(1), 4);
        world.tick(0.0);
        assert!(world.game().is_registered(ClientId::new(1)));

        world.handle(WorldEvent::Disconnect {
            client: ClientId::new(1),
        });
        assert!(world.game().is_registered(ClientId::new(1)));

        world.tick(16.0);
        assert!(!world.game().is_registered(ClientId::new(1)));
        assert!(world.outbound.is_empty());
    }

    #[test]
    fn closed_receiver_is_forgotten() {
        let mut world = world();
        let rx = join(&mut world, ClientId::new(1), 4);
        drop(rx);

        world.tick(0.0);
        assert!(world.outbound.is_empty());
    }

    #[tokio::test]
    async fn task_applies_commands_and_streams_updates() {
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let handle = tokio::spawn(world_task(rx, world(), Duration::from_millis(5)));

        let client = ClientId::new(9);
        tx.send(WorldEvent::Connect {
            client,
            outbound: out_tx,
        })
        .await
        .unwrap();
        tx.send(WorldEvent::Command(Command::AddPlayer {
            client,
            name: "nine".into(),
        }))
        .await
        .unwrap();
        tx.send(WorldEvent::Command(Command::Action {
            client,
            action: PlayerAction::default(),
        }))
        .await
        .unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(2), out_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(msg.as_str().contains("\"self\""));

        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

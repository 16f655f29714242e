//! Per-client state snapshots.
//!
//! The shared lists are captured once per tick by [`WorldView::capture`];
//! each client's [`Snapshot`] then pairs them with its own player view.

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{ClientId, EntityKind, PowerupKind};
use crate::math::Vector;

/// An active effect as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerup {
    /// Effect kind.
    pub kind: PowerupKind,
    /// Milliseconds until it wears off.
    pub remaining: f64,
}

/// A player as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Packed entity handle.
    pub id: u64,
    /// Owning connection.
    pub client_id: ClientId,
    /// Display name.
    pub name: String,
    /// Position in world units.
    pub position: Vector,
    /// Hull heading in radians.
    pub tank_angle: f64,
    /// Turret heading in radians.
    pub turret_angle: f64,
    /// Remaining health.
    pub health: u32,
    /// Opponents destroyed.
    pub kills: u32,
    /// Times destroyed.
    pub deaths: u32,
    /// Active effects in kind order.
    pub powerups: Vec<ActivePowerup>,
}

/// A projectile as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    /// Packed entity handle.
    pub id: u64,
    /// Position in world units.
    pub position: Vector,
    /// Heading in radians.
    pub angle: f64,
    /// Shooter's connection, `None` once the shooter has left.
    pub source: Option<ClientId>,
}

/// A pickup as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupView {
    /// Packed entity handle.
    pub id: u64,
    /// Pickup kind.
    pub kind: PowerupKind,
    /// Position in world units.
    pub position: Vector,
}

/// Everything every client sees, captured once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldView {
    /// All players, including the receiver.
    pub players: Vec<PlayerView>,
    /// All bullets in flight.
    pub projectiles: Vec<BulletView>,
    /// All pickups on the map.
    pub powerups: Vec<PowerupView>,
}

impl WorldView {
    /// Captures the arena in slot order. Destroyed entities are skipped.
    #[must_use]
    pub fn capture(arena: &Arena, now: f64) -> Self {
        let mut view = Self::default();
        for entity in arena.iter().filter(|e| !e.is_destroyed()) {
            let id = entity.id().to_bits();
            let position = entity.body().position();
            match entity.kind() {
                EntityKind::Player(player) => view.players.push(PlayerView {
                    id,
                    client_id: player.client_id,
                    name: player.name.clone(),
                    position,
                    tank_angle: player.tank_angle,
                    turret_angle: player.turret_angle,
                    health: player.health,
                    kills: player.kills,
                    deaths: player.deaths,
                    powerups: player
                        .powerups
                        .iter()
                        .map(|(kind, state)| ActivePowerup {
                            kind: *kind,
                            remaining: state.remaining(now),
                        })
                        .collect(),
                }),
                EntityKind::Bullet(bullet) => view.projectiles.push(BulletView {
                    id,
                    position,
                    angle: bullet.angle,
                    source: arena
                        .get(bullet.source)
                        .and_then(|e| e.as_player())
                        .map(|p| p.client_id),
                }),
                EntityKind::Powerup(powerup) => view.powerups.push(PowerupView {
                    id,
                    kind: powerup.kind(),
                    position,
                }),
            }
        }
        view
    }

    /// Builds the snapshot for one client, or `None` if it has no player.
    #[must_use]
    pub fn for_client(&self, client: ClientId) -> Option<Snapshot> {
        let own = self.players.iter().find(|p| p.client_id == client)?;
        Some(Snapshot {
            self_player: own.clone(),
            players: self.players.clone(),
            projectiles: self.projectiles.clone(),
            powerups: self.powerups.clone(),
        })
    }
}

/// The `update` payload sent to one client every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The receiving client's own player, duplicated from `players`.
    #[serde(rename = "self")]
    pub self_player: PlayerView,
    /// All players, including the receiver.
    pub players: Vec<PlayerView>,
    /// All bullets in flight.
    pub projectiles: Vec<BulletView>,
    /// All pickups on the map.
    pub powerups: Vec<PowerupView>,
}

/// A snapshot addressed to its client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    /// Recipient.
    pub client: ClientId,
    /// Payload.
    pub update: Snapshot,
}

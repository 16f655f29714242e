//! Gameplay events produced by a tick.
//!
//! Events describe what happened, not what to do: the tick has already
//! applied their effects by the time they are returned. They feed logs and
//! tests and are never broadcast.

use serde::{Deserialize, Serialize};

use crate::entity::{ClientId, PowerupKind};

/// Something observable that happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickEvent {
    /// A client's player entered the arena.
    PlayerJoined {
        /// Owning connection.
        client: ClientId,
        /// Display name.
        name: String,
    },
    /// A client's player was removed.
    PlayerLeft {
        /// Owning connection.
        client: ClientId,
    },
    /// A bullet hit a player without killing it.
    PlayerHit {
        /// Player that was hit.
        victim: ClientId,
        /// Shooter, if still connected.
        shooter: Option<ClientId>,
        /// Victim's health after the hit.
        health: u32,
    },
    /// A bullet reduced a player to zero health; the player has respawned.
    PlayerKilled {
        /// Player that died.
        victim: ClientId,
        /// Shooter credited with the kill, if still connected.
        killer: Option<ClientId>,
    },
    /// A player picked up a powerup.
    PowerupCollected {
        /// Collecting player.
        client: ClientId,
        /// Pickup kind.
        kind: PowerupKind,
    },
    /// Two bullets from different shooters destroyed each other.
    BulletsCancelled,
}

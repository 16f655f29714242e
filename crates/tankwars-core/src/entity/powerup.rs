//! Pickups lying on the map.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::physics::{Body, Hitbox, Physics};
use crate::powerup_state::PowerupState;

/// Kind of pickup; a player holds at most one active state per kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerupKind {
    /// Instant heal.
    HealthPack,
    /// Spread shot.
    Shotgun,
    /// Shorter cooldown.
    Rapidfire,
    /// Faster movement.
    Speedboost,
    /// Damage absorption.
    Shield,
}

impl PowerupKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::HealthPack,
        Self::Shotgun,
        Self::Rapidfire,
        Self::Speedboost,
        Self::Shield,
    ];
}

/// A pickup: the effect a player receives on contact.
#[derive(Debug, Clone, PartialEq)]
pub struct Powerup {
    state: PowerupState,
}

impl Powerup {
    /// Wraps an unapplied effect.
    #[must_use]
    pub const fn new(state: PowerupState) -> Self {
        Self { state }
    }

    /// Creates a pickup of random kind and payload at a random position.
    pub fn create<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> (Body, Self) {
        let kind = PowerupKind::ALL[rng.gen_range(0..PowerupKind::ALL.len())];
        let state = PowerupState::roll(kind, &config.powerup, rng);
        let position = config.world.random_position(rng);
        let body = Body::new(
            Physics::at(position),
            Hitbox::new(config.powerup.hitbox_radius),
        );
        (body, Self::new(state))
    }

    /// Pickup kind.
    #[must_use]
    pub const fn kind(&self) -> PowerupKind {
        self.state.kind()
    }

    /// The effect granted on pickup.
    #[must_use]
    pub const fn state(&self) -> &PowerupState {
        &self.state
    }
}

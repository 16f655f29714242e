//! Active powerup effects held by a player.
//!
//! A [`PowerupState`] is a closed tagged union ([`Effect`]) plus an expiry
//! clock. Each effect has three hooks:
//!
//! - `apply`: starts the clock and changes the player's stats
//! - `update`: marks the state expired once the clock runs out
//! - `remove`: restores whatever `apply` changed
//!
//! The health pack is a one-shot effect: it expires inside `apply`. The shield
//! uses a charge counter that absorbs damage and expires the state when it
//! reaches zero.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{PlayerTuning, PowerupTuning};
use crate::entity::{Player, PowerupKind};

/// Kind-specific payload of a powerup, drawn from the tuning ranges at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    /// Restore health once.
    #[serde(rename = "HEALTH_PACK")]
    Heal {
        /// Health restored, capped at the maximum.
        amount: u32,
    },
    /// Fire extra pellet pairs with every shot.
    Shotgun {
        /// Number of extra pellet pairs.
        bonus: u32,
    },
    /// Divide the shot cooldown.
    Rapidfire {
        /// Fire-rate multiplier.
        multiplier: f64,
    },
    /// Multiply the movement speed.
    Speedboost {
        /// Speed multiplier.
        multiplier: f64,
    },
    /// Absorb incoming damage.
    Shield {
        /// Damage left to absorb.
        charge: u32,
    },
}

impl Effect {
    /// Returns the pickup kind of this effect.
    #[must_use]
    pub const fn kind(&self) -> PowerupKind {
        match self {
            Self::Heal { .. } => PowerupKind::HealthPack,
            Self::Shotgun { .. } => PowerupKind::Shotgun,
            Self::Rapidfire { .. } => PowerupKind::Rapidfire,
            Self::Speedboost { .. } => PowerupKind::Speedboost,
            Self::Shield { .. } => PowerupKind::Shield,
        }
    }

    /// Draws the payload for `kind` from the tuning ranges.
    pub fn roll<R: Rng + ?Sized>(kind: PowerupKind, tuning: &PowerupTuning, rng: &mut R) -> Self {
        match kind {
            PowerupKind::HealthPack => Self::Heal {
                amount: tuning.heal.sample_whole(rng),
            },
            PowerupKind::Shotgun => Self::Shotgun {
                bonus: tuning.shotgun_bonus.sample_whole(rng),
            },
            PowerupKind::Rapidfire => Self::Rapidfire {
                multiplier: tuning.rapidfire_multiplier.sample(rng),
            },
            PowerupKind::Speedboost => Self::Speedboost {
                multiplier: tuning.speedboost_multiplier.sample(rng),
            },
            PowerupKind::Shield => Self::Shield {
                charge: tuning.shield_charge.sample_whole(rng),
            },
        }
    }
}

/// An effect with its expiry clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerupState {
    /// Kind-specific payload.
    pub effect: Effect,
    /// Lifetime in milliseconds, counted from `apply`.
    pub duration: f64,
    /// Game time at which the effect ends; set by `apply`.
    pub expiration_time: f64,
    /// Set once the effect has run out.
    pub expired: bool,
}

impl PowerupState {
    /// Creates an unapplied state.
    #[must_use]
    pub const fn new(effect: Effect, duration: f64) -> Self {
        Self {
            effect,
            duration,
            expiration_time: 0.0,
            expired: false,
        }
    }

    /// Draws a fresh state of the given kind.
    pub fn roll<R: Rng + ?Sized>(kind: PowerupKind, tuning: &PowerupTuning, rng: &mut R) -> Self {
        let effect = Effect::roll(kind, tuning, rng);
        Self::new(effect, tuning.duration.sample(rng))
    }

    /// Kind of the wrapped effect.
    #[must_use]
    pub const fn kind(&self) -> PowerupKind {
        self.effect.kind()
    }

    /// Starts the clock at `now` and applies the effect to `player`.
    pub fn apply(&mut self, player: &mut Player, now: f64, tuning: &PlayerTuning) {
        self.expiration_time = now + self.duration;
        match self.effect {
            Effect::Heal { amount } => {
                player.heal(amount, tuning.max_health);
                self.expired = true;
            }
            Effect::Rapidfire { multiplier } => {
                player.shot_cooldown = tuning.shot_cooldown / multiplier;
            }
            Effect::Speedboost { multiplier } => {
                player.speed = tuning.speed * multiplier;
            }
            // Read by the player when firing and when taking damage.
            Effect::Shotgun { .. } | Effect::Shield { .. } => {}
        }
    }

    /// Reverts whatever [`PowerupState::apply`] changed.
    pub fn remove(&self, player: &mut Player, tuning: &PlayerTuning) {
        match self.effect {
            Effect::Rapidfire { .. } => player.shot_cooldown = tuning.shot_cooldown,
            Effect::Speedboost { .. } => player.speed = tuning.speed,
            Effect::Heal { .. } | Effect::Shotgun { .. } | Effect::Shield { .. } => {}
        }
    }

    /// Marks the state expired once `now` reaches the expiration time.
    pub fn update(&mut self, now: f64) {
        if now >= self.expiration_time {
            self.expired = true;
        }
    }

    /// Absorbs up to `amount` damage into a shield's charge.
    ///
    /// Returns the damage left over. Non-shield states absorb nothing. A
    /// drained shield is marked expired.
    pub fn absorb(&mut self, amount: u32) -> u32 {
        let Effect::Shield { charge } = &mut self.effect else {
            return amount;
        };
        if self.expired {
            return amount;
        }
        let absorbed = amount.min(*charge);
        *charge -= absorbed;
        if *charge == 0 {
            self.expired = true;
        }
        amount - absorbed
    }

    /// Extra pellet pairs granted by a shotgun state, zero otherwise.
    #[must_use]
    pub const fn shotgun_bonus(&self) -> u32 {
        match self.effect {
            Effect::Shotgun { bonus } if !self.expired => bonus,
            _ => 0,
        }
    }

    /// Milliseconds left before expiry at `now`, never negative.
    #[must_use]
    pub fn remaining(&self, now: f64) -> f64 {
        (self.expiration_time - now).max(0.0)
    }
}

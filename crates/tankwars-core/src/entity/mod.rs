//! Entity types for the tank battle simulation.
//!
//! This module provides the core entity types:
//! - [`EntityId`]: Generation-tagged handle into the [`Arena`](crate::arena::Arena)
//! - [`ClientId`]: Stable identity of a network connection
//! - [`EntityTag`]: Kind classification used for collision dispatch
//! - [`EntityKind`]: Kind-specific state ([`Player`], [`Bullet`], [`Powerup`])
//! - [`Entity`]: A [`Body`] plus its kind and destroyed flag
//!
//! # Architecture
//!
//! Entities are composed, not inherited: every entity owns one `Body`
//! (physics + hitbox), and per-kind behavior is selected by matching on
//! [`EntityKind`]. Cross-entity references (a bullet's source) are stored as
//! [`EntityId`]s and resolved through the arena, so a reference to a removed
//! entity turns into a lookup miss.
//!
//! # Example
//!
//! ```
//! use tankwars_core::entity::{Entity, EntityId, EntityKind, EntityTag, Powerup, PowerupKind};
//! use tankwars_core::physics::{Body, Hitbox, Physics};
//! use tankwars_core::powerup_state::{Effect, PowerupState};
//! use glam::DVec2;
//!
//! let pickup = Entity::new(
//!     EntityId::new(0, 0),
//!     Body::new(Physics::at(DVec2::new(10.0, 10.0)), Hitbox::new(5.0)),
//!     EntityKind::Powerup(Powerup::new(PowerupState::new(Effect::Shield { charge: 2 }, 5000.0))),
//! );
//!
//! assert_eq!(pickup.tag(), EntityTag::Powerup);
//! assert_eq!(pickup.as_powerup().unwrap().kind(), PowerupKind::Shield);
//! ```

mod bullet;
mod player;
mod powerup;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use bullet::{Bullet, BulletSpawn};
pub use player::Player;
pub use powerup::{Powerup, PowerupKind};

use crate::config::GameConfig;
use crate::physics::Body;

/// Generation-tagged handle to an entity slot in the arena.
///
/// The `index` selects a slot; the `generation` is bumped every time the slot
/// is reused, so a handle to a despawned entity never aliases its successor.
///
/// # Example
///
/// ```
/// use tankwars_core::entity::EntityId;
///
/// let id = EntityId::new(3, 1);
/// assert_eq!(id.index(), 3);
/// assert_eq!(id.generation(), 1);
/// assert_eq!(id.to_bits(), (1 << 32) | 3);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the arena.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Packs the handle into one `u64` (generation in the high half).
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Identity of a connected client (the connection id).
///
/// Unique among live connections and stable for the lifetime of a socket.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u64);

impl ClientId {
    /// Wraps a raw connection id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw connection id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Entity kind classification.
///
/// Variants are ordered so that collision dispatch can canonicalize an
/// unordered pair by sorting it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// A connected player's tank.
    Player,
    /// A projectile in flight.
    Bullet,
    /// A pickup waiting to be collected.
    Powerup,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Bullet => write!(f, "Bullet"),
            Self::Powerup => write!(f, "Powerup"),
        }
    }
}

/// Kind-specific entity state.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Tank state.
    Player(Player),
    /// Projectile state.
    Bullet(Bullet),
    /// Pickup state.
    Powerup(Powerup),
}

impl EntityKind {
    /// Returns the tag matching this variant.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Player(_) => EntityTag::Player,
            Self::Bullet(_) => EntityTag::Bullet,
            Self::Powerup(_) => EntityTag::Powerup,
        }
    }
}

/// Simulation clock passed to every `update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Game time of this tick in milliseconds.
    pub now: f64,
    /// Milliseconds elapsed since the previous tick.
    pub dt: f64,
}

/// A live simulated object.
///
/// # Invariants
///
/// - The `EntityId` is unique among live entities in an arena
/// - Once `destroyed` is set it is never cleared; the entity is pruned at the
///   end of the tick
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    body: Body,
    destroyed: bool,
    kind: EntityKind,
}

impl Entity {
    /// Creates a live entity.
    #[must_use]
    pub const fn new(id: EntityId, body: Body, kind: EntityKind) -> Self {
        Self {
            id,
            body,
            destroyed: false,
            kind,
        }
    }

    /// Returns the entity's handle.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's kind tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    /// Physics and hitbox.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable physics and hitbox.
    #[must_use]
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Kind-specific state.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Returns `true` once the entity has been marked for removal.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Marks the entity for removal at the end of the tick.
    ///
    /// Idempotent. Returns `true` only for the call that changed the flag, so
    /// callers can attach one-time side effects to it.
    pub fn destroy(&mut self) -> bool {
        !std::mem::replace(&mut self.destroyed, true)
    }

    /// Advances the entity by one tick.
    ///
    /// Players move, turn, tick their powerups and may fire; the returned
    /// bullets are spawned by the caller after the update pass. Bullets move
    /// and may destroy themselves. Powerups do nothing.
    pub fn update(&mut self, frame: &Frame, config: &GameConfig) -> Vec<BulletSpawn> {
        if self.destroyed {
            return Vec::new();
        }
        match &mut self.kind {
            EntityKind::Player(player) => player.update(self.id, &mut self.body, frame, config),
            EntityKind::Bullet(bullet) => {
                if !bullet.update(&mut self.body, frame.dt, config) {
                    self.destroyed = true;
                }
                Vec::new()
            }
            EntityKind::Powerup(_) => Vec::new(),
        }
    }

    /// Returns `true` if this entity is a player.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    /// Player state, if this is a player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Mutable player state, if this is a player.
    #[must_use]
    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Player state together with its body, for effects that touch both.
    #[must_use]
    pub fn player_parts_mut(&mut self) -> Option<(&mut Body, &mut Player)> {
        match &mut self.kind {
            EntityKind::Player(player) => Some((&mut self.body, player)),
            _ => None,
        }
    }

    /// Bullet state, if this is a bullet.
    #[must_use]
    pub const fn as_bullet(&self) -> Option<&Bullet> {
        match &self.kind {
            EntityKind::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    /// Powerup state, if this is a powerup.
    #[must_use]
    pub const fn as_powerup(&self) -> Option<&Powerup> {
        match &self.kind {
            EntityKind::Powerup(powerup) => Some(powerup),
            _ => None,
        }
    }
}

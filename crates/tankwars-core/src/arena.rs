//! Arena module for the live entity set.
//!
//! The Arena owns every entity in a game. It provides:
//! - Generation-tagged handles ([`EntityId`]) that go stale on despawn
//! - Deterministic iteration in slot order
//! - End-of-tick pruning of destroyed entities
//!
//! # Architecture
//!
//! Entities live in a `Vec` of slots. A despawned slot keeps its generation
//! and goes on a free list; the next spawn into it bumps the generation, so
//! old handles resolve to `None` instead of to the new occupant.
//!
//! # Example
//!
//! ```
//! use tankwars_core::arena::Arena;
//! use tankwars_core::entity::{EntityKind, Powerup};
//! use tankwars_core::physics::{Body, Hitbox, Physics};
//! use tankwars_core::powerup_state::{Effect, PowerupState};
//! use glam::DVec2;
//!
//! let mut arena = Arena::new();
//! let body = Body::new(Physics::at(DVec2::new(1.0, 2.0)), Hitbox::new(5.0));
//! let kind = EntityKind::Powerup(Powerup::new(PowerupState::new(Effect::Heal { amount: 1 }, 0.0)));
//!
//! let first = arena.spawn(body, kind.clone());
//! arena.despawn(first);
//! let second = arena.spawn(body, kind);
//!
//! // Same slot, new generation: the old handle is stale.
//! assert_eq!(first.index(), second.index());
//! assert!(arena.get(first).is_none());
//! assert!(arena.get(second).is_some());
//! ```

use crate::entity::{Entity, EntityId, EntityKind, EntityTag};
use crate::physics::Body;

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Container for all live entities.
///
/// # Determinism
///
/// Iteration follows slot order and slots are reused LIFO, so the same
/// sequence of spawns and despawns always yields the same ids and order.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entity and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be needed.
    pub fn spawn(&mut self, body: Body, kind: EntityKind) -> EntityId {
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            EntityId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).expect("arena slot count exceeds u32");
            self.slots.push(Slot {
                generation: 0,
                entity: None,
            });
            EntityId::new(index, 0)
        };
        self.slots[id.index() as usize].entity = Some(Entity::new(id, body, kind));
        self.len += 1;
        id
    }

    /// Removes an entity, returning it if the handle was live.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let entity = slot.entity.take()?;
        self.free.push(id.index());
        self.len -= 1;
        Some(entity)
    }

    /// Returns the entity for a live handle.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation == id.generation() {
            slot.entity.as_ref()
        } else {
            None
        }
    }

    /// Returns the entity for a live handle, mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation == id.generation() {
            slot.entity.as_mut()
        } else {
            None
        }
    }

    /// Borrows two distinct live entities mutably at once.
    ///
    /// Returns `None` if either handle is stale or both name the same slot.
    #[must_use]
    pub fn get_pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        if a.index() == b.index() || self.get(a).is_none() || self.get(b).is_none() {
            return None;
        }
        let (lo, hi) = if a.index() < b.index() { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.index() as usize);
        let first = head[lo.index() as usize].entity.as_mut()?;
        let second = tail[0].entity.as_mut()?;
        if a.index() < b.index() {
            Some((first, second))
        } else {
            Some((second, first))
        }
    }

    /// Live handles in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(Entity::id).collect()
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    /// Live entities in slot order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.entity.as_mut())
    }

    /// Despawns every entity marked destroyed and returns them.
    pub fn prune_destroyed(&mut self) -> Vec<Entity> {
        let doomed: Vec<EntityId> = self
            .iter()
            .filter(|e| e.is_destroyed())
            .map(Entity::id)
            .collect();
        doomed.into_iter().filter_map(|id| self.despawn(id)).collect()
    }

    /// Number of live entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is live.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live entities of one kind.
    #[must_use]
    pub fn count(&self, tag: EntityTag) -> usize {
        self.iter().filter(|e| e.tag() == tag).count()
    }
}

// =============================================================================
// Tests
// =============================================================================

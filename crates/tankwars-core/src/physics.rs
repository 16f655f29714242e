//! Physics and hitbox components.
//!
//! Every entity owns exactly one [`Body`]: a [`Physics`] state plus the
//! circular [`Hitbox`] that sits on its position. The hitbox has no position
//! of its own, so it can never drift from (or outlive) the physics it is
//! attached to.

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::math::Vector;

/// Kinematic state of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Position in world units.
    pub position: Vector,
    /// Velocity in world units per millisecond.
    pub velocity: Vector,
    /// Acceleration in world units per millisecond squared.
    pub acceleration: Vector,
}

impl Physics {
    /// Creates a physics state at rest at `position`.
    #[must_use]
    pub fn at(position: Vector) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Creates a physics state at `position` moving with `velocity`.
    #[must_use]
    pub fn moving(position: Vector, velocity: Vector) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector::ZERO,
        }
    }

    /// Integrates one step of `dt` milliseconds and returns the displacement.
    ///
    /// World bounds are not applied here; callers decide whether to clamp
    /// (players) or expire (bullets).
    pub fn update_position(&mut self, dt: f64) -> Vector {
        self.velocity += self.acceleration * dt;
        let displacement = self.velocity * dt;
        self.position += displacement;
        displacement
    }
}

/// Circular collision area centred on its owner's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    /// Radius in world units.
    pub radius: f64,
}

impl Hitbox {
    /// Creates a hitbox with the given radius.
    #[must_use]
    pub const fn new(radius: f64) -> Self {
        Self { radius }
    }
}

/// Physics state paired with the hitbox attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Kinematic state.
    pub physics: Physics,
    /// Collision radius at `physics.position`.
    pub hitbox: Hitbox,
}

impl Body {
    /// Creates a body from its two components.
    #[must_use]
    pub const fn new(physics: Physics, hitbox: Hitbox) -> Self {
        Self { physics, hitbox }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vector {
        self.physics.position
    }

    /// Returns `true` if the two hitboxes overlap or touch.
    ///
    /// Compares squared distance against the squared radius sum, so the test
    /// is symmetric and free of square roots.
    #[must_use]
    pub fn collided(&self, other: &Body) -> bool {
        let reach = self.hitbox.radius + other.hitbox.radius;
        self.position().distance_squared(other.position()) <= reach * reach
    }

    /// Returns `true` if the position is inside the world.
    #[must_use]
    pub fn in_world(&self, world: &WorldConfig) -> bool {
        world.contains(self.physics.position)
    }

    /// Clamps the position into the world, each axis independently.
    pub fn bound_to_world(&mut self, world: &WorldConfig) {
        self.physics.position = world.clamp(self.physics.position);
    }
}

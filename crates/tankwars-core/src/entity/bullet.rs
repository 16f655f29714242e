//! Projectiles.

use super::EntityId;
use crate::config::{BulletTuning, GameConfig};
use crate::math::{from_polar, Vector};
use crate::physics::{Body, Hitbox, Physics};

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    /// Heading in radians, fixed at launch.
    pub angle: f64,
    /// The player that fired it. May outlive that player.
    pub source: EntityId,
    /// Health removed on hit.
    pub damage: u32,
    /// Displacement from the launch point.
    pub travel: Vector,
    /// Squared length of `travel`.
    pub distance_traveled_sq: f64,
}

/// A bullet that has been fired but not yet inserted into the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletSpawn {
    /// Launch position and velocity.
    pub body: Body,
    /// Bullet state.
    pub bullet: Bullet,
}

impl Bullet {
    /// Launches a bullet from `origin` along `angle`.
    #[must_use]
    pub fn from_player(
        source: EntityId,
        origin: Vector,
        angle: f64,
        tuning: &BulletTuning,
    ) -> BulletSpawn {
        let physics = Physics::moving(origin, from_polar(tuning.speed, angle));
        BulletSpawn {
            body: Body::new(physics, Hitbox::new(tuning.hitbox_radius)),
            bullet: Self {
                angle,
                source,
                damage: tuning.damage,
                travel: Vector::ZERO,
                distance_traveled_sq: 0.0,
            },
        }
    }

    /// Moves the bullet one step.
    ///
    /// Returns `false` once it has left the world or flown further than its
    /// range.
    pub fn update(&mut self, body: &mut Body, dt: f64, config: &GameConfig) -> bool {
        self.travel += body.physics.update_position(dt);
        self.distance_traveled_sq = self.travel.length_squared();
        body.in_world(&config.world)
            && self.distance_traveled_sq <= config.bullet.max_travel_distance_sq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn launch(x: f64, y: f64, angle: f64) -> (Body, Bullet) {
        let spawn = Bullet::from_player(
            EntityId::new(0, 0),
            Vector::new(x, y),
            angle,
            &BulletTuning::default(),
        );
        (spawn.body, spawn.bullet)
    }

    #[test]
    fn launch_velocity_follows_angle() {
        let (body, bullet) = launch(100.0, 100.0, FRAC_PI_2);
        assert!(body.physics.velocity.x.abs() < 1e-12);
        assert!((body.physics.velocity.y - 1.2).abs() < 1e-12);
        assert_eq!(bullet.damage, 1);
    }

    #[test]
    fn travels_until_range_exceeded() {
        let config = GameConfig::default();
        let (mut body, mut bullet) = launch(100.0, 1000.0, 0.0);

        // 1.2 units/ms: 1000 units after ~833 ms.
        assert!(bullet.update(&mut body, 800.0, &config));
        assert!((bullet.distance_traveled_sq - 960.0 * 960.0).abs() < 1e-6);
        assert!(!bullet.update(&mut body, 50.0, &config));
    }

    #[test]
    fn leaving_the_world_ends_flight() {
        let config = GameConfig::default();
        let (mut body, mut bullet) = launch(5.0, 1000.0, std::f64::consts::PI);
        assert!(!bullet.update(&mut body, 10.0, &config));
    }
}

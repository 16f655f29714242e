//! Gameplay tuning.
//!
//! All distances are world units and all times are milliseconds, so speeds
//! are world units per millisecond and turn rates are radians per millisecond.
//! Every field has a default; a TOML file only needs to list what it changes.
//!
//! # Example
//!
//! ```
//! use tankwars_core::config::GameConfig;
//!
//! let config = GameConfig::from_toml_str(
//!     r#"
//!     [player]
//!     max_health = 20
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.player.max_health, 20);
//! assert_eq!(config.powerup.max_count, 10);
//! ```

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::{bound, in_bound, Span, Vector};

/// Complete tuning for one arena.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// World extents.
    pub world: WorldConfig,
    /// Tank tuning.
    pub player: PlayerTuning,
    /// Projectile tuning.
    pub bullet: BulletTuning,
    /// Pickup pool and effect tuning.
    pub powerup: PowerupTuning,
}

/// Square world `[min, max] x [min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Smallest coordinate on both axes.
    pub min: f64,
    /// Largest coordinate on both axes.
    pub max: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 2500.0,
        }
    }
}

impl WorldConfig {
    /// Returns `true` if the point lies inside the world on both axes.
    #[must_use]
    pub fn contains(&self, position: Vector) -> bool {
        in_bound(position.x, self.min, self.max) && in_bound(position.y, self.min, self.max)
    }

    /// Clamps a point into the world, each axis independently.
    #[must_use]
    pub fn clamp(&self, position: Vector) -> Vector {
        Vector::new(
            bound(position.x, self.min, self.max),
            bound(position.y, self.min, self.max),
        )
    }

    /// Draws a uniformly distributed point inside the world.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        let span = Span::new(self.min, self.max);
        Vector::new(span.sample(rng), span.sample(rng))
    }
}

/// Tank movement, firing and health tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Hull rotation speed in radians per millisecond.
    pub turn_rate: f64,
    /// Base movement speed in units per millisecond.
    pub speed: f64,
    /// Base delay between shots in milliseconds.
    pub shot_cooldown: f64,
    /// Health on spawn and respawn.
    pub max_health: u32,
    /// Collision radius.
    pub hitbox_radius: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            turn_rate: 0.005,
            speed: 0.4,
            shot_cooldown: 800.0,
            max_health: 10,
            hitbox_radius: 20.0,
        }
    }
}

/// Projectile tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    /// Health removed per hit.
    pub damage: u32,
    /// Travel speed in units per millisecond.
    pub speed: f64,
    /// Distance after which a bullet expires.
    pub max_travel_distance: f64,
    /// Collision radius.
    pub hitbox_radius: f64,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            damage: 1,
            speed: 1.2,
            max_travel_distance: 1000.0,
            hitbox_radius: 10.0,
        }
    }
}

impl BulletTuning {
    /// Squared travel limit, compared against accumulated squared distance.
    #[must_use]
    pub fn max_travel_distance_sq(&self) -> f64 {
        self.max_travel_distance * self.max_travel_distance
    }
}

/// Pickup pool size and per-effect ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupTuning {
    /// Number of pickups kept on the map.
    pub max_count: usize,
    /// Collision radius of a pickup.
    pub hitbox_radius: f64,
    /// Effect duration in milliseconds.
    pub duration: Span,
    /// Health restored by a health pack.
    pub heal: Span,
    /// Extra pellet pairs fired per shot.
    pub shotgun_bonus: Span,
    /// Fire-rate multiplier.
    pub rapidfire_multiplier: Span,
    /// Movement speed multiplier.
    pub speedboost_multiplier: Span,
    /// Damage absorbed before the shield breaks.
    pub shield_charge: Span,
}

impl Default for PowerupTuning {
    fn default() -> Self {
        Self {
            max_count: 10,
            hitbox_radius: 5.0,
            duration: Span::new(5000.0, 15000.0),
            heal: Span::new(1.0, 4.0),
            shotgun_bonus: Span::new(1.0, 2.0),
            rapidfire_multiplier: Span::new(2.0, 4.0),
            speedboost_multiplier: Span::new(1.2, 1.8),
            shield_charge: Span::new(1.0, 4.0),
        }
    }
}

impl GameConfig {
    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-domain values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
    /// errors of [`GameConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every tuning value against its domain.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world.min.is_finite() && self.world.max.is_finite())
            || self.world.min >= self.world.max
        {
            return Err(invalid("world", "min must be finite and below max"));
        }
        positive("player.turn_rate", self.player.turn_rate)?;
        positive("player.speed", self.player.speed)?;
        positive("player.shot_cooldown", self.player.shot_cooldown)?;
        positive("player.hitbox_radius", self.player.hitbox_radius)?;
        if self.player.max_health == 0 {
            return Err(invalid("player.max_health", "must be at least 1"));
        }
        positive("bullet.speed", self.bullet.speed)?;
        positive("bullet.max_travel_distance", self.bullet.max_travel_distance)?;
        positive("bullet.hitbox_radius", self.bullet.hitbox_radius)?;
        positive("powerup.hitbox_radius", self.powerup.hitbox_radius)?;

        let spans = [
            ("powerup.duration", self.powerup.duration),
            ("powerup.heal", self.powerup.heal),
            ("powerup.shotgun_bonus", self.powerup.shotgun_bonus),
            ("powerup.rapidfire_multiplier", self.powerup.rapidfire_multiplier),
            ("powerup.speedboost_multiplier", self.powerup.speedboost_multiplier),
            ("powerup.shield_charge", self.powerup.shield_charge),
        ];
        for (field, span) in spans {
            if !span.is_valid() || span.min < 0.0 {
                return Err(invalid(field, "must be a non-negative range with min <= max"));
            }
        }
        let whole = [
            ("powerup.heal", self.powerup.heal),
            ("powerup.shotgun_bonus", self.powerup.shotgun_bonus),
            ("powerup.shield_charge", self.powerup.shield_charge),
        ];
        for (field, span) in whole {
            if !span.contains_whole() {
                return Err(invalid(field, "must contain at least one whole number"));
            }
        }
        if self.powerup.rapidfire_multiplier.min <= 0.0 {
            return Err(invalid("powerup.rapidfire_multiplier", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_listed_fields() {
        let config = GameConfig::from_toml_str(
            r#"
            [bullet]
            damage = 3

            [powerup.heal]
            min = 2.0
            max = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.bullet.damage, 3);
        assert_eq!(config.bullet.speed, BulletTuning::default().speed);
        assert_eq!(config.powerup.heal, Span::new(2.0, 2.0));
    }

    #[test]
    fn rejects_inverted_world() {
        let mut config = GameConfig::default();
        config.world = WorldConfig {
            min: 100.0,
            max: 0.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "world", .. })
        ));
    }

    #[test]
    fn rejects_negative_speed() {
        let mut config = GameConfig::default();
        config.player.speed = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "player.speed",
                ..
            })
        ));
    }

    #[test]
    fn rejects_whole_valued_span_without_whole_number() {
        let mut config = GameConfig::default();
        config.powerup.heal = Span::new(1.2, 1.8);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "powerup.heal",
                ..
            })
        ));
    }

    #[test]
    fn fractional_bounds_around_a_whole_number_are_accepted() {
        let mut config = GameConfig::default();
        config.powerup.shield_charge = Span::new(0.5, 1.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_span() {
        let mut config = GameConfig::default();
        config.powerup.duration = Span::new(10.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "powerup.duration",
                ..
            })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            GameConfig::from_toml_str("[player"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            GameConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn world_clamp_and_contains() {
        let world = WorldConfig::default();
        let clamped = world.clamp(Vector::new(-10.0, 3000.0));
        assert_eq!(clamped, Vector::new(0.0, 2500.0));
        assert!(world.contains(clamped));
        assert!(!world.contains(Vector::new(-0.1, 5.0)));
    }
}

//! Tank state and behavior.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use rand::Rng;
use tracing::debug;

use super::bullet::{Bullet, BulletSpawn};
use super::{ClientId, EntityId, Frame, PowerupKind};
use crate::config::{GameConfig, PlayerTuning};
use crate::input::PlayerAction;
use crate::math::{from_polar, normalize_angle, Vector};
use crate::physics::{Body, Hitbox, Physics};
use crate::powerup_state::PowerupState;

/// Angle between neighbouring shotgun pellets.
const SHOTGUN_SPREAD: f64 = PI / 9.0;

/// A connected player's tank.
///
/// Movement intent is level-triggered: [`Player::update_on_input`] records
/// it once per input packet, and [`Player::update`] re-applies it every tick
/// until the next packet arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Display name, not unique.
    pub name: String,
    /// Connection that owns this tank.
    pub client_id: ClientId,
    /// Hull heading in radians.
    pub tank_angle: f64,
    /// Turret heading in radians; bullets leave along it.
    pub turret_angle: f64,
    /// Current hull rotation in radians per millisecond.
    pub turn_rate: f64,
    /// Current speed in units per millisecond.
    pub speed: f64,
    /// Current delay between shots in milliseconds.
    pub shot_cooldown: f64,
    /// Game time of the last shot, `None` before the first one.
    pub last_shot_time: Option<f64>,
    /// Remaining health, always within `[0, max_health]`.
    pub health: u32,
    /// Opponents destroyed.
    pub kills: u32,
    /// Times destroyed.
    pub deaths: u32,
    /// Active effects, at most one per kind.
    pub powerups: BTreeMap<PowerupKind, PowerupState>,
    /// -1, 0 or 1: reverse, idle or forward.
    throttle: f64,
    shooting: bool,
}

impl Player {
    /// Creates a player with base stats and no intent.
    #[must_use]
    pub fn new(name: String, client_id: ClientId, tuning: &PlayerTuning) -> Self {
        Self {
            name,
            client_id,
            tank_angle: 0.0,
            turret_angle: 0.0,
            turn_rate: 0.0,
            speed: tuning.speed,
            shot_cooldown: tuning.shot_cooldown,
            last_shot_time: None,
            health: tuning.max_health,
            kills: 0,
            deaths: 0,
            powerups: BTreeMap::new(),
            throttle: 0.0,
            shooting: false,
        }
    }

    /// Creates a player at a random position in the world.
    pub fn spawn<R: Rng + ?Sized>(
        name: String,
        client_id: ClientId,
        config: &GameConfig,
        rng: &mut R,
    ) -> (Body, Self) {
        let position = config.world.random_position(rng);
        let body = Body::new(
            Physics::at(position),
            Hitbox::new(config.player.hitbox_radius),
        );
        (body, Self::new(name, client_id, &config.player))
    }

    /// Records the intent carried by one input packet.
    ///
    /// Opposing keys cancel out. A missing or non-finite turret angle keeps
    /// the current one.
    pub fn update_on_input(&mut self, action: &PlayerAction, tuning: &PlayerTuning) {
        let keys = action.keys();
        self.throttle = keys.throttle();
        self.turn_rate = keys.steering() * tuning.turn_rate;
        if let Some(angle) = action.turret_angle.filter(|a| a.is_finite()) {
            self.turret_angle = normalize_angle(angle);
        }
        self.shooting = action.shoot;
    }

    /// Advances the tank by one tick and returns any bullets it fired.
    pub fn update(
        &mut self,
        id: EntityId,
        body: &mut Body,
        frame: &Frame,
        config: &GameConfig,
    ) -> Vec<BulletSpawn> {
        self.tank_angle = normalize_angle(self.tank_angle + self.turn_rate * frame.dt);
        body.physics.velocity = if self.throttle == 0.0 {
            Vector::ZERO
        } else {
            from_polar(self.throttle * self.speed, self.tank_angle)
        };
        body.physics.update_position(frame.dt);
        body.bound_to_world(&config.world);

        self.update_powerups(frame.now, &config.player);

        if self.shooting && self.can_shoot(frame.now) {
            self.fire(id, body.position(), frame.now, config)
        } else {
            Vec::new()
        }
    }

    /// Returns `true` if the cooldown since the last shot has elapsed.
    #[must_use]
    pub fn can_shoot(&self, now: f64) -> bool {
        self.last_shot_time
            .map_or(true, |last| now >= last + self.shot_cooldown)
    }

    /// Fires one bullet along the turret plus two per shotgun bonus level.
    ///
    /// Resets the cooldown. Pellet `i` of the spread leaves at
    /// `turret_angle ± i·π/9`.
    pub fn fire(
        &mut self,
        id: EntityId,
        origin: Vector,
        now: f64,
        config: &GameConfig,
    ) -> Vec<BulletSpawn> {
        self.last_shot_time = Some(now);
        let bonus = self.shotgun_bonus();

        let mut bullets = Vec::with_capacity(1 + 2 * bonus as usize);
        bullets.push(Bullet::from_player(
            id,
            origin,
            self.turret_angle,
            &config.bullet,
        ));
        for i in 1..=bonus {
            let offset = f64::from(i) * SHOTGUN_SPREAD;
            for angle in [self.turret_angle - offset, self.turret_angle + offset] {
                bullets.push(Bullet::from_player(
                    id,
                    origin,
                    normalize_angle(angle),
                    &config.bullet,
                ));
            }
        }
        bullets
    }

    /// Extra pellet pairs from an active shotgun.
    #[must_use]
    pub fn shotgun_bonus(&self) -> u32 {
        self.powerups
            .get(&PowerupKind::Shotgun)
            .map_or(0, PowerupState::shotgun_bonus)
    }

    /// Starts `state` on this player.
    ///
    /// An active state of the same kind is removed first so effects never
    /// stack. One-shot effects (health packs) are applied and dropped.
    pub fn apply_powerup(&mut self, mut state: PowerupState, now: f64, tuning: &PlayerTuning) {
        let kind = state.kind();
        if let Some(previous) = self.powerups.remove(&kind) {
            previous.remove(self, tuning);
        }
        state.apply(self, now, tuning);
        if state.expired {
            state.remove(self, tuning);
        } else {
            self.powerups.insert(kind, state);
        }
    }

    /// Ticks every active effect and evicts the expired ones.
    pub fn update_powerups(&mut self, now: f64, tuning: &PlayerTuning) {
        let mut states = std::mem::take(&mut self.powerups);
        states.retain(|kind, state| {
            state.update(now);
            if state.expired {
                debug!(client_id = %self.client_id, ?kind, "powerup expired");
                state.remove(self, tuning);
            }
            !state.expired
        });
        self.powerups = states;
    }

    /// Restores health, capped at `max_health`.
    pub fn heal(&mut self, amount: u32, max_health: u32) {
        self.health = self.health.saturating_add(amount).min(max_health);
    }

    /// Applies damage, letting an active shield absorb it first.
    ///
    /// Returns `true` if the hit was lethal.
    pub fn damage(&mut self, amount: u32) -> bool {
        let remaining = match self.powerups.get_mut(&PowerupKind::Shield) {
            Some(shield) => shield.absorb(amount),
            None => amount,
        };
        if remaining == 0 {
            return false;
        }
        self.health = self.health.saturating_sub(remaining);
        self.health == 0
    }

    /// Puts the tank back in play: full health at a new random position.
    ///
    /// Counts the death; kill credit belongs to the caller. Active effects
    /// survive the respawn.
    pub fn respawn<R: Rng + ?Sized>(&mut self, body: &mut Body, config: &GameConfig, rng: &mut R) {
        self.health = config.player.max_health;
        self.deaths += 1;
        body.physics.position = config.world.random_position(rng);
        body.physics.velocity = Vector::ZERO;
    }
}

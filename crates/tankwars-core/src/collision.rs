//! Pairwise collision detection and resolution.
//!
//! The [`CollisionHandler`] scans every unordered pair of live entities in
//! slot order. Overlapping pairs are canonicalized by [`EntityTag`] order and
//! dispatched to exactly one handler:
//!
//! | Pair              | Effect                                                  |
//! |-------------------|---------------------------------------------------------|
//! | Player × Bullet   | damage unless the bullet is the player's own; respawn on a lethal hit |
//! | Player × Powerup  | apply the effect, consume the pickup                    |
//! | Bullet × Bullet   | both destroyed unless fired by the same player          |
//! | Bullet × Powerup  | both destroyed                                          |
//! | Player × Player   | nothing                                                 |
//! | Powerup × Powerup | nothing                                                 |
//!
//! Entities destroyed earlier in the scan take no further part in it.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::GameConfig;
use crate::entity::{ClientId, Entity, EntityId, EntityTag, PowerupKind};
use crate::event::TickEvent;

/// What a single pair resolution produced.
enum Contact {
    Inert,
    Hit {
        shooter: EntityId,
        victim: ClientId,
        health: u32,
        lethal: bool,
    },
    Collected {
        client: ClientId,
        kind: PowerupKind,
    },
    Cancelled,
}

/// Naive O(n²) collision pass over the arena.
///
/// # Example
///
/// ```
/// use tankwars_core::arena::Arena;
/// use tankwars_core::collision::CollisionHandler;
/// use tankwars_core::config::GameConfig;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut arena = Arena::new();
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
/// let events = CollisionHandler::new().resolve(&mut arena, 0.0, &GameConfig::default(), &mut rng);
/// assert!(events.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionHandler;

impl CollisionHandler {
    /// Creates a collision handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves every overlapping pair and returns the resulting events.
    ///
    /// `now` is the game time used to start powerup clocks; `rng` places
    /// respawning players.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        arena: &mut Arena,
        now: f64,
        config: &GameConfig,
        rng: &mut R,
    ) -> Vec<TickEvent> {
        let ids = arena.ids();
        let mut events = Vec::new();

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let Some((first, second)) = arena.get_pair_mut(a, b) else {
                    continue;
                };
                if first.is_destroyed()
                    || second.is_destroyed()
                    || !first.body().collided(second.body())
                {
                    continue;
                }

                let (first, second) = if first.tag() <= second.tag() {
                    (first, second)
                } else {
                    (second, first)
                };
                let contact = match (first.tag(), second.tag()) {
                    (EntityTag::Player, EntityTag::Bullet) => {
                        Self::player_bullet(first, second, config, rng)
                    }
                    (EntityTag::Player, EntityTag::Powerup) => {
                        Self::player_powerup(first, second, now, config)
                    }
                    (EntityTag::Bullet, EntityTag::Bullet) => Self::bullet_bullet(first, second),
                    (EntityTag::Bullet, EntityTag::Powerup) => {
                        first.destroy();
                        second.destroy();
                        Contact::Inert
                    }
                    (EntityTag::Player, EntityTag::Player)
                    | (EntityTag::Powerup, EntityTag::Powerup) => Contact::Inert,
                    (x, y) => {
                        warn!(first = %x, second = %y, "no collision handler for pair");
                        Contact::Inert
                    }
                };

                if let Some(event) = Self::settle(arena, contact) {
                    events.push(event);
                }
            }
        }
        events
    }

    fn player_bullet<R: Rng + ?Sized>(
        player: &mut Entity,
        bullet: &mut Entity,
        config: &GameConfig,
        rng: &mut R,
    ) -> Contact {
        let Some(shot) = bullet.as_bullet() else {
            return Contact::Inert;
        };
        if shot.source == player.id() {
            return Contact::Inert;
        }
        let (shooter, damage) = (shot.source, shot.damage);
        let Some((body, tank)) = player.player_parts_mut() else {
            return Contact::Inert;
        };

        bullet.destroy();
        let lethal = tank.damage(damage);
        if lethal {
            tank.respawn(body, config, rng);
        }
        Contact::Hit {
            shooter,
            victim: tank.client_id,
            health: tank.health,
            lethal,
        }
    }

    fn player_powerup(
        player: &mut Entity,
        powerup: &mut Entity,
        now: f64,
        config: &GameConfig,
    ) -> Contact {
        let Some(state) = powerup.as_powerup().map(|p| *p.state()) else {
            return Contact::Inert;
        };
        let Some(tank) = player.as_player_mut() else {
            return Contact::Inert;
        };

        powerup.destroy();
        tank.apply_powerup(state, now, &config.player);
        debug!(client_id = %tank.client_id, kind = ?state.kind(), "powerup collected");
        Contact::Collected {
            client: tank.client_id,
            kind: state.kind(),
        }
    }

    fn bullet_bullet(a: &mut Entity, b: &mut Entity) -> Contact {
        let same_source = match (a.as_bullet(), b.as_bullet()) {
            (Some(x), Some(y)) => x.source == y.source,
            _ => return Contact::Inert,
        };
        if same_source {
            return Contact::Inert;
        }
        a.destroy();
        b.destroy();
        Contact::Cancelled
    }

    /// Applies follow-up effects that need the whole arena, such as kill
    /// credit, once the pair borrow has ended.
    fn settle(arena: &mut Arena, contact: Contact) -> Option<TickEvent> {
        match contact {
            Contact::Inert => None,
            Contact::Hit {
                shooter,
                victim,
                health,
                lethal,
            } => {
                let killer = arena.get_mut(shooter).and_then(Entity::as_player_mut);
                if killer.is_none() {
                    debug!(%shooter, %victim, "bullet source no longer in play");
                }
                if lethal {
                    let killer = killer.map(|k| {
                        k.kills += 1;
                        k.client_id
                    });
                    info!(%victim, killer = ?killer, "player killed");
                    Some(TickEvent::PlayerKilled { victim, killer })
                } else {
                    Some(TickEvent::PlayerHit {
                        victim,
                        shooter: killer.map(|k| k.client_id),
                        health,
                    })
                }
            }
            Contact::Collected { client, kind } => {
                Some(TickEvent::PowerupCollected { client, kind })
            }
            Contact::Cancelled => Some(TickEvent::BulletsCancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Bullet, EntityKind, Player, Powerup};
    use crate::math::Vector;
    use crate::physics::{Body, Hitbox, Physics};
    use crate::powerup_state::{Effect, PowerupState};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Setup {
        arena: Arena,
        config: GameConfig,
        rng: ChaCha8Rng,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                arena: Arena::new(),
                config: GameConfig::default(),
                rng: ChaCha8Rng::seed_from_u64(7),
            }
        }

        fn player(&mut self, client: u64, x: f64, y: f64) -> EntityId {
            let body = Body::new(
                Physics::at(Vector::new(x, y)),
                Hitbox::new(self.config.player.hitbox_radius),
            );
            let player = Player::new(
                format!("p{client}"),
                ClientId::new(client),
                &self.config.player,
            );
            self.arena.spawn(body, EntityKind::Player(player))
        }

        fn bullet(&mut self, source: EntityId, x: f64, y: f64) -> EntityId {
            let spawn =
                Bullet::from_player(source, Vector::new(x, y), 0.0, &self.config.bullet);
            self.arena.spawn(spawn.body, EntityKind::Bullet(spawn.bullet))
        }

        fn powerup(&mut self, effect: Effect, x: f64, y: f64) -> EntityId {
            let body = Body::new(
                Physics::at(Vector::new(x, y)),
                Hitbox::new(self.config.powerup.hitbox_radius),
            );
            let powerup = Powerup::new(PowerupState::new(effect, 5000.0));
            self.arena.spawn(body, EntityKind::Powerup(powerup))
        }

        fn resolve(&mut self) -> Vec<TickEvent> {
            CollisionHandler::new().resolve(&mut self.arena, 100.0, &self.config, &mut self.rng)
        }

        fn tank(&self, id: EntityId) -> &Player {
            self.arena.get(id).and_then(Entity::as_player).unwrap()
        }

        fn destroyed(&self, id: EntityId) -> bool {
            self.arena.get(id).unwrap().is_destroyed()
        }
    }

    mod player_bullet_tests {
        use super::*;

        #[test]
        fn bullet_damages_other_player() {
            let mut s = Setup::new();
            let shooter = s.player(1, 100.0, 100.0);
            let victim = s.player(2, 500.0, 500.0);
            let bullet = s.bullet(shooter, 505.0, 500.0);

            let events = s.resolve();

            assert_eq!(s.tank(victim).health, s.config.player.max_health - 1);
            assert!(s.destroyed(bullet));
            assert_eq!(
                events,
                vec![TickEvent::PlayerHit {
                    victim: ClientId::new(2),
                    shooter: Some(ClientId::new(1)),
                    health: s.config.player.max_health - 1,
                }]
            );
        }

        #[test]
        fn own_bullet_is_ignored() {
            let mut s = Setup::new();
            let shooter = s.player(1, 100.0, 100.0);
            let bullet = s.bullet(shooter, 100.0, 100.0);

            assert!(s.resolve().is_empty());
            assert_eq!(s.tank(shooter).health, s.config.player.max_health);
            assert!(!s.destroyed(bullet));
        }

        #[test]
        fn lethal_hit_respawns_and_credits_kill() {
            let mut s = Setup::new();
            let shooter = s.player(1, 100.0, 100.0);
            let victim = s.player(2, 500.0, 500.0);
            s.arena
                .get_mut(victim)
                .and_then(Entity::as_player_mut)
                .unwrap()
                .health = 1;
            s.bullet(shooter, 500.0, 500.0);

            let events = s.resolve();

            assert_eq!(s.tank(victim).health, s.config.player.max_health);
            assert_eq!(s.tank(victim).deaths, 1);
            assert_eq!(s.tank(shooter).kills, 1);
            assert!(!s.destroyed(victim));
            assert_eq!(
                events,
                vec![TickEvent::PlayerKilled {
                    victim: ClientId::new(2),
                    killer: Some(ClientId::new(1)),
                }]
            );
        }

        #[test]
        fn stale_source_gets_no_credit() {
            let mut s = Setup::new();
            let shooter = s.player(1, 100.0, 100.0);
            let victim = s.player(2, 500.0, 500.0);
            s.bullet(shooter, 500.0, 500.0);
            s.arena
                .get_mut(victim)
                .and_then(Entity::as_player_mut)
                .unwrap()
                .health = 1;
            s.arena.despawn(shooter);
            // Reuse the shooter's slot so the stale handle would alias if unchecked.
            let newcomer = s.player(3, 2000.0, 2000.0);
            assert_eq!(newcomer.index(), shooter.index());

            let events = s.resolve();

            assert_eq!(s.tank(newcomer).kills, 0);
            assert_eq!(
                events,
                vec![TickEvent::PlayerKilled {
                    victim: ClientId::new(2),
                    killer: None,
                }]
            );
        }

        #[test]
        fn destroyed_bullet_hits_only_once() {
            let mut s = Setup::new();
            let shooter = s.player(1, 100.0, 100.0);
            let a = s.player(2, 500.0, 500.0);
            let b = s.player(3, 510.0, 500.0);
            s.bullet(shooter, 505.0, 500.0);

            s.resolve();

            let max = s.config.player.max_health;
            let total_loss = (max - s.tank(a).health) + (max - s.tank(b).health);
            assert_eq!(total_loss, 1);
        }
    }

    mod powerup_tests {
        use super::*;

        #[test]
        fn player_collects_powerup() {
            let mut s = Setup::new();
            let player = s.player(1, 300.0, 300.0);
            let pickup = s.powerup(Effect::Speedboost { multiplier: 1.5 }, 310.0, 300.0);

            let events = s.resolve();

            assert!(s.destroyed(pickup));
            let tank = s.tank(player);
            assert!((tank.speed - s.config.player.speed * 1.5).abs() < 1e-12);
            assert_eq!(
                tank.powerups[&PowerupKind::Speedboost].expiration_time,
                5100.0
            );
            assert_eq!(
                events,
                vec![TickEvent::PowerupCollected {
                    client: ClientId::new(1),
                    kind: PowerupKind::Speedboost,
                }]
            );
        }

        #[test]
        fn consumed_powerup_is_not_collected_twice() {
            let mut s = Setup::new();
            let a = s.player(1, 300.0, 300.0);
            let b = s.player(2, 310.0, 300.0);
            s.powerup(Effect::Shotgun { bonus: 1 }, 305.0, 300.0);

            let events = s.resolve();

            assert_eq!(events.len(), 1);
            assert_eq!(
                s.tank(a).powerups.len() + s.tank(b).powerups.len(),
                1
            );
        }

        #[test]
        fn bullet_and_powerup_destroy_each_other() {
            let mut s = Setup::new();
            let shooter = s.player(1, 100.0, 100.0);
            let bullet = s.bullet(shooter, 800.0, 800.0);
            let pickup = s.powerup(Effect::Heal { amount: 1 }, 805.0, 800.0);

            assert!(s.resolve().is_empty());
            assert!(s.destroyed(bullet));
            assert!(s.destroyed(pickup));
        }

        #[test]
        fn overlapping_powerups_are_inert() {
            let mut s = Setup::new();
            let a = s.powerup(Effect::Heal { amount: 1 }, 800.0, 800.0);
            let b = s.powerup(Effect::Heal { amount: 1 }, 801.0, 800.0);

            assert!(s.resolve().is_empty());
            assert!(!s.destroyed(a));
            assert!(!s.destroyed(b));
        }
    }

    mod bullet_bullet_tests {
        use super::*;

        #[test]
        fn bullets_from_different_players_cancel() {
            let mut s = Setup::new();
            let p1 = s.player(1, 100.0, 100.0);
            let p2 = s.player(2, 2000.0, 2000.0);
            let a = s.bullet(p1, 1000.0, 1000.0);
            let b = s.bullet(p2, 1010.0, 1000.0);

            assert_eq!(s.resolve(), vec![TickEvent::BulletsCancelled]);
            assert!(s.destroyed(a));
            assert!(s.destroyed(b));
        }

        #[test]
        fn bullets_from_same_player_pass_through() {
            let mut s = Setup::new();
            let p1 = s.player(1, 100.0, 100.0);
            let a = s.bullet(p1, 1000.0, 1000.0);
            let b = s.bullet(p1, 1005.0, 1000.0);

            assert!(s.resolve().is_empty());
            assert!(!s.destroyed(a));
            assert!(!s.destroyed(b));
        }

        #[test]
        fn players_do_not_interact() {
            let mut s = Setup::new();
            let a = s.player(1, 100.0, 100.0);
            let b = s.player(2, 101.0, 100.0);

            assert!(s.resolve().is_empty());
            assert_eq!(s.tank(a).health, s.config.player.max_health);
            assert_eq!(s.tank(b).health, s.config.player.max_health);
        }
    }
}

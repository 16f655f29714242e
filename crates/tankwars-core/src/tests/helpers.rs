//! Test helper functions for setting up games and scenarios.
//!
//! This module provides factory functions and setup utilities that make
//! writing tests more ergonomic and consistent.

use crate::config::GameConfig;
use crate::entity::{Bullet, ClientId, EntityId, EntityKind, EntityTag, Player};
use crate::game::{Command, Game, TickOutput};
use crate::input::PlayerAction;
use crate::math::Vector;

// =============================================================================
// Game Setup
// =============================================================================

/// Config with an empty powerup pool, so scenarios are not disturbed by
/// random pickups.
pub fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.powerup.max_count = 0;
    config
}

/// Creates a game with one registered player per `(client, position)` pair.
pub fn game_with_players(config: GameConfig, players: &[(u64, Vector)]) -> Game {
    let mut game = Game::new(config, 1234);
    for &(client, position) in players {
        let client = ClientId::new(client);
        game.add_player(client, format!("player-{client}")).unwrap();
        place(&mut game, client, position);
    }
    game
}

// =============================================================================
// Entity Access
// =============================================================================

/// Moves a player to `position` and stops it.
pub fn place(game: &mut Game, client: ClientId, position: Vector) {
    let id = game.player_id(client).unwrap();
    let body = game.arena_mut().get_mut(id).unwrap().body_mut();
    body.physics.position = position;
    body.physics.velocity = Vector::ZERO;
}

/// Returns a player's state, panicking if it is missing.
pub fn player(game: &Game, client: ClientId) -> &Player {
    game.player(client).unwrap()
}

/// Returns a player's position.
pub fn position(game: &Game, client: ClientId) -> Vector {
    game.player_entity(client).unwrap().body().position()
}

/// Sets a player's health directly.
pub fn set_health(game: &mut Game, client: ClientId, health: u32) {
    let id = game.player_id(client).unwrap();
    game.arena_mut()
        .get_mut(id)
        .and_then(|e| e.as_player_mut())
        .unwrap()
        .health = health;
}

/// Inserts a stationary bullet fired by `shooter` at `at`.
pub fn spawn_bullet(game: &mut Game, shooter: ClientId, at: Vector, angle: f64) -> EntityId {
    let source = game.player_id(shooter).unwrap();
    let mut spawn = Bullet::from_player(source, at, angle, &game.config().bullet);
    spawn.body.physics.velocity = Vector::ZERO;
    game.arena_mut()
        .spawn(spawn.body, EntityKind::Bullet(spawn.bullet))
}

/// Number of bullets in flight.
pub fn bullet_count(game: &Game) -> usize {
    game.arena().count(EntityTag::Bullet)
}

// =============================================================================
// Input
// =============================================================================

/// Queues an input packet for `client`.
pub fn send(game: &mut Game, client: ClientId, action: PlayerAction) {
    game.enqueue(Command::Action { client, action });
}

/// A packet that only aims and fires.
pub fn fire_at(angle: f64) -> PlayerAction {
    PlayerAction {
        turret_angle: Some(angle),
        shoot: true,
        ..PlayerAction::default()
    }
}

/// Steps the game every `dt` milliseconds from `from` up to and including `to`.
pub fn run(game: &mut Game, from: f64, to: f64, dt: f64) -> Vec<TickOutput> {
    let mut outputs = Vec::new();
    let mut now = from;
    while now <= to {
        outputs.push(game.step(now));
        now += dt;
    }
    outputs
}

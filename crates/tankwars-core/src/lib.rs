//! # Tankwars Core
//!
//! Authoritative simulation for a real-time multiplayer top-down tank battle.
//!
//! This crate owns the canonical state of every player, projectile and
//! powerup, advances it on a fixed tick, resolves collisions and produces one
//! state snapshot per connected client. It does no I/O; the
//! `tankwars-server` binary feeds it commands and ships its snapshots.
//!
//! ## Architecture
//!
//! - **Entities**: players, bullets and powerups, each a [`physics::Body`]
//!   plus kind-specific state in an [`entity::EntityKind`]
//! - **Arena**: generational storage; cross-entity references are
//!   [`entity::EntityId`]s that go stale instead of dangling
//! - **Collision**: O(n²) pair scan dispatched on the unordered kind pair
//! - **Game**: single owner of the arena, runs the tick
//!
//! ## Usage
//!
//! ```
//! use tankwars_core::config::GameConfig;
//! use tankwars_core::entity::ClientId;
//! use tankwars_core::game::{Command, Game};
//! use tankwars_core::input::PlayerAction;
//!
//! let mut game = Game::new(GameConfig::default(), 7);
//! let client = ClientId::new(1);
//! game.enqueue(Command::AddPlayer { client, name: "ace".into() });
//! game.enqueue(Command::Action {
//!     client,
//!     action: PlayerAction { up: true, ..PlayerAction::default() },
//! });
//!
//! for tick in 0..60 {
//!     let out = game.step(f64::from(tick) * 1000.0 / 60.0);
//!     assert_eq!(out.snapshots.len(), 1);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod game;
pub mod input;
pub mod math;
pub mod physics;
pub mod powerup_state;
pub mod snapshot;

pub use arena::Arena;
pub use config::GameConfig;
pub use error::{ConfigError, GameError};
pub use game::{Command, Game, TickOutput};

#[cfg(test)]
mod tests;

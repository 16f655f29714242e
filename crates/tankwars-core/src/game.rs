//! The game orchestrator and its fixed tick.
//!
//! A [`Game`] owns every entity and is the only thing that mutates them.
//! Transport code never touches it concurrently: it [`enqueue`](Game::enqueue)s
//! [`Command`]s, and [`step`](Game::step) applies them at the start of the
//! next tick.
//!
//! # Tick order
//!
//! 0. Apply queued connect/disconnect/input commands
//! 1. Hand each client's latest buffered input to its player
//! 2. Update every entity; bullets fired this tick are inserted afterwards
//! 3. Resolve collisions
//! 4. Prune destroyed entities
//! 5. Top the powerup pool up to its configured size
//! 6. Build one snapshot per connected client
//!
//! # Example
//!
//! ```
//! use tankwars_core::config::GameConfig;
//! use tankwars_core::entity::ClientId;
//! use tankwars_core::game::{Command, Game};
//!
//! let mut game = Game::new(GameConfig::default(), 42);
//! game.enqueue(Command::AddPlayer { client: ClientId::new(1), name: "ace".into() });
//!
//! let out = game.step(0.0);
//! assert_eq!(out.snapshots.len(), 1);
//! assert_eq!(out.snapshots[0].update.self_player.name, "ace");
//! assert_eq!(out.snapshots[0].update.powerups.len(), 10);
//! ```

use std::collections::{BTreeMap, VecDeque};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::arena::Arena;
use crate::collision::CollisionHandler;
use crate::config::GameConfig;
use crate::entity::{ClientId, Entity, EntityId, EntityKind, EntityTag, Frame, Player, Powerup};
use crate::error::GameError;
use crate::event::TickEvent;
use crate::input::PlayerAction;
use crate::snapshot::{ClientSnapshot, WorldView};

/// A request from the transport layer, applied at the start of the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a player for a connection.
    AddPlayer {
        /// Connection id.
        client: ClientId,
        /// Display name.
        name: String,
    },
    /// Remove a connection's player.
    RemovePlayer {
        /// Connection id.
        client: ClientId,
    },
    /// Replace a connection's buffered input.
    Action {
        /// Connection id.
        client: ClientId,
        /// Latest packet.
        action: PlayerAction,
    },
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Index of the tick just completed, starting at 0.
    pub tick: u64,
    /// One snapshot per connected client, in client id order.
    pub snapshots: Vec<ClientSnapshot>,
    /// Gameplay events in the order they happened.
    pub events: Vec<TickEvent>,
}

/// Authoritative state of one arena.
///
/// # Determinism
///
/// Given the same config, seed, command sequence and `now` values, two games
/// produce identical snapshots: all randomness comes from one seeded
/// `ChaCha8Rng` and every iteration order is fixed.
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    arena: Arena,
    clients: BTreeMap<ClientId, EntityId>,
    pending: VecDeque<Command>,
    inputs: BTreeMap<ClientId, PlayerAction>,
    collisions: CollisionHandler,
    rng: ChaCha8Rng,
    seed: u64,
    tick: u64,
    last_time: Option<f64>,
}

impl Game {
    /// Creates an empty game.
    ///
    /// # Arguments
    ///
    /// * `config` - Tuning, assumed validated
    /// * `seed` - Seed for spawn positions and powerup rolls
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            arena: Arena::new(),
            clients: BTreeMap::new(),
            pending: VecDeque::new(),
            inputs: BTreeMap::new(),
            collisions: CollisionHandler::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            tick: 0,
            last_time: None,
        }
    }

    /// Queues a command for the next tick.
    pub fn enqueue(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Spawns a player for `client` at a random position.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AlreadyRegistered`] if the client already has one.
    pub fn add_player(&mut self, client: ClientId, name: String) -> Result<EntityId, GameError> {
        if self.clients.contains_key(&client) {
            return Err(GameError::AlreadyRegistered(client));
        }
        let (body, player) = Player::spawn(name, client, &self.config, &mut self.rng);
        let id = self.arena.spawn(body, EntityKind::Player(player));
        self.clients.insert(client, id);
        Ok(id)
    }

    /// Removes `client`'s player and any input buffered for it.
    ///
    /// Bullets it fired stay in flight; their source becomes a lookup miss.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownClient`] if the client has no player.
    pub fn remove_player(&mut self, client: ClientId) -> Result<Entity, GameError> {
        self.inputs.remove(&client);
        let id = self
            .clients
            .remove(&client)
            .ok_or(GameError::UnknownClient(client))?;
        self.arena
            .despawn(id)
            .ok_or(GameError::UnknownClient(client))
    }

    /// Buffers `action` as `client`'s latest input, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownClient`] if the client has no player.
    pub fn set_input(&mut self, client: ClientId, action: PlayerAction) -> Result<(), GameError> {
        if !self.clients.contains_key(&client) {
            return Err(GameError::UnknownClient(client));
        }
        self.inputs.insert(client, action);
        Ok(())
    }

    /// Runs one tick at game time `now` (milliseconds).
    ///
    /// The first tick has `dt = 0`; a clock that goes backwards also yields
    /// `dt = 0`.
    pub fn step(&mut self, now: f64) -> TickOutput {
        let dt = self.last_time.map_or(0.0, |last| (now - last).max(0.0));
        self.last_time = Some(now);
        let frame = Frame { now, dt };
        let mut events = Vec::new();

        // 0. Membership and input commands, in arrival order.
        while let Some(command) = self.pending.pop_front() {
            self.apply_command(command, &mut events);
        }

        // 1. Latest input per client.
        for (client, action) in std::mem::take(&mut self.inputs) {
            let player = self
                .clients
                .get(&client)
                .and_then(|id| self.arena.get_mut(*id))
                .and_then(Entity::as_player_mut);
            match player {
                Some(player) => player.update_on_input(&action, &self.config.player),
                None => debug!(%client, "input for missing player dropped"),
            }
        }

        // 2. Update.
        let mut fired = Vec::new();
        for entity in self.arena.iter_mut() {
            fired.extend(entity.update(&frame, &self.config));
        }
        for spawn in fired {
            self.arena.spawn(spawn.body, EntityKind::Bullet(spawn.bullet));
        }

        // 3. Collisions.
        events.extend(
            self.collisions
                .resolve(&mut self.arena, now, &self.config, &mut self.rng),
        );

        // 4. Prune.
        let pruned = self.arena.prune_destroyed();
        trace!(tick = self.tick, pruned = pruned.len(), "pruned destroyed entities");

        // 5. Refill the powerup pool.
        self.top_up_powerups();

        // 6. Snapshots.
        let view = WorldView::capture(&self.arena, now);
        let snapshots = self
            .clients
            .keys()
            .filter_map(|&client| {
                view.for_client(client)
                    .map(|update| ClientSnapshot { client, update })
            })
            .collect();

        let tick = self.tick;
        self.tick += 1;
        TickOutput {
            tick,
            snapshots,
            events,
        }
    }

    fn apply_command(&mut self, command: Command, events: &mut Vec<TickEvent>) {
        match command {
            Command::AddPlayer { client, name } => match self.add_player(client, name.clone()) {
                Ok(id) => {
                    info!(%client, %id, name = %name, "player joined");
                    events.push(TickEvent::PlayerJoined { client, name });
                }
                Err(err) => warn!(%client, error = %err, "new-player rejected"),
            },
            Command::RemovePlayer { client } => match self.remove_player(client) {
                Ok(_) => {
                    info!(%client, "player left");
                    events.push(TickEvent::PlayerLeft { client });
                }
                Err(err) => debug!(%client, error = %err, "remove ignored"),
            },
            Command::Action { client, action } => {
                if let Err(err) = self.set_input(client, action) {
                    debug!(%client, error = %err, "input ignored");
                }
            }
        }
    }

    fn top_up_powerups(&mut self) {
        let live = self.arena.count(EntityTag::Powerup);
        let missing = self.config.powerup.max_count.saturating_sub(live);
        for _ in 0..missing {
            let (body, powerup) = Powerup::create(&self.config, &mut self.rng);
            self.arena.spawn(body, EntityKind::Powerup(powerup));
        }
        if missing > 0 {
            trace!(spawned = missing, "powerup pool topped up");
        }
    }

    /// Active tuning.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Live entities.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed the game was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of registered clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if `client` has a player.
    #[must_use]
    pub fn is_registered(&self, client: ClientId) -> bool {
        self.clients.contains_key(&client)
    }

    /// Entity handle of `client`'s player.
    #[must_use]
    pub fn player_id(&self, client: ClientId) -> Option<EntityId> {
        self.clients.get(&client).copied()
    }

    /// The entity holding `client`'s player.
    #[must_use]
    pub fn player_entity(&self, client: ClientId) -> Option<&Entity> {
        self.arena.get(self.player_id(client)?)
    }

    /// `client`'s player state.
    #[must_use]
    pub fn player(&self, client: ClientId) -> Option<&Player> {
        self.player_entity(client).and_then(Entity::as_player)
    }

    /// Mutable access to the arena, for setting up scenarios.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }
}

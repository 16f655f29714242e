//! Runtime settings read from the environment.
//!
//! These are server concerns only; gameplay tuning lives in
//! [`GameConfig`] and may be overridden by the TOML file named in
//! `GAME_CONFIG`.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tankwars_core::GameConfig;

const DEFAULT_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_COMMAND_CAPACITY: usize = 1024;
const DEFAULT_OUTBOUND_CAPACITY: usize = 32;

/// Everything `main` needs to start serving.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub tick_interval: Duration,
    pub seed: u64,
    pub command_capacity: usize,
    pub outbound_capacity: usize,
    pub game: GameConfig,
}

impl ServerConfig {
    /// Reads `SERVER_ADDR`, `TICK_RATE`, `GAME_SEED`, `GAME_CONFIG`,
    /// `COMMAND_CHANNEL_CAPACITY` and `OUTBOUND_CHANNEL_CAPACITY`.
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse()
            .with_context(|| format!("SERVER_ADDR `{addr}` is not a socket address"))?;

        let game = match env::var("GAME_CONFIG") {
            Ok(path) => GameConfig::load(&path)
                .with_context(|| format!("loading game config from {path}"))?,
            Err(_) => GameConfig::default(),
        };

        Ok(Self {
            addr,
            tick_interval: tick_interval(parsed("TICK_RATE").unwrap_or(DEFAULT_TICK_RATE)),
            seed: parsed("GAME_SEED").unwrap_or_else(seed_from_clock),
            command_capacity: parsed("COMMAND_CHANNEL_CAPACITY")
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_COMMAND_CAPACITY),
            outbound_capacity: parsed("OUTBOUND_CHANNEL_CAPACITY")
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_OUTBOUND_CAPACITY),
            game,
        })
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Period of one tick; a zero rate falls back to the default.
fn tick_interval(rate: u32) -> Duration {
    let rate = if rate == 0 { DEFAULT_TICK_RATE } else { rate };
    Duration::from_secs(1) / rate
}

fn seed_from_clock() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

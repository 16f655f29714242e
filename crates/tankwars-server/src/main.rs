mod config;
mod net;
mod protocol;
mod world;

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tankwars_core::game::Game;
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::net::{health, ws_handler, AppState};
use crate::world::{world_task, World};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env locally; fine to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServerConfig::from_env()?;
    config.game.validate().context("invalid game config")?;
    tracing::info!(
        seed = config.seed,
        tick_ms = config.tick_interval.as_secs_f64() * 1000.0,
        "starting game"
    );

    // Every connection feeds this one channel; the tick task is its only reader.
    let (world_tx, world_rx) = mpsc::channel(config.command_capacity);
    let world = World::new(Game::new(config.game.clone(), config.seed));
    tokio::spawn(world_task(world_rx, world, config.tick_interval));

    let state = Arc::new(AppState {
        world_tx,
        outbound_capacity: config.outbound_capacity,
    });
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, app).await.context("server error")
}

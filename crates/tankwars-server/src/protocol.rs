// Wire messages exchanged with browser clients over the WebSocket.

use serde::{Deserialize, Serialize};
use tankwars_core::entity::ClientId;
use tankwars_core::input::PlayerAction;
use tankwars_core::snapshot::Snapshot;

/// Messages the client sends to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    // Registers a tank for this connection.
    NewPlayer { name: String },
    // Replaces the buffered intent; missing fields mean "not pressed".
    PlayerAction(PlayerAction),
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    // Sent once the new-player request has been queued.
    NewPlayerAck { client_id: ClientId },
    // Per-tick state for this client.
    Update(Snapshot),
}

const MAX_NAME_LEN: usize = 32;
const DEFAULT_NAME: &str = "Tank";

/// Trims a display name and caps its length; empty names get a default.
pub fn sanitize_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed
    }
}

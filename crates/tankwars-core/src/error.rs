//! Error types for the simulation core.
//!
//! Only conditions a caller can act on are errors. Player-facing problems
//! inside a tick (bad input, disconnect races, stale ids) are absorbed and
//! logged rather than surfaced here.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::ClientId;

/// Errors returned by [`Game`](crate::game::Game) operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// A `new-player` request arrived for a connection that already has a player.
    #[error("client {0} already has a player")]
    AlreadyRegistered(ClientId),
    /// The connection id does not map to a live player.
    #[error("client {0} is not registered")]
    UnknownClient(ClientId),
}

/// Errors produced while loading or validating a [`GameConfig`](crate::config::GameConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tuning value is out of its allowed domain.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human readable description of the problem.
        reason: String,
    },
    /// The config file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`GameConfig`](crate::config::GameConfig).
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_error_messages_name_the_client() {
        let err = GameError::AlreadyRegistered(ClientId::new(7));
        assert_eq!(err.to_string(), "client 7 already has a player");

        let err = GameError::UnknownClient(ClientId::new(9));
        assert_eq!(err.to_string(), "client 9 is not registered");
    }

    #[test]
    fn invalid_config_message_names_the_field() {
        let err = ConfigError::Invalid {
            field: "player.speed",
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value `player.speed`: must be positive"
        );
    }
}

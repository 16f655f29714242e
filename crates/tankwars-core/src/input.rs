//! Client input packets.
//!
//! A [`PlayerAction`] is the raw packet as received; [`Keys`] is the held
//! direction set it decodes to. Opposing keys cancel out.

use bitflags::bitflags;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

bitflags! {
    /// Movement keys held by a client.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Keys: u8 {
        /// Drive forward.
        const UP = 1 << 0;
        /// Drive in reverse.
        const DOWN = 1 << 1;
        /// Turn counter-clockwise.
        const LEFT = 1 << 2;
        /// Turn clockwise.
        const RIGHT = 1 << 3;
    }
}

impl Keys {
    /// Forward intent: `1.0`, `-1.0`, or `0.0` when idle or both held.
    #[must_use]
    pub fn throttle(self) -> f64 {
        axis(self.contains(Self::UP), self.contains(Self::DOWN))
    }

    /// Turn intent: `1.0` clockwise, `-1.0` counter-clockwise, or `0.0`.
    #[must_use]
    pub fn steering(self) -> f64 {
        axis(self.contains(Self::RIGHT), self.contains(Self::LEFT))
    }
}

fn axis(positive: bool, negative: bool) -> f64 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// One input packet from a client.
///
/// Every field is optional on the wire. Missing, null, or wrongly typed
/// values count as released keys and leave the turret where it is, without
/// discarding the rest of the packet.
///
/// # Example
///
/// ```
/// use tankwars_core::input::{Keys, PlayerAction};
///
/// let action: PlayerAction =
///     serde_json::from_str(r#"{"up": true, "left": true, "turretAngle": 1.5}"#).unwrap();
///
/// assert_eq!(action.keys(), Keys::UP | Keys::LEFT);
/// assert_eq!(action.turret_angle, Some(1.5));
/// assert!(!action.shoot);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerAction {
    /// Forward key held.
    #[serde(deserialize_with = "held")]
    pub up: bool,
    /// Reverse key held.
    #[serde(deserialize_with = "held")]
    pub down: bool,
    /// Left turn key held.
    #[serde(deserialize_with = "held")]
    pub left: bool,
    /// Right turn key held.
    #[serde(deserialize_with = "held")]
    pub right: bool,
    /// Turret heading in radians; `None` keeps the current heading.
    #[serde(alias = "turretAngle", deserialize_with = "heading")]
    pub turret_angle: Option<f64>,
    /// Fire button held.
    #[serde(deserialize_with = "held")]
    pub shoot: bool,
}

/// A wire value that either has the expected type or is ignored.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Ignored(IgnoredAny),
}

impl<T> Lenient<T> {
    fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Ignored(_) => None,
        }
    }
}

fn held<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(Lenient::<bool>::deserialize(de)?.valid().unwrap_or(false))
}

fn heading<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(Lenient::<f64>::deserialize(de)?.valid())
}

impl PlayerAction {
    /// Held movement keys.
    #[must_use]
    pub fn keys(&self) -> Keys {
        let mut keys = Keys::empty();
        keys.set(Keys::UP, self.up);
        keys.set(Keys::DOWN, self.down);
        keys.set(Keys::LEFT, self.left);
        keys.set(Keys::RIGHT, self.right);
        keys
    }
}

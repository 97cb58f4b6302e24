//! Value types shared by every event on the wire.
//!
//! Everything here is serialized with camelCase field names because the
//! rendering clients on the other end of the room are browser pages.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of one match, which is also the name of its relay room.
///
/// `#[serde(transparent)]` keeps it a bare string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A seat at the table as seen on the host screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The seat across the table.
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// What a connection announces itself as when joining a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    #[default]
    Viewer,
}

// ---------------------------------------------------------------------------
// Snapshot parts
// ---------------------------------------------------------------------------

/// Cosmetic country metadata for a player (flag image and label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Country {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// One reusable special action in a player's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityEntry {
    pub text: String,
    pub used: bool,
}

impl AbilityEntry {
    /// A fresh, unused ability.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            used: false,
        }
    }
}

/// The readiness flag of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AckSignal {
    pub active: bool,
    pub player_name: Option<String>,
}

/// Readiness of both sides, as carried in every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AckState {
    pub left: AckSignal,
    pub right: AckSignal,
}

impl AckState {
    pub fn side(&self, side: Side) -> &AckSignal {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut AckSignal {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Scores keyed by player display name.
///
/// A `BTreeMap` so two snapshots of the same state encode to the same bytes.
pub type ScoreMap = BTreeMap<String, i32>;

// ---------------------------------------------------------------------------
// MatchSnapshot
// ---------------------------------------------------------------------------

/// The complete host view of a match at one instant.
///
/// Viewers replace their whole view with each snapshot they receive; there
/// is no sequence number and no delta, so the last snapshot to arrive wins.
/// "Left" is always `player2` and "right" is always `player1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub player1: String,
    pub player2: String,
    pub round: u32,
    pub round_count: u32,
    pub scores: ScoreMap,
    pub ok: AckState,
    /// Ability image reference per player.
    pub abilities: BTreeMap<String, Option<String>>,
    /// Full ability ledger per player.
    #[serde(default)]
    pub ability_lists: BTreeMap<String, Vec<AbilityEntry>>,
    pub countries: BTreeMap<String, Option<Country>>,
    pub current_left_url: Option<String>,
    pub current_right_url: Option<String>,
    pub prev_left: Vec<String>,
    pub prev_right: Vec<String>,
    pub notes: BTreeMap<String, String>,
}

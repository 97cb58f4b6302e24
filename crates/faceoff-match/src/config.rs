//! Host and match configuration.

use faceoff_protocol::MatchId;

use crate::store::stored_match_id;
use crate::{DurableStore, RejoinSchedule};

/// Room name used when neither the config nor the store names a match.
pub const LOCAL_MATCH_ID: &str = "local";

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

/// Configuration for a host actor.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// The match this host owns. Also the relay room name.
    ///
    /// `None` defers to the `gameID` the setup screen stored, then to
    /// [`LOCAL_MATCH_ID`].
    pub match_id: Option<MatchId>,

    /// When to re-announce room membership after a (re)connect.
    pub rejoin: RejoinSchedule,

    /// Capacity of the actor's command queue. Senders wait when it is full.
    pub command_buffer: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            match_id: None,
            rejoin: RejoinSchedule::default(),
            command_buffer: 64,
        }
    }
}

impl HostConfig {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id: Some(match_id),
            ..Self::default()
        }
    }

    /// The room this host will announce for `store`.
    pub fn resolve_match_id<S: DurableStore>(&self, store: &S) -> MatchId {
        self.match_id
            .clone()
            .or_else(|| stored_match_id(store))
            .unwrap_or_else(|| MatchId::new(LOCAL_MATCH_ID))
    }

    pub fn with_rejoin(mut self, rejoin: RejoinSchedule) -> Self {
        self.rejoin = rejoin;
        self
    }

    pub fn with_command_buffer(mut self, size: usize) -> Self {
        self.command_buffer = size.max(1);
        self
    }
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Who plays and for how many rounds. Fixed for the life of a match.
///
/// Usually read from the durable store with [`MatchConfig::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Seated on the right.
    pub player1: String,
    /// Seated on the left.
    pub player2: String,
    pub round_count: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            player1: "Player 1".into(),
            player2: "Player 2".into(),
            round_count: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::MemoryStore;
    use crate::store::keys;

    #[test]
    fn test_host_config_default() {
        let config = HostConfig::default();
        assert_eq!(config.command_buffer, 64);
        assert_eq!(config.rejoin.delays().len(), 4);
        assert_eq!(config.match_id, None);
    }

    #[test]
    fn test_match_id_falls_back_to_stored_game_id() {
        let store = MemoryStore::new().with(keys::GAME_ID, "g-42");

        let resolved = HostConfig::default().resolve_match_id(&store);

        assert_eq!(resolved.as_str(), "g-42");
    }

    #[test]
    fn test_explicit_match_id_beats_stored_one() {
        let store = MemoryStore::new().with(keys::GAME_ID, "g-42");

        let resolved = HostConfig::new(MatchId::new("g-1")).resolve_match_id(&store);

        assert_eq!(resolved.as_str(), "g-1");
    }

    #[test]
    fn test_match_id_defaults_to_local() {
        let store = MemoryStore::new().with(keys::GAME_ID, "");

        let resolved = HostConfig::default().resolve_match_id(&store);

        assert_eq!(resolved.as_str(), LOCAL_MATCH_ID);
    }

    #[test]
    fn test_host_config_setters() {
        let config = HostConfig::new(MatchId::new("g-3"))
            .with_rejoin(RejoinSchedule::new(vec![Duration::ZERO]))
            .with_command_buffer(0);
        assert_eq!(config.match_id.as_ref().map(MatchId::as_str), Some("g-3"));
        assert_eq!(config.rejoin.delays(), &[Duration::ZERO]);
        assert_eq!(config.command_buffer, 1);
    }

    #[test]
    fn test_match_config_default() {
        let config = MatchConfig::default();
        assert_eq!(config.round_count, 5);
        assert_ne!(config.player1, config.player2);
    }
}

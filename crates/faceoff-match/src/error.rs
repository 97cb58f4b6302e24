//! Error types for the match engine.

use std::path::PathBuf;

/// Errors raised by match operations.
///
/// None of these are fatal: every operation that returns one has left the
/// match state exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The name does not belong to either player of this match.
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),

    /// Both seats were given the same display name.
    #[error("both players are named {0:?}")]
    DuplicatePlayer(String),

    /// A match needs at least one round.
    #[error("round count must be at least 1, got {0}")]
    InvalidRoundCount(u32),

    /// Ability text was empty or whitespace only.
    #[error("ability text is empty")]
    EmptyAbility,

    /// No ability at `index` in the player's ledger.
    #[error("no ability #{index} for {player} (ledger holds {len})")]
    AbilityIndexOutOfRange {
        player: String,
        index: usize,
        len: usize,
    },

    /// The operation is not valid in the current phase.
    #[error("invalid phase for this operation: {0}")]
    InvalidPhase(String),

    /// The match has ended; its state is frozen.
    #[error("match is over")]
    MatchOver,

    /// The host actor has stopped.
    #[error("match host is unavailable")]
    HostUnavailable,
}

/// Errors from the durable store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Writing the backing file failed.
    #[error("store write to {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The values could not be serialized.
    #[error("store encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the external ability catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog answered and refused the write.
    #[error("catalog rejected the write: {0}")]
    Rejected(String),

    /// The catalog could not be reached.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// No answer arrived in time.
    #[error("catalog write timed out")]
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_message_names_the_player() {
        let err = MatchError::AbilityIndexOutOfRange {
            player: "Sara".into(),
            index: 4,
            len: 2,
        };
        assert_eq!(err.to_string(), "no ability #4 for Sara (ledger holds 2)");
    }

    #[test]
    fn test_store_error_from_serde() {
        let serde_err = serde_json::from_str::<u8>("x").unwrap_err();
        let err: StoreError = serde_err.into();
        assert!(err.to_string().starts_with("store encode failed"));
    }
}

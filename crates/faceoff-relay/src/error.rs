//! Error types for the relay.

use std::path::PathBuf;

use faceoff_protocol::{MatchId, ProtocolError};
use faceoff_transport::TransportError;

/// Errors raised while relaying.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room actor for this match has stopped.
    #[error("room {0} is unavailable")]
    RoomUnavailable(MatchId),

    /// The connection sent a room event before joining a room.
    #[error("connection has not joined a room")]
    NotInRoom,

    /// A catalog append carried no text.
    #[error("catalog text is empty")]
    EmptyCatalogText,

    /// The catalog log could not be opened or written.
    #[error("catalog log {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

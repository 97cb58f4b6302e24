//! Unified error type for faceoff.

use faceoff_match::{CatalogError, MatchError, StoreError};
use faceoff_protocol::ProtocolError;
use faceoff_relay::RelayError;
use faceoff_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FaceoffError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A match operation was refused.
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let faceoff_err: FaceoffError = err.into();
        assert!(matches!(faceoff_err, FaceoffError::Transport(_)));
        assert!(faceoff_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let faceoff_err: FaceoffError = err.into();
        assert!(matches!(faceoff_err, FaceoffError::Protocol(_)));
    }

    #[test]
    fn test_from_match_error() {
        let faceoff_err: FaceoffError = MatchError::MatchOver.into();
        assert!(matches!(faceoff_err, FaceoffError::Match(_)));
        assert_eq!(faceoff_err.to_string(), "match is over");
    }

    #[test]
    fn test_from_catalog_error() {
        let faceoff_err: FaceoffError = CatalogError::TimedOut.into();
        assert!(matches!(faceoff_err, FaceoffError::Catalog(_)));
    }

    #[test]
    fn test_from_relay_error() {
        let faceoff_err: FaceoffError = RelayError::NotInRoom.into();
        assert!(matches!(faceoff_err, FaceoffError::Relay(_)));
    }
}

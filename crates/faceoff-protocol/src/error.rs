//! Error types for the protocol layer.

/// Errors that can occur while turning events into frames and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an event failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A frame was not valid JSON, or did not match any known event shape.
    ///
    /// Unknown event names and unknown `side` values land here, which is
    /// how malformed inbound signals get dropped at the boundary.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but makes no sense in context.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

//! Frame codecs.
//!
//! The relay and the clients agree on a [`Codec`]; only [`JsonCodec`]
//! exists today because the rendering clients are browser pages.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ChannelEvent, ProtocolError};

/// Encodes values to frame bytes and back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Shorthand for encoding a [`ChannelEvent`].
    fn encode_event(&self, event: &ChannelEvent) -> Result<Vec<u8>, ProtocolError> {
        self.encode(event)
    }

    /// Shorthand for decoding a [`ChannelEvent`].
    fn decode_event(&self, data: &[u8]) -> Result<ChannelEvent, ProtocolError> {
        self.decode(data)
    }
}

/// A [`Codec`] producing UTF-8 JSON frames.
///
/// ```rust
/// use faceoff_protocol::{ChannelEvent, Codec, JsonCodec, MatchId, StartRound};
///
/// let codec = JsonCodec;
/// let event = ChannelEvent::StartRound(StartRound {
///     match_id: MatchId::new("g-1"),
///     round: 2,
/// });
///
/// let bytes = codec.encode_event(&event).unwrap();
/// assert_eq!(codec.decode_event(&bytes).unwrap(), event);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

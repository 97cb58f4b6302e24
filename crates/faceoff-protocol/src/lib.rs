//! Wire protocol for faceoff match rooms.
//!
//! - **Types** ([`MatchId`], [`Side`], [`MatchSnapshot`], ...): values
//!   carried inside events.
//! - **Events** ([`ChannelEvent`] and its payload structs): one tagged
//!   schema per room event, with legacy defaulting applied at decode time.
//! - **Codec** ([`Codec`], [`JsonCodec`]): events to frame bytes and back.
//!
//! ```text
//! Transport (frames) → Protocol (ChannelEvent) → Match engine / Relay
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    CatalogAppend, CatalogResult, ChannelEvent, ConfirmRoundResult, GameOver,
    JoinRoom, PlayerOk, RelayNotice, ResultSnapshot, SetAbilities,
    SnapshotRequest, StartRound, SubmitFinalScores, WatchAbilityRequests,
};
pub use types::{
    AbilityEntry, AckSignal, AckState, Country, MatchId, MatchSnapshot, Role,
    ScoreMap, Side,
};

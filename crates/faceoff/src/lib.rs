//! # Faceoff
//!
//! Head-to-head match scoring with live viewer sync.
//!
//! One host runs the match and is its only writer. Viewers join the same
//! relay room and render the full snapshots the host publishes after every
//! change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use faceoff::prelude::*;
//!
//! # async fn run() -> Result<(), FaceoffError> {
//! let store = FileStore::open("match.json");
//! let host = connect_host(
//!     "ws://127.0.0.1:8080",
//!     HostConfig::new(MatchId::new("g-7")),
//!     store,
//!     LogPresenter,
//! )
//! .await?;
//!
//! host.adjust_score("Player 1", 10).await?;
//! host.confirm_round().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod hosting;
mod relay_client;

pub use error::FaceoffError;
pub use hosting::{connect_host, connect_host_with};
pub use relay_client::{
    ClientConfig, DEFAULT_CATALOG_TIMEOUT, DEFAULT_RECONNECT_DELAY, RelayClient,
};

pub use faceoff_match as engine;
pub use faceoff_protocol as protocol;
pub use faceoff_relay as relay;
pub use faceoff_transport as transport;

/// Common imports for hosts and viewers.
pub mod prelude {
    pub use crate::{ClientConfig, FaceoffError, RelayClient, connect_host, connect_host_with};
    pub use faceoff_match::{
        Channel, FileStore, HostConfig, HostHandle, LogPresenter, MatchConfig, MatchState,
        MemoryStore, Notice, Presenter, RejoinSchedule, RoundTransition, Seating, SendOutcome,
        ViewerState,
    };
    pub use faceoff_protocol::{ChannelEvent, MatchId, MatchSnapshot, Role, Side};
    pub use faceoff_relay::{RelayServer, RelayServerBuilder};
}

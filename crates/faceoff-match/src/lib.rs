//! Host-authoritative match engine for faceoff.
//!
//! One host owns a match and is the only writer of its state. Viewers never
//! mutate anything; they render the full snapshots the host publishes after
//! every change.
//!
//! # Key types
//!
//! - [`MatchState`]: the authoritative record (scores, round, ledgers, notes)
//! - [`Seating`]: which player sits on which side of the screen
//! - [`AbilityLedger`]: per-player ability lists, add and zero-sum transfer
//! - [`progression`]: round confirmation, game-over detection, round jumps
//! - [`AckTracker`]: per-side "ready" signals
//! - [`SnapshotBroadcaster`]: full-state publishing and resync answers
//! - [`MatchHost`]: ties the above to a store, a channel and a presenter
//! - [`HostHandle`]: front door to a host running as a Tokio actor
//! - [`ViewerState`]: the read-only view a viewer renders from snapshots
//!
//! ```text
//! user action ─┐
//!              ├─► HostActor ─► MatchHost ─► MatchState
//! room event ──┘                   │
//!                                  ├─► DurableStore   (write-through)
//!                                  ├─► Channel        (snapshot, best effort)
//!                                  └─► Presenter      (notices)
//! ```

mod ack;
mod actor;
mod catalog;
mod channel;
mod config;
mod error;
mod host;
mod ledger;
mod phase;
mod presenter;
pub mod progression;
mod rejoin;
mod snapshot;
mod state;
pub mod store;
mod viewer;

pub use ack::AckTracker;
pub use actor::{HostHandle, load_host, spawn_host};
pub use catalog::{AbilityCatalog, DisabledCatalog, MemoryCatalog};
pub use channel::{Channel, MemoryChannel, SendOutcome};
pub use config::{HostConfig, LOCAL_MATCH_ID, MatchConfig};
pub use error::{CatalogError, MatchError, StoreError};
pub use host::MatchHost;
pub use ledger::{AbilityLedger, normalize_abilities};
pub use phase::{MatchOutcome, MatchPhase, Verdict};
pub use presenter::{LogPresenter, Notice, Presenter};
pub use progression::RoundTransition;
pub use rejoin::RejoinSchedule;
pub use snapshot::{SnapshotBroadcaster, build_snapshot};
pub use state::{MatchState, SCORE_MAX, SCORE_MIN, Seating};
pub use store::{DurableStore, FileStore, MatchStore, MemoryStore};
pub use viewer::ViewerState;

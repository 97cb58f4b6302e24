//! User-facing notification seam.

use faceoff_protocol::{AbilityEntry, AckSignal, Side};
use tokio::sync::mpsc;

use crate::{CatalogError, MatchError, MatchOutcome};

/// Something the person running the host should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AbilityAdded {
        player: String,
        entry: AbilityEntry,
    },
    AbilityTransferred {
        from: String,
        to: String,
        entry: AbilityEntry,
    },
    /// The ability is in the ledger, but the catalog did not take it.
    CatalogWriteFailed {
        text: String,
        error: CatalogError,
    },
    /// An operation was refused. State is unchanged.
    Rejected(MatchError),
    /// A new round is on screen; round-scoped media should restart.
    RoundStarted { round: u32 },
    AckChanged { side: Side, signal: AckSignal },
    MatchOver(MatchOutcome),
}

/// Receives notices from the host. Must not block.
pub trait Presenter: Send + 'static {
    fn notify(&self, notice: Notice);
}

/// Writes every notice to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::CatalogWriteFailed { text, error } => {
                tracing::warn!(%text, %error, "ability saved locally but not to the catalog");
            }
            Notice::Rejected(error) => {
                tracing::warn!(%error, "operation rejected");
            }
            Notice::MatchOver(outcome) => {
                tracing::info!(winner = ?outcome.winner(), final_round = outcome.final_round, "match over");
            }
            other => tracing::debug!(notice = ?other, "notice"),
        }
    }
}

/// Forwards notices to a UI task.
impl Presenter for mpsc::UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        let _ = self.send(notice);
    }
}

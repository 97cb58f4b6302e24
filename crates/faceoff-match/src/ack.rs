//! Per-side acknowledgement ("ready") tracking.

use faceoff_protocol::{AckSignal, AckState, PlayerOk, Side};

/// Transient readiness of both sides for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AckTracker {
    state: AckState,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a `playerOk` signal and returns the side's new signal.
    ///
    /// `active` has already been defaulted at the protocol boundary, so a
    /// legacy signal without the field arrives here as `true`.
    pub fn apply(&mut self, signal: &PlayerOk) -> &AckSignal {
        let slot = self.state.side_mut(signal.side);
        *slot = AckSignal {
            active: signal.active,
            player_name: signal.player_name.clone(),
        };
        slot
    }

    /// Clears both sides.
    pub fn reset(&mut self) {
        self.state = AckState::default();
    }

    pub fn is_ready(&self, side: Side) -> bool {
        self.state.side(side).active
    }

    /// The state as carried in snapshots.
    pub fn state(&self) -> &AckState {
        &self.state
    }
}

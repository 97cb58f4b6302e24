//! The read-only side of a match: what a viewer renders.
//!
//! A viewer never reconciles. Every snapshot replaces the previous one
//! wholesale, so applying the same snapshot twice is a no-op and the last
//! snapshot to arrive always wins.

use faceoff_protocol::{
    AckSignal, ChannelEvent, GameOver, MatchId, MatchSnapshot, Side, SnapshotRequest,
};

/// What a viewer of one match currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    match_id: MatchId,
    snapshot: Option<MatchSnapshot>,
    game_over: Option<GameOver>,
}

impl ViewerState {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            snapshot: None,
            game_over: None,
        }
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    pub fn snapshot(&self) -> Option<&MatchSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether at least one snapshot has arrived.
    pub fn is_synced(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn game_over(&self) -> Option<&GameOver> {
        self.game_over.as_ref()
    }

    /// The event a viewer sends after (re)joining to get a full view.
    pub fn resync_request(&self) -> ChannelEvent {
        ChannelEvent::RequestResultSnapshot(SnapshotRequest {
            match_id: Some(self.match_id.clone()),
        })
    }

    /// Replaces the whole view. Returns `false` if nothing changed.
    pub fn apply(&mut self, snapshot: MatchSnapshot) -> bool {
        if self.snapshot.as_ref() == Some(&snapshot) {
            return false;
        }
        self.snapshot = Some(snapshot);
        true
    }

    /// Feeds one room event into the view. Returns `true` if the view
    /// changed. Events for other matches and host-bound events are ignored.
    pub fn handle(&mut self, event: ChannelEvent) -> bool {
        if event.match_id().is_some_and(|id| *id != self.match_id) {
            return false;
        }
        match event {
            ChannelEvent::ResultSnapshot(result) => self.apply(result.snapshot),
            ChannelEvent::ConfirmRoundResult(result) => self.apply(result.snapshot),
            ChannelEvent::GameOver(over) => {
                let changed = self.game_over.as_ref() != Some(&over);
                self.game_over = Some(over);
                changed
            }
            _ => false,
        }
    }

    /// The player shown on `side`. Left is player 2, right is player 1.
    pub fn player(&self, side: Side) -> Option<&str> {
        let snapshot = self.snapshot.as_ref()?;
        Some(match side {
            Side::Left => snapshot.player2.as_str(),
            Side::Right => snapshot.player1.as_str(),
        })
    }

    pub fn score(&self, side: Side) -> Option<i32> {
        let player = self.player(side)?;
        self.snapshot.as_ref()?.scores.get(player).copied()
    }

    pub fn ack(&self, side: Side) -> Option<&AckSignal> {
        self.snapshot.as_ref().map(|snapshot| snapshot.ok.side(side))
    }
}

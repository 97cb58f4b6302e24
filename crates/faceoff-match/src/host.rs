//! The match host: sole writer of a match.
//!
//! [`MatchHost`] ties [`MatchState`] to its collaborators. Each operation
//! follows the same order: validate and mutate, write through to the store,
//! broadcast, notify. A failed store write or publish is logged and the
//! operation still succeeds; only invalid input makes it fail, and then
//! nothing has changed.

use faceoff_protocol::{
    AbilityEntry, ChannelEvent, ConfirmRoundResult, GameOver, JoinRoom, MatchId, MatchSnapshot,
    PlayerOk, Role, SetAbilities, StartRound, SubmitFinalScores, WatchAbilityRequests,
};

use crate::progression::{self, RoundTransition};
use crate::{
    CatalogError, Channel, DurableStore, MatchError, MatchStore, MatchState, Notice, Presenter,
    SendOutcome, SnapshotBroadcaster, StoreError, build_snapshot,
};

/// Owns one match and drives every change to it.
#[derive(Debug)]
pub struct MatchHost<C, S, P> {
    state: MatchState,
    store: MatchStore<S>,
    broadcaster: SnapshotBroadcaster<C>,
    presenter: P,
}

impl<C: Channel, S: DurableStore, P: Presenter> MatchHost<C, S, P> {
    pub fn new(match_id: MatchId, state: MatchState, store: S, channel: C, presenter: P) -> Self {
        Self {
            state,
            store: MatchStore::new(store),
            broadcaster: SnapshotBroadcaster::new(match_id, channel),
            presenter,
        }
    }

    /// Restores the match from `store`.
    pub fn load(match_id: MatchId, store: S, channel: C, presenter: P) -> Result<Self, MatchError> {
        let store = MatchStore::new(store);
        let state = store.load_state()?;
        Ok(Self {
            state,
            store,
            broadcaster: SnapshotBroadcaster::new(match_id, channel),
            presenter,
        })
    }

    pub fn match_id(&self) -> &MatchId {
        self.broadcaster.match_id()
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        build_snapshot(&self.state)
    }

    // -- user actions ------------------------------------------------------

    /// Changes a player's score by `delta` and returns the clamped result.
    pub fn adjust_score(&mut self, identity: &str, delta: i32) -> Result<i32, MatchError> {
        let score = self.checked(|s| s.adjust_score(identity, delta))?;
        tracing::debug!(match_id = %self.match_id(), player = identity, delta, score, "score adjusted");
        let written = self.store.persist_scores(&self.state);
        self.persisted("scores", written);
        self.broadcast();
        Ok(score)
    }

    pub fn edit_note(&mut self, identity: &str, text: &str) -> Result<(), MatchError> {
        self.checked(|s| s.set_note(identity, text))?;
        let written = self.store.persist_note(&self.state, identity);
        self.persisted("note", written);
        self.broadcast();
        Ok(())
    }

    /// Appends an ability. The caller is responsible for the catalog write.
    pub fn add_ability(&mut self, identity: &str, text: &str) -> Result<AbilityEntry, MatchError> {
        let entry = self.checked(|s| s.add_ability(identity, text))?;
        tracing::info!(match_id = %self.match_id(), player = identity, text = %entry.text, "ability added");
        let written = self.store.persist_abilities(&self.state, identity);
        self.persisted("abilities", written);
        self.broadcast();
        self.presenter.notify(Notice::AbilityAdded {
            player: identity.to_string(),
            entry: entry.clone(),
        });
        Ok(entry)
    }

    pub fn transfer_ability(
        &mut self,
        source: &str,
        index: usize,
        target: &str,
    ) -> Result<AbilityEntry, MatchError> {
        let entry = self.checked(|s| s.transfer_ability(source, index, target))?;
        tracing::info!(
            match_id = %self.match_id(),
            from = source,
            to = target,
            text = %entry.text,
            "ability transferred"
        );
        for identity in [source, target] {
            let written = self.store.persist_abilities(&self.state, identity);
            self.persisted("abilities", written);
        }
        self.publish_ability_images();
        self.broadcast();
        self.presenter.notify(Notice::AbilityTransferred {
            from: source.to_string(),
            to: target.to_string(),
            entry: entry.clone(),
        });
        Ok(entry)
    }

    pub fn toggle_ability_used(&mut self, identity: &str, index: usize) -> Result<bool, MatchError> {
        let used = self.checked(|s| s.toggle_ability_used(identity, index))?;
        let written = self.store.persist_abilities(&self.state, identity);
        self.persisted("abilities", written);
        self.broadcast();
        Ok(used)
    }

    /// Confirms the current round and moves on, or ends the match.
    pub fn confirm_round(&mut self) -> Result<RoundTransition, MatchError> {
        let round = self.checked(progression::confirm_round)?;
        let written = self.store.persist_scores(&self.state);
        self.persisted("scores", written);

        self.broadcaster.publish(ChannelEvent::ConfirmRoundResult(ConfirmRoundResult {
            match_id: self.match_id().clone(),
            round,
            snapshot: build_snapshot(&self.state),
        }));

        let transition = self.checked(progression::resolve_round)?;
        match &transition {
            RoundTransition::MatchOver { outcome, .. } => {
                tracing::info!(
                    match_id = %self.match_id(),
                    round,
                    winner = ?outcome.winner(),
                    "match over"
                );
                self.broadcaster.publish(ChannelEvent::GameOver(GameOver {
                    match_id: self.match_id().clone(),
                    scores: outcome.scores.clone(),
                    winner: outcome.winner().map(str::to_string),
                    is_tie: outcome.is_tie(),
                    round_count: self.state.round_count(),
                }));
                self.broadcaster.publish(ChannelEvent::SubmitFinalScores(SubmitFinalScores {
                    match_id: self.match_id().clone(),
                    scores: outcome.scores.clone(),
                }));
                let cleared = self.store.clear_notes(self.state.seating());
                self.persisted("notes", cleared);
                self.broadcast();
                self.presenter.notify(Notice::MatchOver(outcome.clone()));
            }
            RoundTransition::Advanced { next, .. } => {
                self.broadcaster.publish(ChannelEvent::StartRound(StartRound {
                    match_id: self.match_id().clone(),
                    round: *next,
                }));
                self.enter_round(*next);
            }
        }
        Ok(transition)
    }

    /// Jumps to `target`, clamped to the valid range.
    pub fn go_to_round(&mut self, target: i64) -> Result<u32, MatchError> {
        let round = self.checked(|s| progression::go_to_round(s, target))?;
        self.enter_round(round);
        Ok(round)
    }

    // -- channel -----------------------------------------------------------

    /// Handles one inbound room event.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::RequestResultSnapshot(_) => {
                self.broadcaster.answer_resync(&self.state);
            }
            ChannelEvent::PlayerOk(signal) => self.apply_ack(&signal),
            other => {
                tracing::debug!(match_id = %self.match_id(), event = other.name(), "ignoring event");
            }
        }
    }

    /// Announces room membership as the host.
    pub fn announce(&self) -> SendOutcome {
        let joined = self.broadcaster.publish(ChannelEvent::Join(JoinRoom {
            match_id: self.match_id().clone(),
            role: Role::Host,
        }));
        self.broadcaster
            .publish(ChannelEvent::WatchAbilityRequests(WatchAbilityRequests {
                match_id: self.match_id().clone(),
            }));
        joined
    }

    /// Reports a catalog write that did not go through.
    pub fn catalog_failed(&self, text: String, error: CatalogError) {
        self.presenter
            .notify(Notice::CatalogWriteFailed { text, error });
    }

    /// Publishes the current snapshot.
    pub fn broadcast(&self) -> SendOutcome {
        self.broadcaster.broadcast(&self.state)
    }

    // -- internals ---------------------------------------------------------

    fn apply_ack(&mut self, signal: &PlayerOk) {
        if signal.match_id.as_ref().is_some_and(|id| id != self.match_id()) {
            tracing::debug!(match_id = %self.match_id(), "ignoring playerOk for another match");
            return;
        }
        if self.state.is_over() {
            tracing::debug!(match_id = %self.match_id(), "ignoring playerOk after match over");
            return;
        }

        let applied = self.state.acks_mut().apply(signal).clone();
        tracing::debug!(
            match_id = %self.match_id(),
            side = %signal.side,
            active = applied.active,
            "ack changed"
        );
        self.broadcast();
        self.presenter.notify(Notice::AckChanged {
            side: signal.side,
            signal: applied,
        });
    }

    fn enter_round(&mut self, round: u32) {
        tracing::info!(match_id = %self.match_id(), round, "round started");
        let written = self.store.persist_round(&self.state);
        self.persisted("round", written);
        self.publish_ability_images();
        self.broadcast();
        self.presenter.notify(Notice::RoundStarted { round });
    }

    fn publish_ability_images(&self) {
        self.broadcaster.publish(ChannelEvent::SetAbilities(SetAbilities {
            match_id: self.match_id().clone(),
            abilities: self.state.ability_images().clone(),
        }));
    }

    /// Runs a state operation, turning a failure into a `Rejected` notice.
    fn checked<T>(
        &mut self,
        op: impl FnOnce(&mut MatchState) -> Result<T, MatchError>,
    ) -> Result<T, MatchError> {
        op(&mut self.state).inspect_err(|error| {
            tracing::debug!(match_id = %self.broadcaster.match_id(), %error, "operation rejected");
            self.presenter.notify(Notice::Rejected(error.clone()));
        })
    }

    fn persisted(&self, what: &'static str, result: Result<(), StoreError>) {
        if let Err(error) = result {
            tracing::warn!(match_id = %self.match_id(), what, %error, "store write failed");
        }
    }
}

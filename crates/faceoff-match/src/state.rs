//! The authoritative match record.
//!
//! [`MatchState`] is owned by exactly one host. Every field is private; reads
//! go through accessors and writes go through the operations below, which
//! refuse to run once the match is over.

use std::collections::BTreeMap;

use faceoff_protocol::{AbilityEntry, Country, ScoreMap, Side};

use crate::{AbilityLedger, AckTracker, MatchError, MatchPhase};

/// Lowest score a player can hold.
pub const SCORE_MIN: i32 = -100;
/// Highest score a player can hold.
pub const SCORE_MAX: i32 = 100;

// ---------------------------------------------------------------------------
// Seating
// ---------------------------------------------------------------------------

/// Fixed mapping between the two player labels and the two screen sides.
///
/// The first player sits on the **right** and the second on the **left**.
/// The crossing mirrors how the players sit in front of the host screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seating {
    player1: String,
    player2: String,
}

impl Seating {
    /// Seats two players. Their display names must differ.
    pub fn new(player1: impl Into<String>, player2: impl Into<String>) -> Result<Self, MatchError> {
        let player1 = player1.into();
        let player2 = player2.into();
        if player1 == player2 {
            return Err(MatchError::DuplicatePlayer(player1));
        }
        Ok(Self { player1, player2 })
    }

    pub fn player1(&self) -> &str {
        &self.player1
    }

    pub fn player2(&self) -> &str {
        &self.player2
    }

    /// The side a player sits on, or `None` for a stranger.
    pub fn seat_of(&self, identity: &str) -> Option<Side> {
        if identity == self.player1 {
            Some(Side::Right)
        } else if identity == self.player2 {
            Some(Side::Left)
        } else {
            None
        }
    }

    /// The player sitting on `side`.
    pub fn player_at(&self, side: Side) -> &str {
        match side {
            Side::Right => &self.player1,
            Side::Left => &self.player2,
        }
    }

    /// Both identities, player 1 first.
    pub fn identities(&self) -> [&str; 2] {
        [&self.player1, &self.player2]
    }
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// Everything the host knows about one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    seating: Seating,
    round_count: u32,
    phase: MatchPhase,
    scores: ScoreMap,
    picks: BTreeMap<String, Vec<Option<String>>>,
    ledger: AbilityLedger,
    ability_images: BTreeMap<String, Option<String>>,
    countries: BTreeMap<String, Option<Country>>,
    notes: BTreeMap<String, String>,
    acks: AckTracker,
}

impl MatchState {
    /// A fresh match at round 0 with both scores at 0.
    pub fn new(seating: Seating, round_count: u32) -> Result<Self, MatchError> {
        if round_count == 0 {
            return Err(MatchError::InvalidRoundCount(round_count));
        }

        Ok(Self {
            round_count,
            phase: MatchPhase::RoundActive(0),
            scores: per_player(&seating, 0),
            picks: per_player(&seating, Vec::new()),
            ledger: AbilityLedger::new(seating.identities()),
            ability_images: per_player(&seating, None),
            countries: per_player(&seating, None),
            notes: per_player(&seating, String::new()),
            acks: AckTracker::new(),
            seating,
        })
    }

    // -- restore -----------------------------------------------------------

    /// Restores the active round, clamped into `[0, round_count - 1]`.
    pub fn with_round(mut self, round: i64) -> Self {
        self.phase = MatchPhase::RoundActive(self.clamp_round(round));
        self
    }

    /// Restores scores for known players, clamping each value.
    pub fn with_scores(mut self, scores: &BTreeMap<String, i64>) -> Self {
        for (name, score) in scores {
            if let Some(slot) = self.scores.get_mut(name) {
                *slot = clamp_score(*score);
            }
        }
        self
    }

    /// Restores one player's per-round picks.
    pub fn with_picks(mut self, identity: &str, picks: Vec<Option<String>>) -> Self {
        if let Some(slot) = self.picks.get_mut(identity) {
            *slot = picks;
        }
        self
    }

    /// Restores one player's ability ledger.
    pub fn with_abilities(mut self, identity: &str, entries: Vec<AbilityEntry>) -> Self {
        self.ledger.replace(identity, entries);
        self
    }

    pub fn with_ability_image(mut self, identity: &str, image: Option<String>) -> Self {
        if let Some(slot) = self.ability_images.get_mut(identity) {
            *slot = image;
        }
        self
    }

    pub fn with_country(mut self, identity: &str, country: Option<Country>) -> Self {
        if let Some(slot) = self.countries.get_mut(identity) {
            *slot = country;
        }
        self
    }

    pub fn with_note(mut self, identity: &str, note: impl Into<String>) -> Self {
        if let Some(slot) = self.notes.get_mut(identity) {
            *slot = note.into();
        }
        self
    }

    // -- read --------------------------------------------------------------

    pub fn seating(&self) -> &Seating {
        &self.seating
    }

    pub fn round_count(&self) -> u32 {
        self.round_count
    }

    /// The current round index.
    pub fn round(&self) -> u32 {
        self.phase.round()
    }

    pub fn phase(&self) -> &MatchPhase {
        &self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_over()
    }

    pub fn scores(&self) -> &ScoreMap {
        &self.scores
    }

    pub fn score(&self, identity: &str) -> Option<i32> {
        self.scores.get(identity).copied()
    }

    pub fn ledger(&self) -> &AbilityLedger {
        &self.ledger
    }

    pub fn ability_images(&self) -> &BTreeMap<String, Option<String>> {
        &self.ability_images
    }

    pub fn countries(&self) -> &BTreeMap<String, Option<Country>> {
        &self.countries
    }

    pub fn notes(&self) -> &BTreeMap<String, String> {
        &self.notes
    }

    pub fn acks(&self) -> &AckTracker {
        &self.acks
    }

    /// The pick a player revealed for `round`, if any.
    pub fn pick(&self, identity: &str, round: u32) -> Option<&str> {
        self.picks
            .get(identity)?
            .get(round as usize)?
            .as_deref()
    }

    /// Picks of the rounds before the current one, in round order.
    /// Rounds with no pick are skipped.
    pub fn previous_picks(&self, identity: &str) -> Vec<String> {
        self.picks
            .get(identity)
            .map(|slots| {
                slots
                    .iter()
                    .take(self.round() as usize)
                    .flatten()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // -- mutate ------------------------------------------------------------

    /// Adds `delta` to a player's score and returns the clamped result.
    pub fn adjust_score(&mut self, identity: &str, delta: i32) -> Result<i32, MatchError> {
        self.ensure_open()?;
        let slot = self
            .scores
            .get_mut(identity)
            .ok_or_else(|| MatchError::UnknownPlayer(identity.to_string()))?;
        *slot = clamp_score(i64::from(*slot) + i64::from(delta));
        Ok(*slot)
    }

    /// Replaces a player's free-form note.
    pub fn set_note(&mut self, identity: &str, text: impl Into<String>) -> Result<(), MatchError> {
        self.ensure_open()?;
        let slot = self
            .notes
            .get_mut(identity)
            .ok_or_else(|| MatchError::UnknownPlayer(identity.to_string()))?;
        *slot = text.into();
        Ok(())
    }

    pub fn add_ability(&mut self, identity: &str, text: &str) -> Result<AbilityEntry, MatchError> {
        self.ensure_open()?;
        self.ledger.add(identity, text).cloned()
    }

    pub fn transfer_ability(
        &mut self,
        source: &str,
        index: usize,
        target: &str,
    ) -> Result<AbilityEntry, MatchError> {
        self.ensure_open()?;
        self.ledger.transfer(source, index, target)
    }

    pub fn toggle_ability_used(&mut self, identity: &str, index: usize) -> Result<bool, MatchError> {
        self.ensure_open()?;
        self.ledger.toggle_used(identity, index)
    }

    /// Fails with [`MatchError::MatchOver`] once the match has ended.
    pub fn ensure_open(&self) -> Result<(), MatchError> {
        if self.is_over() {
            return Err(MatchError::MatchOver);
        }
        Ok(())
    }

    pub(crate) fn acks_mut(&mut self) -> &mut AckTracker {
        &mut self.acks
    }

    pub(crate) fn set_phase(&mut self, phase: MatchPhase) {
        self.phase = phase;
    }

    pub(crate) fn clear_notes(&mut self) {
        self.notes.values_mut().for_each(String::clear);
    }

    pub(crate) fn clamp_round(&self, round: i64) -> u32 {
        let last = i64::from(self.round_count) - 1;
        // `last` is at most u32::MAX - 1, so the cast cannot truncate.
        round.clamp(0, last) as u32
    }
}

fn per_player<T: Clone>(seating: &Seating, value: T) -> BTreeMap<String, T> {
    seating
        .identities()
        .iter()
        .map(|name| (name.to_string(), value.clone()))
        .collect()
}

fn clamp_score(value: i64) -> i32 {
    value.clamp(i64::from(SCORE_MIN), i64::from(SCORE_MAX)) as i32
}


#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum LedgerOp {
        Add(usize, String),
        Transfer(usize, usize, usize),
        Toggle(usize, usize),
    }

    const PLAYERS: [&str; 2] = ["A", "B"];

    fn ledger_op() -> impl Strategy<Value = LedgerOp> {
        prop_oneof![
            (0..2usize, "[a-z ]{0,6}").prop_map(|(who, text)| LedgerOp::Add(who, text)),
            (0..2usize, 0..6usize, 0..2usize)
                .prop_map(|(from, index, to)| LedgerOp::Transfer(from, index, to)),
            (0..2usize, 0..6usize).prop_map(|(who, index)| LedgerOp::Toggle(who, index)),
        ]
    }

    fn fresh() -> MatchState {
        MatchState::new(Seating::new(PLAYERS[0], PLAYERS[1]).unwrap(), 5).unwrap()
    }

    proptest! {
        /// Scores never leave the clamp range and follow a step-wise clamp.
        #[test]
        fn prop_scores_stay_clamped(deltas in prop::collection::vec(any::<i32>(), 0..40)) {
            let mut state = fresh();
            let mut expected = 0i32;

            for delta in deltas {
                let score = state.adjust_score("A", delta).unwrap();
                expected = clamp_score(i64::from(expected) + i64::from(delta));
                prop_assert!((SCORE_MIN..=SCORE_MAX).contains(&score));
                prop_assert_eq!(score, expected);
            }
            prop_assert_eq!(state.score("B"), Some(0));
        }

        /// Only a successful add changes how many abilities exist.
        #[test]
        fn prop_ledger_total_only_grows_by_adds(ops in prop::collection::vec(ledger_op(), 0..60)) {
            let mut state = fresh();

            for op in ops {
                let before = state.ledger().total();
                match op {
                    LedgerOp::Add(who, text) => {
                        let added = state.add_ability(PLAYERS[who], &text).is_ok();
                        prop_assert_eq!(state.ledger().total(), before + usize::from(added));
                    }
                    LedgerOp::Transfer(from, index, to) => {
                        let source = state.ledger().entries(PLAYERS[from]).get(index).cloned();
                        match state.transfer_ability(PLAYERS[from], index, PLAYERS[to]) {
                            Ok(moved) => {
                                prop_assert_eq!(Some(&moved), source.as_ref());
                                prop_assert_eq!(state.ledger().entries(PLAYERS[to]).last(), Some(&moved));
                            }
                            Err(_) => prop_assert!(source.is_none()),
                        }
                        prop_assert_eq!(state.ledger().total(), before);
                    }
                    LedgerOp::Toggle(who, index) => {
                        let _ = state.toggle_ability_used(PLAYERS[who], index);
                        prop_assert_eq!(state.ledger().total(), before);
                    }
                }
            }
        }
    }
}

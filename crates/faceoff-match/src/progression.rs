//! Round progression: confirming rounds, detecting the end of a match, and
//! administrative round jumps.
//!
//! These are plain functions over [`MatchState`]. They perform no I/O; the
//! host persists and broadcasts around them.

use crate::state::{SCORE_MAX, SCORE_MIN};
use crate::{MatchError, MatchOutcome, MatchPhase, MatchState, Verdict};

/// What happened after a confirmed round was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTransition {
    /// Play continues at `next`.
    Advanced { confirmed: u32, next: u32 },
    /// The match ended after `confirmed`.
    MatchOver { confirmed: u32, outcome: MatchOutcome },
}

/// Returns `true` if moving to round `next` would end the match.
///
/// The match ends when the round count is exhausted, or as sudden death
/// when any score sits exactly on a boundary.
pub fn is_final(state: &MatchState, next: u32) -> bool {
    next >= state.round_count()
        || state
            .scores()
            .values()
            .any(|score| *score == SCORE_MAX || *score == SCORE_MIN)
}

/// Locks in the current round: `RoundActive(r)` → `RoundConfirmed(r)`.
pub fn confirm_round(state: &mut MatchState) -> Result<u32, MatchError> {
    state.ensure_open()?;
    let round = state.phase().round();
    enter(state, MatchPhase::RoundConfirmed(round))?;
    Ok(round)
}

/// Resolves a confirmed round into the next round or the end of the match.
///
/// On match over the notes are cleared and the phase becomes terminal.
/// Otherwise the next round starts with both acknowledgements reset.
pub fn resolve_round(state: &mut MatchState) -> Result<RoundTransition, MatchError> {
    let confirmed = match state.phase() {
        MatchPhase::RoundConfirmed(r) => *r,
        MatchPhase::MatchOver(_) => return Err(MatchError::MatchOver),
        other => return Err(MatchError::InvalidPhase(format!("cannot resolve in {other}"))),
    };
    let next = confirmed.saturating_add(1);

    if is_final(state, next) {
        let outcome = MatchOutcome {
            verdict: verdict(state),
            final_round: confirmed,
            scores: state.scores().clone(),
        };
        enter(state, MatchPhase::MatchOver(outcome.clone()))?;
        state.clear_notes();
        return Ok(RoundTransition::MatchOver { confirmed, outcome });
    }

    enter(state, MatchPhase::RoundActive(next))?;
    state.acks_mut().reset();
    Ok(RoundTransition::Advanced { confirmed, next })
}

/// Confirms and resolves the current round in one step.
pub fn advance(state: &mut MatchState) -> Result<RoundTransition, MatchError> {
    confirm_round(state)?;
    resolve_round(state)
}

/// Jumps to `target`, clamped into `[0, round_count - 1]`, and resets the
/// round-scoped acknowledgements. Returns the round actually set.
pub fn go_to_round(state: &mut MatchState, target: i64) -> Result<u32, MatchError> {
    state.ensure_open()?;
    let round = state.clamp_round(target);
    state.set_phase(MatchPhase::RoundActive(round));
    state.acks_mut().reset();
    Ok(round)
}

/// Moves along the round cycle. Jumps outside it go through [`go_to_round`].
fn enter(state: &mut MatchState, next: MatchPhase) -> Result<(), MatchError> {
    if !state.phase().can_transition_to(&next) {
        return Err(MatchError::InvalidPhase(format!(
            "cannot move from {} to {next}",
            state.phase()
        )));
    }
    state.set_phase(next);
    Ok(())
}

/// Strictly greater score wins; equal scores tie.
fn verdict(state: &MatchState) -> Verdict {
    let seating = state.seating();
    let first = state.score(seating.player1()).unwrap_or_default();
    let second = state.score(seating.player2()).unwrap_or_default();
    match first.cmp(&second) {
        std::cmp::Ordering::Greater => Verdict::Winner(seating.player1().to_string()),
        std::cmp::Ordering::Less => Verdict::Winner(seating.player2().to_string()),
        std::cmp::Ordering::Equal => Verdict::Tie,
    }
}

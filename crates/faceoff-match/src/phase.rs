//! Match phase state machine.

use std::fmt;

use faceoff_protocol::ScoreMap;

// ---------------------------------------------------------------------------
// MatchOutcome
// ---------------------------------------------------------------------------

/// How a finished match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// This player finished with the strictly greater score.
    Winner(String),
    /// Both scores are equal.
    Tie,
}

/// The frozen result of a finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub verdict: Verdict,
    /// The last round that was played.
    pub final_round: u32,
    pub scores: ScoreMap,
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Winner(name) => Some(name),
            Verdict::Tie => None,
        }
    }

    pub fn is_tie(&self) -> bool {
        matches!(self.verdict, Verdict::Tie)
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Where a match is in its round cycle.
///
/// ```text
/// RoundActive(r) → RoundConfirmed(r) → RoundActive(r + 1)
///                                    ↘ MatchOver(outcome)
/// ```
///
/// - **RoundActive**: picks are on screen, scores and notes are edited.
/// - **RoundConfirmed**: the host has locked in round `r`; the match
///   either advances or ends before any other operation runs.
/// - **MatchOver**: terminal. Nothing leaves this phase.
///
/// Administrative jumps (`go_to_round`) move between `RoundActive` values
/// directly and are not part of this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPhase {
    RoundActive(u32),
    RoundConfirmed(u32),
    MatchOver(MatchOutcome),
}

impl MatchPhase {
    /// The round index the phase refers to.
    pub fn round(&self) -> u32 {
        match self {
            Self::RoundActive(r) | Self::RoundConfirmed(r) => *r,
            Self::MatchOver(outcome) => outcome.final_round,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self, Self::MatchOver(_))
    }

    /// Returns `true` if the round cycle allows moving to `target`.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        match (self, target) {
            (Self::RoundActive(r), Self::RoundConfirmed(c)) => r == c,
            (Self::RoundConfirmed(c), Self::RoundActive(n)) => c.checked_add(1) == Some(*n),
            (Self::RoundConfirmed(_), Self::MatchOver(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundActive(r) => write!(f, "RoundActive({r})"),
            Self::RoundConfirmed(r) => write!(f, "RoundConfirmed({r})"),
            Self::MatchOver(outcome) => match outcome.winner() {
                Some(name) => write!(f, "MatchOver(winner {name})"),
                None => write!(f, "MatchOver(tie)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tie() -> MatchOutcome {
        MatchOutcome {
            verdict: Verdict::Tie,
            final_round: 4,
            scores: ScoreMap::new(),
        }
    }

    #[test]
    fn test_cycle_transitions() {
        assert!(MatchPhase::RoundActive(2).can_transition_to(&MatchPhase::RoundConfirmed(2)));
        assert!(MatchPhase::RoundConfirmed(2).can_transition_to(&MatchPhase::RoundActive(3)));
        assert!(MatchPhase::RoundConfirmed(2).can_transition_to(&MatchPhase::MatchOver(tie())));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!MatchPhase::RoundActive(2).can_transition_to(&MatchPhase::RoundConfirmed(3)));
        assert!(!MatchPhase::RoundActive(2).can_transition_to(&MatchPhase::MatchOver(tie())));
        assert!(!MatchPhase::RoundConfirmed(2).can_transition_to(&MatchPhase::RoundActive(2)));
        assert!(!MatchPhase::MatchOver(tie()).can_transition_to(&MatchPhase::RoundActive(0)));
    }

    #[test]
    fn test_round_of_finished_match_is_final_round() {
        assert_eq!(MatchPhase::MatchOver(tie()).round(), 4);
        assert!(MatchPhase::MatchOver(tie()).is_over());
        assert!(!MatchPhase::RoundActive(0).is_over());
    }

    #[test]
    fn test_display() {
        assert_eq!(MatchPhase::RoundActive(1).to_string(), "RoundActive(1)");
        assert_eq!(MatchPhase::MatchOver(tie()).to_string(), "MatchOver(tie)");
        let won = MatchOutcome {
            verdict: Verdict::Winner("B".into()),
            ..tie()
        };
        assert_eq!(MatchPhase::MatchOver(won).to_string(), "MatchOver(winner B)");
    }
}

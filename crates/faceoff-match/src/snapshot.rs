//! Snapshot building and broadcasting.
//!
//! A snapshot is the whole match, every time. Viewers replace their view
//! with the latest one they receive, so publishing an unchanged snapshot
//! again is harmless and there is no dirty tracking.

use faceoff_protocol::{ChannelEvent, MatchId, MatchSnapshot, ResultSnapshot, Side};

use crate::{Channel, MatchState, SendOutcome};

/// Serializes the full match state into one self-contained value.
///
/// Only ordered maps feed the snapshot, so equal states always produce
/// equal snapshots (and equal bytes once encoded).
pub fn build_snapshot(state: &MatchState) -> MatchSnapshot {
    let seating = state.seating();
    let left = seating.player_at(Side::Left);
    let right = seating.player_at(Side::Right);
    let round = state.round();

    MatchSnapshot {
        player1: seating.player1().to_string(),
        player2: seating.player2().to_string(),
        round,
        round_count: state.round_count(),
        scores: state.scores().clone(),
        ok: state.acks().state().clone(),
        abilities: state.ability_images().clone(),
        ability_lists: state.ledger().lists().clone(),
        countries: state.countries().clone(),
        current_left_url: state.pick(left, round).map(str::to_string),
        current_right_url: state.pick(right, round).map(str::to_string),
        prev_left: state.previous_picks(left),
        prev_right: state.previous_picks(right),
        notes: state.notes().clone(),
    }
}

/// Publishes events for one match into its room.
#[derive(Debug)]
pub struct SnapshotBroadcaster<C> {
    match_id: MatchId,
    channel: C,
}

impl<C: Channel> SnapshotBroadcaster<C> {
    pub fn new(match_id: MatchId, channel: C) -> Self {
        Self { match_id, channel }
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Publishes the current snapshot as `resultSnapshot`.
    pub fn broadcast(&self, state: &MatchState) -> SendOutcome {
        self.publish(ChannelEvent::ResultSnapshot(ResultSnapshot {
            match_id: self.match_id.clone(),
            snapshot: build_snapshot(state),
        }))
    }

    /// Answers a viewer's resync request. Identical to [`broadcast`]; kept
    /// separate so the two show up apart in logs.
    ///
    /// [`broadcast`]: Self::broadcast
    pub fn answer_resync(&self, state: &MatchState) -> SendOutcome {
        tracing::debug!(match_id = %self.match_id, round = state.round(), "answering resync");
        self.broadcast(state)
    }

    /// Publishes any event. A failure is logged and returned, never raised.
    pub fn publish(&self, event: ChannelEvent) -> SendOutcome {
        let name = event.name();
        let outcome = self.channel.publish(event);
        match &outcome {
            SendOutcome::Sent => {
                tracing::debug!(match_id = %self.match_id, event = name, "published");
            }
            SendOutcome::Failed(reason) => {
                tracing::warn!(match_id = %self.match_id, event = name, %reason, "publish failed");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use faceoff_protocol::{AckSignal, Codec, Country, JsonCodec, PlayerOk};

    use super::*;
    use crate::{MemoryChannel, Seating};

    fn state() -> MatchState {
        MatchState::new(Seating::new("A", "B").unwrap(), 5)
            .unwrap()
            .with_picks("A", vec![Some("a0".into()), Some("a1".into()), Some("a2".into())])
            .with_picks("B", vec![Some("b0".into()), None, Some("b2".into())])
            .with_country(
                "B",
                Some(Country {
                    name: Some("Oman".into()),
                    image: Some("om.svg".into()),
                }),
            )
            .with_ability_image("A", Some("a.png".into()))
            .with_round(2)
    }

    #[test]
    fn test_sides_follow_seating() {
        let snap = build_snapshot(&state());

        assert_eq!(snap.current_right_url.as_deref(), Some("a2"));
        assert_eq!(snap.current_left_url.as_deref(), Some("b2"));
        assert_eq!(snap.prev_right, vec!["a0", "a1"]);
        assert_eq!(snap.prev_left, vec!["b0"]);
    }

    #[test]
    fn test_snapshot_carries_everything() {
        let mut s = state();
        s.add_ability("A", "Fireball").unwrap();
        s.set_note("B", "tilted").unwrap();
        s.acks_mut().apply(&PlayerOk {
            match_id: None,
            player_name: Some("B".into()),
            side: Side::Left,
            active: true,
        });

        let snap = build_snapshot(&s);

        assert_eq!(snap.round, 2);
        assert_eq!(snap.round_count, 5);
        assert_eq!(snap.player1, "A");
        assert_eq!(snap.abilities["A"].as_deref(), Some("a.png"));
        assert_eq!(snap.abilities["B"], None);
        assert_eq!(snap.ability_lists["A"].len(), 1);
        assert_eq!(snap.countries["B"].as_ref().and_then(|c| c.name.as_deref()), Some("Oman"));
        assert_eq!(snap.notes["B"], "tilted");
        assert_eq!(
            snap.ok.left,
            AckSignal {
                active: true,
                player_name: Some("B".into())
            }
        );
    }

    #[test]
    fn test_same_state_encodes_to_same_bytes() {
        let s = state();
        let a = JsonCodec.encode(&build_snapshot(&s)).unwrap();
        let b = JsonCodec.encode(&build_snapshot(&s.clone())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_pick_is_null() {
        let s = state().with_round(4);
        let snap = build_snapshot(&s);
        assert_eq!(snap.current_left_url, None);
        assert_eq!(snap.prev_left, vec!["b0", "b2"]);
    }

    #[test]
    fn test_broadcast_and_resync_publish_same_event() {
        let (channel, mut rx) = MemoryChannel::new();
        let broadcaster = SnapshotBroadcaster::new(MatchId::new("g-9"), channel);
        let s = state();

        assert!(broadcaster.broadcast(&s).is_sent());
        assert!(broadcaster.answer_resync(&s).is_sent());

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name(), "resultSnapshot");
        assert_eq!(first.match_id(), Some(&MatchId::new("g-9")));
    }

    #[test]
    fn test_failed_publish_is_reported_not_raised() {
        let (channel, rx) = MemoryChannel::new();
        drop(rx);
        let broadcaster = SnapshotBroadcaster::new(MatchId::new("g-9"), channel);
        assert!(!broadcaster.broadcast(&state()).is_sent());
    }
}

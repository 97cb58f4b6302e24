//! Channel events exchanged inside a match room.
//!
//! Every frame on the wire is one [`ChannelEvent`], adjacently tagged:
//!
//! ```text
//! { "event": "playerOk", "data": { "matchId": "g-7", "side": "left", ... } }
//! ```
//!
//! Defaulting rules for loosely shaped legacy payloads are applied here,
//! during decoding, so handlers only ever see fully populated values.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{MatchId, MatchSnapshot, Role, ScoreMap, Side};

// ---------------------------------------------------------------------------
// Host → room
// ---------------------------------------------------------------------------

/// Establishes room membership. Re-sent on a fixed schedule after connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub match_id: MatchId,
    #[serde(default)]
    pub role: Role,
}

/// Subscribes the sender to ability-catalog requests for the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchAbilityRequests {
    pub match_id: MatchId,
}

/// Full-state broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSnapshot {
    pub match_id: MatchId,
    pub snapshot: MatchSnapshot,
}

/// The host confirmed the outcome of `round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRoundResult {
    pub match_id: MatchId,
    pub round: u32,
    pub snapshot: MatchSnapshot,
}

/// `round` is beginning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRound {
    pub match_id: MatchId,
    pub round: u32,
}

/// Terminal result of the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub match_id: MatchId,
    pub scores: ScoreMap,
    pub winner: Option<String>,
    pub is_tie: bool,
    pub round_count: u32,
}

/// Final scores, for whoever keeps a record of finished matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFinalScores {
    pub match_id: MatchId,
    pub scores: ScoreMap,
}

/// Ability image reference per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAbilities {
    pub match_id: MatchId,
    pub abilities: std::collections::BTreeMap<String, Option<String>>,
}

// ---------------------------------------------------------------------------
// Room → host
// ---------------------------------------------------------------------------

/// A viewer asking for the current snapshot. The payload is usually `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotRequest {
    pub match_id: Option<MatchId>,
}

/// A player's "ready" signal.
///
/// `active` follows the legacy contract: when the field is absent the
/// message itself means "ready", so it decodes as `true`. A present value
/// is read for truthiness: `null`, `false`, `0` and `""` are not ready,
/// anything else is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOk {
    #[serde(default)]
    pub match_id: Option<MatchId>,
    #[serde(default)]
    pub player_name: Option<String>,
    pub side: Side,
    #[serde(default = "ready_when_absent", deserialize_with = "truthy_flag")]
    pub active: bool,
}

fn ready_when_absent() -> bool {
    true
}

/// Any JSON value a legacy client might put in a flag.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseFlag {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseFlag>::deserialize(deserializer)? {
        None => false,
        Some(LooseFlag::Bool(b)) => b,
        Some(LooseFlag::Number(n)) => n != 0.0 && !n.is_nan(),
        Some(LooseFlag::Text(s)) => !s.is_empty(),
        Some(LooseFlag::Other(_)) => true,
    })
}

// ---------------------------------------------------------------------------
// Catalog (relay-served)
// ---------------------------------------------------------------------------

/// Asks the relay to append an ability text to its durable catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAppend {
    pub request_id: u64,
    pub text: String,
}

/// The relay's answer to a [`CatalogAppend`], sent to the requester only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResult {
    pub request_id: u64,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Something the relay refused to do for this connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayNotice {
    pub code: u16,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ChannelEvent
// ---------------------------------------------------------------------------

/// Every event that can travel through a match room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ChannelEvent {
    Join(JoinRoom),
    WatchAbilityRequests(WatchAbilityRequests),
    ResultSnapshot(ResultSnapshot),
    ConfirmRoundResult(ConfirmRoundResult),
    StartRound(StartRound),
    GameOver(GameOver),
    SubmitFinalScores(SubmitFinalScores),
    SetAbilities(SetAbilities),
    RequestResultSnapshot(SnapshotRequest),
    PlayerOk(PlayerOk),
    CatalogAppend(CatalogAppend),
    CatalogResult(CatalogResult),
    Error(RelayNotice),
}

impl ChannelEvent {
    /// The wire name of the event, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::WatchAbilityRequests(_) => "watchAbilityRequests",
            Self::ResultSnapshot(_) => "resultSnapshot",
            Self::ConfirmRoundResult(_) => "confirmRoundResult",
            Self::StartRound(_) => "startRound",
            Self::GameOver(_) => "gameOver",
            Self::SubmitFinalScores(_) => "submitFinalScores",
            Self::SetAbilities(_) => "setAbilities",
            Self::RequestResultSnapshot(_) => "requestResultSnapshot",
            Self::PlayerOk(_) => "playerOk",
            Self::CatalogAppend(_) => "catalogAppend",
            Self::CatalogResult(_) => "catalogResult",
            Self::Error(_) => "error",
        }
    }

    /// The match the event names, if its payload carries one.
    pub fn match_id(&self) -> Option<&MatchId> {
        match self {
            Self::Join(e) => Some(&e.match_id),
            Self::WatchAbilityRequests(e) => Some(&e.match_id),
            Self::ResultSnapshot(e) => Some(&e.match_id),
            Self::ConfirmRoundResult(e) => Some(&e.match_id),
            Self::StartRound(e) => Some(&e.match_id),
            Self::GameOver(e) => Some(&e.match_id),
            Self::SubmitFinalScores(e) => Some(&e.match_id),
            Self::SetAbilities(e) => Some(&e.match_id),
            Self::RequestResultSnapshot(e) => e.match_id.as_ref(),
            Self::PlayerOk(e) => e.match_id.as_ref(),
            Self::CatalogAppend(_) | Self::CatalogResult(_) | Self::Error(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> ChannelEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_event_is_adjacently_tagged() {
        let event = ChannelEvent::StartRound(StartRound {
            match_id: MatchId::new("g-1"),
            round: 3,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "startRound");
        assert_eq!(json["data"]["matchId"], "g-1");
        assert_eq!(json["data"]["round"], 3);
    }

    #[test]
    fn test_player_ok_without_active_means_ready() {
        let event = decode(
            r#"{"event":"playerOk","data":{"matchId":"g","playerName":"A","side":"left"}}"#,
        );
        let ChannelEvent::PlayerOk(ok) = event else {
            panic!("expected playerOk");
        };
        assert!(ok.active);
    }

    #[test]
    fn test_player_ok_absent_and_true_decode_identically() {
        let legacy = decode(r#"{"event":"playerOk","data":{"playerName":"A","side":"right"}}"#);
        let explicit = decode(
            r#"{"event":"playerOk","data":{"playerName":"A","side":"right","active":true}}"#,
        );
        assert_eq!(legacy, explicit);
    }

    #[test]
    fn test_player_ok_explicit_false_and_null() {
        for active in ["false", "null"] {
            let json = format!(
                r#"{{"event":"playerOk","data":{{"side":"left","active":{active}}}}}"#
            );
            let ChannelEvent::PlayerOk(ok) = decode(&json) else {
                panic!("expected playerOk");
            };
            assert!(!ok.active, "active={active}");
            assert!(ok.player_name.is_none());
            assert!(ok.match_id.is_none());
        }
    }

    #[test]
    fn test_player_ok_reads_loose_flags_for_truthiness() {
        let cases = [
            ("1", true),
            ("0", false),
            ("2.5", true),
            (r#""yes""#, true),
            (r#""""#, false),
            ("[]", true),
            ("{}", true),
        ];
        for (active, expected) in cases {
            let json = format!(
                r#"{{"event":"playerOk","data":{{"side":"right","active":{active}}}}}"#
            );
            let ChannelEvent::PlayerOk(ok) = decode(&json) else {
                panic!("expected playerOk");
            };
            assert_eq!(ok.active, expected, "active={active}");
        }
    }

    #[test]
    fn test_player_ok_with_unknown_side_fails_to_decode() {
        let result: Result<ChannelEvent, _> =
            serde_json::from_str(r#"{"event":"playerOk","data":{"side":"up"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_request_accepts_empty_payload() {
        let event = decode(r#"{"event":"requestResultSnapshot","data":{}}"#);
        assert_eq!(
            event,
            ChannelEvent::RequestResultSnapshot(SnapshotRequest::default())
        );
        assert!(event.match_id().is_none());
    }

    #[test]
    fn test_join_role_defaults_to_viewer() {
        let event = decode(r#"{"event":"join","data":{"matchId":"g"}}"#);
        let ChannelEvent::Join(join) = event else {
            panic!("expected join");
        };
        assert_eq!(join.role, Role::Viewer);
    }

    #[test]
    fn test_join_host_wire_shape() {
        let event = ChannelEvent::Join(JoinRoom {
            match_id: MatchId::new("g-9"),
            role: Role::Host,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "join", "data": {"matchId": "g-9", "role": "host"}})
        );
    }

    #[test]
    fn test_game_over_wire_shape() {
        let mut scores = ScoreMap::new();
        scores.insert("A".into(), 4);
        scores.insert("B".into(), 4);
        let event = ChannelEvent::GameOver(GameOver {
            match_id: MatchId::new("g"),
            scores,
            winner: None,
            is_tie: true,
            round_count: 5,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["isTie"], true);
        assert!(json["data"]["winner"].is_null());
        assert_eq!(json["data"]["roundCount"], 5);
    }

    #[test]
    fn test_catalog_result_omits_missing_error() {
        let event = ChannelEvent::CatalogResult(CatalogResult {
            request_id: 7,
            ok: true,
            error: None,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["data"].get("error").is_none());
        assert_eq!(json["data"]["requestId"], 7);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result: Result<ChannelEvent, _> =
            serde_json::from_str(r#"{"event":"flyToMoon","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_event_names_match_wire_tags() {
        let event = ChannelEvent::WatchAbilityRequests(WatchAbilityRequests {
            match_id: MatchId::new("g"),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(event.match_id(), Some(&MatchId::new("g")));
    }
}

//! Durable local store adapter.
//!
//! The host keeps a small set of named string values that survive a restart
//! of the host process. [`DurableStore`] is the raw key/value seam;
//! [`MatchStore`] layers the match's keys and their forgiving decoding on
//! top of it.
//!
//! Decoding never fails. A missing or malformed value is replaced by a safe
//! default and logged at `warn`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use faceoff_protocol::{AbilityEntry, Country, MatchId, Side};
use serde_json::Value;

use crate::{MatchConfig, MatchError, MatchState, Seating, StoreError, normalize_abilities};

/// Key names used by the host.
pub mod keys {
    use faceoff_protocol::Side;

    pub const ROUND_COUNT: &str = "roundCount";
    /// Older setups wrote the round count under this name.
    pub const LEGACY_ROUND_COUNT: &str = "totalRounds";
    pub const PLAYER1: &str = "player1";
    pub const PLAYER2: &str = "player2";
    pub const PICKS: &str = "picks";
    pub const CURRENT_ROUND: &str = "currentRound";
    pub const SCORES: &str = "scores";
    pub const GAME_ID: &str = "gameID";

    /// `notes:<name>`
    pub fn notes(name: &str) -> String {
        format!("notes:{name}")
    }

    // Per-player keys are labelled by player number. Player 1 sits right.

    pub fn abilities(side: Side) -> &'static str {
        match side {
            Side::Right => "player1Abilities",
            Side::Left => "player2Abilities",
        }
    }

    pub fn ability_image(side: Side) -> &'static str {
        match side {
            Side::Right => "player1AbilityImage",
            Side::Left => "player2AbilityImage",
        }
    }

    pub fn country(side: Side) -> &'static str {
        match side {
            Side::Right => "player1Country",
            Side::Left => "player2Country",
        }
    }
}

// ---------------------------------------------------------------------------
// DurableStore
// ---------------------------------------------------------------------------

/// Synchronous string key/value storage local to the host.
///
/// There is no atomicity across keys.
pub trait DurableStore: Send + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

pub(crate) fn stored_match_id<S: DurableStore>(store: &S) -> Option<MatchId> {
    store
        .get(keys::GAME_ID)
        .filter(|v| !v.trim().is_empty())
        .map(MatchId::new)
}

/// A store that lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for seeding a match.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// A store backed by one JSON object file.
///
/// The whole file is rewritten on every change, through a temporary file
/// and a rename so a crash never leaves it half written.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "store file is malformed, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "store file unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(&self.values)?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).map_err(io_err)?;
            file.write_all(&data).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MatchStore
// ---------------------------------------------------------------------------

/// Typed access to the match keys of a [`DurableStore`].
#[derive(Debug)]
pub struct MatchStore<S> {
    inner: S,
}

impl<S: DurableStore> MatchStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The match identifier the setup screen stored, if any.
    pub fn load_match_id(&self) -> Option<MatchId> {
        stored_match_id(&self.inner)
    }

    pub fn load_config(&self) -> MatchConfig {
        MatchConfig::load(&self.inner)
    }

    /// Rebuilds the match from whatever the store holds.
    pub fn load_state(&self) -> Result<MatchState, MatchError> {
        let config = self.load_config();
        let seating = Seating::new(config.player1.clone(), config.player2.clone())?;
        let mut state = MatchState::new(seating.clone(), config.round_count)?
            .with_scores(&self.load_scores(&seating))
            .with_round(self.load_round());

        let mut picks = self.load_picks();
        for side in [Side::Right, Side::Left] {
            let name = seating.player_at(side);
            state = state
                .with_picks(name, picks.remove(name).unwrap_or_default())
                .with_abilities(name, self.load_abilities(side))
                .with_ability_image(name, self.text(keys::ability_image(side)))
                .with_country(name, self.load_country(side))
                .with_note(name, self.inner.get(&keys::notes(name)).unwrap_or_default());
        }

        tracing::info!(
            player1 = seating.player1(),
            player2 = seating.player2(),
            round = state.round(),
            round_count = state.round_count(),
            "match loaded from store"
        );
        Ok(state)
    }

    // -- write-through -----------------------------------------------------

    pub fn persist_scores(&mut self, state: &MatchState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state.scores())?;
        self.inner.set(keys::SCORES, json)
    }

    pub fn persist_round(&mut self, state: &MatchState) -> Result<(), StoreError> {
        self.inner.set(keys::CURRENT_ROUND, state.round().to_string())
    }

    pub fn persist_abilities(&mut self, state: &MatchState, identity: &str) -> Result<(), StoreError> {
        let Some(side) = state.seating().seat_of(identity) else {
            return Ok(());
        };
        let json = serde_json::to_string(state.ledger().entries(identity))?;
        self.inner.set(keys::abilities(side), json)
    }

    pub fn persist_note(&mut self, state: &MatchState, identity: &str) -> Result<(), StoreError> {
        let note = state.notes().get(identity).cloned().unwrap_or_default();
        self.inner.set(&keys::notes(identity), note)
    }

    /// Drops both players' notes keys.
    pub fn clear_notes(&mut self, seating: &Seating) -> Result<(), StoreError> {
        for name in seating.identities() {
            self.inner.remove(&keys::notes(name))?;
        }
        Ok(())
    }

    // -- decoding ----------------------------------------------------------

    /// A non-empty stored string.
    fn text(&self, key: &str) -> Option<String> {
        self.inner.get(key).filter(|v| !v.is_empty())
    }

    fn json(&self, key: &str) -> Option<Value> {
        let raw = self.text(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value is not valid JSON, using default");
                None
            }
        }
    }

    fn load_round(&self) -> i64 {
        let Some(raw) = self.text(keys::CURRENT_ROUND) else {
            return 0;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = keys::CURRENT_ROUND, value = %raw, "stored round is not a number, using 0");
            0
        })
    }

    fn load_scores(&self, seating: &Seating) -> BTreeMap<String, i64> {
        let stored = match self.json(keys::SCORES) {
            Some(Value::Object(map)) => map,
            _ => Default::default(),
        };
        seating
            .identities()
            .iter()
            .map(|name| {
                let score = stored.get(*name).and_then(number).unwrap_or_else(|| {
                    if stored.contains_key(*name) {
                        tracing::warn!(player = name, "stored score is not a number, using 0");
                    }
                    0
                });
                (name.to_string(), score)
            })
            .collect()
    }

    fn load_picks(&self) -> BTreeMap<String, Vec<Option<String>>> {
        let Some(Value::Object(map)) = self.json(keys::PICKS) else {
            return BTreeMap::new();
        };
        map.into_iter()
            .map(|(name, slots)| {
                let slots = match slots {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(url) if !url.is_empty() => Some(url),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                (name, slots)
            })
            .collect()
    }

    fn load_abilities(&self, side: Side) -> Vec<AbilityEntry> {
        self.json(keys::abilities(side))
            .map(|value| normalize_abilities(&value))
            .unwrap_or_default()
    }

    fn load_country(&self, side: Side) -> Option<Country> {
        let value = self.json(keys::country(side))?;
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value)
            .map_err(|e| {
                tracing::warn!(key = keys::country(side), error = %e, "stored country is malformed, ignoring");
            })
            .ok()
    }
}

impl MatchConfig {
    /// Reads names and round count, falling back to defaults for anything
    /// missing or malformed.
    pub fn load<S: DurableStore + ?Sized>(store: &S) -> Self {
        let defaults = Self::default();
        let text = |key: &str| store.get(key).filter(|v| !v.trim().is_empty());

        let round_count = match text(keys::ROUND_COUNT).or_else(|| text(keys::LEGACY_ROUND_COUNT)) {
            None => defaults.round_count,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
                _ => {
                    tracing::warn!(value = %raw, "stored round count is invalid, using default");
                    defaults.round_count
                }
            },
        };

        let player1 = text(keys::PLAYER1).unwrap_or(defaults.player1);
        let mut player2 = text(keys::PLAYER2).unwrap_or(defaults.player2);
        if player1 == player2 {
            tracing::warn!(name = %player1, "both players share a name, renaming the second");
            player2 = format!("{player2} (2)");
        }

        Self {
            player1,
            player2,
            round_count,
        }
    }
}

fn number(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

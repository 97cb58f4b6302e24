//! Per-player ability ledgers.
//!
//! Each player owns an ordered list of [`AbilityEntry`] values. Entries can
//! be added, flagged as used, or moved to the other player. Duplicate texts
//! are allowed and never collapsed.

use std::collections::BTreeMap;

use faceoff_protocol::AbilityEntry;
use serde_json::Value;

use crate::MatchError;

/// Ordered ability lists keyed by player identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AbilityLedger {
    lists: BTreeMap<String, Vec<AbilityEntry>>,
}

impl AbilityLedger {
    /// Creates an empty list for every identity.
    pub fn new<'a>(identities: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            lists: identities
                .into_iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
        }
    }

    /// The entries of one player, in order. Unknown players have none.
    pub fn entries(&self, identity: &str) -> &[AbilityEntry] {
        self.lists.get(identity).map_or(&[], Vec::as_slice)
    }

    /// Every list, keyed by identity.
    pub fn lists(&self) -> &BTreeMap<String, Vec<AbilityEntry>> {
        &self.lists
    }

    /// Total entries across all players.
    pub fn total(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    /// Appends `{text: trimmed, used: false}` to the player's list.
    ///
    /// Rejects empty or whitespace-only text. An existing entry with the
    /// same text is not a reason to reject.
    pub fn add(&mut self, identity: &str, text: &str) -> Result<&AbilityEntry, MatchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MatchError::EmptyAbility);
        }
        let list = self.list_mut(identity)?;
        list.push(AbilityEntry::new(text));
        Ok(&list[list.len() - 1])
    }

    /// Moves the entry at `index` from `source` to the end of `target`,
    /// keeping its `used` flag.
    ///
    /// Both identities and the index are checked before anything is
    /// touched, so a failed transfer leaves both lists unchanged.
    pub fn transfer(
        &mut self,
        source: &str,
        index: usize,
        target: &str,
    ) -> Result<AbilityEntry, MatchError> {
        self.check_index(source, index)?;
        if !self.lists.contains_key(target) {
            return Err(MatchError::UnknownPlayer(target.to_string()));
        }

        let moved = self.list_mut(source)?.remove(index);
        self.list_mut(target)?.push(moved.clone());
        Ok(moved)
    }

    /// Flips the `used` flag of one entry and returns the new value.
    pub fn toggle_used(&mut self, identity: &str, index: usize) -> Result<bool, MatchError> {
        self.check_index(identity, index)?;
        let entry = &mut self.list_mut(identity)?[index];
        entry.used = !entry.used;
        Ok(entry.used)
    }

    /// Replaces a player's list wholesale (used when restoring).
    pub(crate) fn replace(&mut self, identity: &str, entries: Vec<AbilityEntry>) {
        if let Some(list) = self.lists.get_mut(identity) {
            *list = entries;
        }
    }

    fn check_index(&self, identity: &str, index: usize) -> Result<(), MatchError> {
        let list = self
            .lists
            .get(identity)
            .ok_or_else(|| MatchError::UnknownPlayer(identity.to_string()))?;
        if index >= list.len() {
            return Err(MatchError::AbilityIndexOutOfRange {
                player: identity.to_string(),
                index,
                len: list.len(),
            });
        }
        Ok(())
    }

    fn list_mut(&mut self, identity: &str) -> Result<&mut Vec<AbilityEntry>, MatchError> {
        self.lists
            .get_mut(identity)
            .ok_or_else(|| MatchError::UnknownPlayer(identity.to_string()))
    }
}

/// Coerces an externally loaded ability list into canonical entries.
///
/// - a bare string becomes `{text, used: false}`
/// - an object keeps its `used` flag (any truthy value counts)
/// - anything else, and any entry whose trimmed text is empty, is dropped
///
/// A value that is not an array yields an empty list.
pub fn normalize_abilities(value: &Value) -> Vec<AbilityEntry> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(AbilityEntry::new(text.trim())),
            Value::Object(fields) => Some(AbilityEntry {
                text: loose_text(fields.get("text")).trim().to_string(),
                used: truthy(fields.get("used")),
            }),
            _ => None,
        })
        .filter(|entry| !entry.text.is_empty())
        .collect()
}

fn loose_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ledger() -> AbilityLedger {
        AbilityLedger::new(["A", "B"])
    }

    #[test]
    fn test_add_trims_and_appends() {
        let mut l = ledger();
        let entry = l.add("A", "  Fireball ").unwrap().clone();
        assert_eq!(entry, AbilityEntry::new("Fireball"));
        assert_eq!(l.entries("A").len(), 1);
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let mut l = ledger();
        assert_eq!(l.add("A", "").unwrap_err(), MatchError::EmptyAbility);
        assert_eq!(l.add("A", "   ").unwrap_err(), MatchError::EmptyAbility);
        assert_eq!(l.total(), 0);
    }

    #[test]
    fn test_add_keeps_duplicates() {
        let mut l = ledger();
        l.add("A", "Fireball").unwrap();
        l.add("A", "Fireball").unwrap();
        assert_eq!(l.entries("A").len(), 2);
    }

    #[test]
    fn test_add_unknown_player() {
        let mut l = ledger();
        assert_eq!(
            l.add("Z", "Fireball").unwrap_err(),
            MatchError::UnknownPlayer("Z".into())
        );
    }

    #[test]
    fn test_transfer_moves_entry_with_used_flag() {
        let mut l = ledger();
        l.add("A", "Shield").unwrap();
        l.add("A", "Swap").unwrap();
        l.toggle_used("A", 1).unwrap();
        l.add("B", "Heal").unwrap();

        let moved = l.transfer("A", 1, "B").unwrap();

        assert_eq!(moved, AbilityEntry { text: "Swap".into(), used: true });
        assert_eq!(l.entries("A"), &[AbilityEntry::new("Shield")]);
        assert_eq!(l.entries("B").last(), Some(&moved));
        assert_eq!(l.total(), 3);
    }

    #[test]
    fn test_transfer_out_of_range_changes_nothing() {
        let mut l = ledger();
        l.add("A", "Shield").unwrap();
        let before = l.clone();

        let err = l.transfer("A", 5, "B").unwrap_err();

        assert!(matches!(err, MatchError::AbilityIndexOutOfRange { index: 5, len: 1, .. }));
        assert_eq!(l, before);
    }

    #[test]
    fn test_transfer_to_unknown_target_changes_nothing() {
        let mut l = ledger();
        l.add("A", "Shield").unwrap();
        let before = l.clone();

        assert!(l.transfer("A", 0, "Nobody").is_err());
        assert_eq!(l, before);
    }

    #[test]
    fn test_toggle_used_flips() {
        let mut l = ledger();
        l.add("B", "Heal").unwrap();
        assert!(l.toggle_used("B", 0).unwrap());
        assert!(!l.toggle_used("B", 0).unwrap());
        assert!(l.toggle_used("B", 1).is_err());
    }

    #[test]
    fn test_normalize_mixed_shapes() {
        let raw = json!([
            "  Fireball ",
            {"text": "Shield", "used": true},
            {"text": "Swap"},
            {"text": "   "},
            "",
            null,
            42,
            {"text": 7, "used": 1}
        ]);
        let list = normalize_abilities(&raw);
        assert_eq!(
            list,
            vec![
                AbilityEntry::new("Fireball"),
                AbilityEntry { text: "Shield".into(), used: true },
                AbilityEntry::new("Swap"),
                AbilityEntry { text: "7".into(), used: true },
            ]
        );
    }

    #[test]
    fn test_normalize_non_array_is_empty() {
        assert!(normalize_abilities(&json!({"text": "x"})).is_empty());
        assert!(normalize_abilities(&json!("Fireball")).is_empty());
        assert!(normalize_abilities(&Value::Null).is_empty());
    }
}

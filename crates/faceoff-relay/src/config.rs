//! Relay configuration.

use std::path::PathBuf;

/// Environment variable holding the bind address.
pub const BIND_VAR: &str = "FACEOFF_BIND";
/// Environment variable holding the catalog log path.
pub const CATALOG_VAR: &str = "FACEOFF_CATALOG";

/// Settings for a [`RelayServer`](crate::RelayServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: String,
    /// Where `catalogAppend` entries go. `None` disables the catalog.
    pub catalog_path: Option<PathBuf>,
    /// Command queue size of each room actor.
    pub room_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            catalog_path: None,
            room_buffer: 64,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by `FACEOFF_BIND` and `FACEOFF_CATALOG`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(bind) = var(BIND_VAR).filter(|v| !v.trim().is_empty()) {
            config.bind_addr = bind;
        }
        config.catalog_path = var(CATALOG_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_vars_override_defaults() {
        let config = RelayConfig::from_vars(|key| match key {
            BIND_VAR => Some("0.0.0.0:9000".into()),
            CATALOG_VAR => Some("/var/lib/faceoff/catalog.jsonl".into()),
            _ => None,
        });
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/var/lib/faceoff/catalog.jsonl"))
        );
    }

    #[test]
    fn test_blank_vars_are_ignored() {
        let config = RelayConfig::from_vars(|_| Some(" ".into()));
        assert_eq!(config, RelayConfig::default());
    }
}

//! External ability catalog seam.

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::CatalogError;

/// A durable, server-side collection of ability texts.
///
/// Writes are one-shot and best effort. The host spawns each `append` on
/// its own task and only reports the outcome; the local ledger has already
/// changed by then and is never rolled back.
pub trait AbilityCatalog: Send + Sync + 'static {
    fn append(&self, text: String) -> impl Future<Output = Result<(), CatalogError>> + Send;
}

/// A catalog that accepts and discards every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCatalog;

impl AbilityCatalog for DisabledCatalog {
    async fn append(&self, _text: String) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// A catalog kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    texts: Arc<Mutex<Vec<String>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every text appended so far.
    pub fn texts(&self) -> Vec<String> {
        self.texts
            .lock()
            .map(|texts| texts.clone())
            .unwrap_or_default()
    }
}

impl AbilityCatalog for MemoryCatalog {
    async fn append(&self, text: String) -> Result<(), CatalogError> {
        let mut texts = self
            .texts
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog lock poisoned".into()))?;
        texts.push(text);
        Ok(())
    }
}

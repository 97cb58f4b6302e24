//! Append-only ability catalog log.
//!
//! One JSON object per line:
//!
//! ```text
//! {"matchId":"g-7","text":"Fireball","at":1760000000000}
//! ```

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use faceoff_protocol::{MatchId, ProtocolError};
use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::RelayError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogLine<'a> {
    match_id: Option<&'a MatchId>,
    text: &'a str,
    at: u64,
}

/// Durable, append-only log of ability texts.
pub struct CatalogLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl CatalogLog {
    /// Opens `path` for appending, creating it if missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| RelayError::Catalog {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), "catalog log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. The text is stored exactly as received.
    pub async fn append(&self, match_id: Option<&MatchId>, text: &str) -> Result<(), RelayError> {
        if text.trim().is_empty() {
            return Err(RelayError::EmptyCatalogText);
        }

        let at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let mut line = serde_json::to_vec(&CatalogLine { match_id, text, at })
            .map_err(ProtocolError::Encode)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        let written = async {
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        written.map_err(|source| RelayError::Catalog {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(match_id = ?match_id.map(MatchId::as_str), "catalog entry appended");
        Ok(())
    }
}

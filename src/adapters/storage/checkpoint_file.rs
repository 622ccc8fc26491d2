//! Checkpoint File
//!
//! `{"lastProcessedIndex": N}` stored next to the coin document.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Checkpoint;
use crate::ports::{CheckpointStore, PersistError};
use super::{read_optional, write_atomic};

#[derive(Debug, Clone)]
pub struct JsonCheckpointFile {
    path: PathBuf,
}

impl JsonCheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonCheckpointFile {
    fn load(&self) -> Result<Option<Checkpoint>, PersistError> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(None);
        };

        let checkpoint: Checkpoint =
            serde_json::from_str(&content).map_err(|e| PersistError::Deserialize {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            "Checkpoint loaded: last processed index {}",
            checkpoint.last_processed_index
        );
        Ok(Some(checkpoint))
    }

    fn save(&mut self, checkpoint: Checkpoint) -> Result<(), PersistError> {
        let content = serde_json::to_string(&checkpoint)
            .map_err(|e| PersistError::Serialize(format!("checkpoint: {}", e)))?;
        write_atomic(&self.path, content.as_bytes())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| PersistError::io(&self.path, e))?;
            tracing::info!("Checkpoint deleted: {}", self.path.display());
        }
        Ok(())
    }
}

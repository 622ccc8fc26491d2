//! JSON Document Store
//!
//! Holds the coin document in memory; `flush` rewrites the whole file
//! atomically. Batching flushes (see `HarvestSettings::flush_every`) trades
//! crash redo work for fewer full rewrites.

use std::path::{Path, PathBuf};

use crate::domain::{AggregatedCoin, CoinDocument};
use crate::ports::{CoinStore, PersistError};
use super::{read_optional, write_atomic};

/// Default output document file name
pub const DEFAULT_DATA_FILE: &str = "customCoinData.json";

#[derive(Debug)]
pub struct JsonDocumentStore {
    path: PathBuf,
    document: CoinDocument,
    dirty: bool,
}

impl JsonDocumentStore {
    /// Start an empty document; the file is overwritten on first flush
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: CoinDocument::new(),
            dirty: true,
        }
    }

    /// Continue an existing document, or start empty if the file is absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let document = Self::read(&path)?.unwrap_or_default();

        tracing::info!(
            "Loaded {} existing coins from {}",
            document.len(),
            path.display()
        );

        Ok(Self {
            path,
            document,
            dirty: false,
        })
    }

    /// Read a document file without opening a store on it
    pub fn read(path: &Path) -> Result<Option<CoinDocument>, PersistError> {
        let Some(content) = read_optional(path)? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| PersistError::Deserialize {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &CoinDocument {
        &self.document
    }
}

impl CoinStore for JsonDocumentStore {
    fn append(&mut self, id: String, coin: AggregatedCoin) -> Result<(), PersistError> {
        self.document.push(id, coin);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PersistError> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }

        let content = serde_json::to_string_pretty(&self.document)
            .map_err(|e| PersistError::Serialize(format!("coin document: {}", e)))?;
        write_atomic(&self.path, content.as_bytes())?;
        self.dirty = false;

        tracing::debug!(
            "Coin document saved: {} coins -> {}",
            self.document.len(),
            self.path.display()
        );
        Ok(())
    }

    fn len(&self) -> usize {
        self.document.len()
    }
}

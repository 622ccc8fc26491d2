//! Persistence Ports
//!
//! `CoinStore` owns the accumulating document: `append` buffers an entry and
//! `flush` makes everything appended so far durable. `CheckpointStore` holds
//! the resume marker. Callers must only save a checkpoint for entries that a
//! completed `flush` already covers.

use thiserror::Error;

use crate::domain::{AggregatedCoin, Checkpoint};

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {0}")]
    Serialize(String),

    #[error("Failed to deserialize {path}: {reason}")]
    Deserialize { path: String, reason: String },
}

impl PersistError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Sink for merged coins
pub trait CoinStore {
    /// Buffer one entry in processing order
    fn append(&mut self, id: String, coin: AggregatedCoin) -> Result<(), PersistError>;

    /// Durably write every entry appended so far
    fn flush(&mut self) -> Result<(), PersistError>;

    /// Number of entries held (flushed or not)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for the resume checkpoint
pub trait CheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>, PersistError>;

    fn save(&mut self, checkpoint: Checkpoint) -> Result<(), PersistError>;

    /// Remove any stored checkpoint; a missing checkpoint is not an error
    fn clear(&mut self) -> Result<(), PersistError>;
}

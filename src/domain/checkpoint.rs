//! Progress Checkpoint
//!
//! Durable marker of the last fully processed listing index.

use serde::{Deserialize, Serialize};

/// Default checkpoint file name
pub const DEFAULT_PROGRESS_FILE: &str = "progress.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "lastProcessedIndex")]
    pub last_processed_index: usize,
}

impl Checkpoint {
    pub fn new(last_processed_index: usize) -> Self {
        Self { last_processed_index }
    }

    /// First listing index that still needs processing
    pub fn resume_index(checkpoint: Option<Checkpoint>) -> usize {
        checkpoint.map_or(0, |c| c.last_processed_index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_index_without_checkpoint() {
        assert_eq!(Checkpoint::resume_index(None), 0);
    }

    #[test]
    fn test_resume_index_after_checkpoint() {
        assert_eq!(Checkpoint::resume_index(Some(Checkpoint::new(0))), 1);
        assert_eq!(Checkpoint::resume_index(Some(Checkpoint::new(36))), 37);
    }

    #[test]
    fn test_json_field_name() {
        let json = serde_json::to_string(&Checkpoint::new(37)).unwrap();
        assert_eq!(json, r#"{"lastProcessedIndex":37}"#);

        let parsed: Checkpoint = serde_json::from_str(r#"{"lastProcessedIndex": 4}"#).unwrap();
        assert_eq!(parsed, Checkpoint::new(4));
    }
}

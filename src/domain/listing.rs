//! Listing Records
//!
//! One entry of the paginated market listing. Only the fields the
//! aggregation needs are kept; everything else the endpoint returns is ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Summary record for one asset from the market listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Upstream asset identifier (e.g. "bitcoin"), used for the detail lookup
    pub id: String,
    /// Display name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Ticker symbol
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symbol: String,
}

/// Missing and `null` both read as an empty string
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ListingRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

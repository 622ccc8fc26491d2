//! Coin Document
//!
//! Ordered mapping from generated id to coin. Serializes as a plain JSON object
//! whose key order is insertion (processing) order, and reads back in file order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::coin::AggregatedCoin;

/// All coins processed so far, in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoinDocument {
    entries: Vec<(String, AggregatedCoin)>,
}

impl CoinDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Ids are assumed unique; duplicates are not detected.
    pub fn push(&mut self, id: String, coin: AggregatedCoin) {
        self.entries.push((id, coin));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AggregatedCoin> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, coin)| coin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregatedCoin)> {
        self.entries.iter().map(|(id, coin)| (id.as_str(), coin))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

impl Serialize for CoinDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, coin) in &self.entries {
            map.serialize_entry(id, coin)?;
        }
        map.end()
    }
}

struct CoinDocumentVisitor;

impl<'de> Visitor<'de> for CoinDocumentVisitor {
    type Value = CoinDocument;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of coin id to coin")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut document = CoinDocument::new();
        while let Some((id, coin)) = access.next_entry::<String, AggregatedCoin>()? {
            document.push(id, coin);
        }
        Ok(document)
    }
}

impl<'de> Deserialize<'de> for CoinDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CoinDocumentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detail::DetailRecord;
    use crate::domain::listing::ListingRecord;
    use chrono::Utc;

    fn coin(name: &str) -> AggregatedCoin {
        let listing = ListingRecord::new(name.to_lowercase(), name, name.to_lowercase());
        AggregatedCoin::merge(&listing, DetailRecord::default(), String::new(), Utc::now())
    }

    #[test]
    fn test_empty_document_serializes_to_empty_object() {
        let json = serde_json::to_string(&CoinDocument::new()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut document = CoinDocument::new();
        document.push("ffff".to_string(), coin("Zcash"));
        document.push("0000".to_string(), coin("Aave"));
        document.push("8888".to_string(), coin("Monero"));

        let json = serde_json::to_string(&document).unwrap();
        let zcash = json.find("ffff").unwrap();
        let aave = json.find("0000").unwrap();
        let monero = json.find("8888").unwrap();
        assert!(zcash < aave && aave < monero);

        let restored: CoinDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.ids().collect::<Vec<_>>(), vec!["ffff", "0000", "8888"]);
        assert_eq!(restored.get("0000").map(|c| c.name.as_str()), Some("Aave"));
    }

    #[test]
    fn test_rejects_non_object() {
        let result: Result<CoinDocument, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }
}

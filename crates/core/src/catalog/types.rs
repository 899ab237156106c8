//! Types for the candidate catalog.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::{ContentId, ProviderId};

/// A provider that claims to store a given root, as listed by the catalog.
///
/// Two candidates are equal when they name the same provider and root; the
/// deal reference is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    /// Storage provider address.
    #[serde(rename = "Miner")]
    pub provider: ProviderId,
    /// Root of the DAG this provider serves.
    #[serde(rename = "RootCid")]
    pub root_cid: ContentId,
    /// Storage deal the content was sealed under, if known.
    #[serde(
        rename = "DealID",
        default,
        deserialize_with = "deserialize_deal_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub deal_id: Option<u64>,
}

impl RetrievalCandidate {
    pub fn new(provider: ProviderId, root_cid: ContentId) -> Self {
        Self {
            provider,
            root_cid,
            deal_id: None,
        }
    }

    pub fn with_deal_id(mut self, deal_id: u64) -> Self {
        self.deal_id = Some(deal_id);
        self
    }
}

impl PartialEq for RetrievalCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider && self.root_cid == other.root_cid
    }
}

impl Eq for RetrievalCandidate {}

impl Hash for RetrievalCandidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.root_cid.hash(state);
    }
}

/// A zero deal id is the index's way of saying "unknown".
fn deserialize_deal_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u64>::deserialize(deserializer)?;
    Ok(value.filter(|id| *id != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deserialize_index_response() {
        let json = r#"[
            {"Miner": "f01234", "RootCid": {"/": "bafyroot"}, "DealID": 4411},
            {"Miner": "f05678", "RootCid": "bafyroot", "DealID": 0},
            {"Miner": "f09999", "RootCid": "bafyother"}
        ]"#;

        let candidates: Vec<RetrievalCandidate> = serde_json::from_str(json).unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].provider.as_str(), "f01234");
        assert_eq!(candidates[0].root_cid.as_str(), "bafyroot");
        assert_eq!(candidates[0].deal_id, Some(4411));
        assert_eq!(candidates[1].deal_id, None);
        assert_eq!(candidates[2].deal_id, None);
    }

    #[test]
    fn test_equality_ignores_deal_id() {
        let provider = ProviderId::parse("f01234").unwrap();
        let root = ContentId::parse("bafyroot").unwrap();
        let a = RetrievalCandidate::new(provider.clone(), root.clone()).with_deal_id(1);
        let b = RetrievalCandidate::new(provider, root).with_deal_id(2);

        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_miner_is_rejected() {
        let json = r#"{"Miner": "", "RootCid": "bafyroot", "DealID": 3}"#;
        let result: Result<RetrievalCandidate, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_root_fails() {
        let json = r#"{"Miner": "f01234"}"#;
        let result: Result<RetrievalCandidate, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}

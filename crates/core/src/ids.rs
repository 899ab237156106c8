//! Identifiers shared by the catalog, market and peer-to-peer paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Multibase prefix of a base32 CIDv1 whose codec is `raw`.
const RAW_CID_PREFIX: &str = "bafk";

/// Selector that walks every node reachable from the root.
pub const EXPLORE_ALL_SELECTOR: &str = r#"{"R":{"l":{"none":{}},":>":{"a":{">":{"@":{}}}}}}"#;

/// Errors produced when parsing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("Content identifier is empty")]
    EmptyContentId,

    #[error("Content identifier contains whitespace: {0:?}")]
    InvalidContentId(String),

    #[error("Provider identifier is empty")]
    EmptyProviderId,
}

/// A content identifier (CID) in its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Parse and validate a CID string.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyContentId);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(IdError::InvalidContentId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier uses the raw codec.
    ///
    /// Raw blocks carry bytes only, so a traversal never expands them.
    /// Only base32 CIDv1 strings are recognised (either case); identifiers in
    /// other multibases are treated as non-raw.
    pub fn is_raw_leaf(&self) -> bool {
        self.0
            .get(..RAW_CID_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RAW_CID_PREFIX))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Wire forms accepted for a CID: a bare string or an IPLD link object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentIdRepr {
    Plain(String),
    Link {
        #[serde(rename = "/")]
        link: String,
    },
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match ContentIdRepr::deserialize(deserializer)? {
            ContentIdRepr::Plain(value) => value,
            ContentIdRepr::Link { link } => link,
        };
        ContentId::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Address of a storage-market provider (e.g. `f01234`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn parse(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdError::EmptyProviderId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ProviderId::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a node on the peer-to-peer network.
///
/// Discovery streams may contain placeholder records with an empty id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A traversal selector in DAG-JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Selector covering the whole DAG below the root.
    pub fn explore_all() -> Self {
        Self(EXPLORE_ALL_SELECTOR.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the selector only when one is actually required.
pub fn effective_selector(selector: Option<&Selector>) -> Option<&Selector> {
    selector.filter(|s| !s.is_empty())
}

//! Structural fingerprints for compiled-validator caching

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::SchemaDefinition;

/// SHA256 of a definition's canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute from a schema definition; callbacks contribute their ids
    pub fn of(definition: &SchemaDefinition) -> Self {
        Self::from_bytes(definition.canonical_json().as_bytes())
    }

    /// Hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    /// Whether `definition` still produces this fingerprint
    pub fn matches(&self, definition: &SchemaDefinition) -> bool {
        *self == Self::of(definition)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! # Content Digest
//!
//! `ContentDigest` names a serialized graph by the SHA-256 of its
//! [`CanonicalTriples`]. Digests can only be computed from canonical text,
//! so two instances that serialize to the same triples share a digest.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalTriples;

/// A SHA-256 digest of canonical N-Triples text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical triples.
pub fn sha256_digest(triples: &CanonicalTriples) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(triples.as_bytes());
    ContentDigest {
        bytes: hasher.finalize().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_digest() {
        let digest = sha256_digest(&CanonicalTriples::new(Vec::new()));
        assert_eq!(
            digest.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(digest.to_string().starts_with("sha256:e3b0"));
    }
}

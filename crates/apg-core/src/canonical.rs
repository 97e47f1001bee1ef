//! # Canonical Triple Ordering
//!
//! This module defines `CanonicalTriples`, the sole representation of a
//! serialized graph used for byte-level comparison and digests.
//!
//! ## Invariant
//!
//! The inner string is private. The only constructors render every triple
//! as one N-Triples line (`<s> <p> <o> .`), sort the lines bytewise, drop
//! duplicates, and terminate each line with `\n`. Two graphs with the same
//! triples and the same blank node labels therefore produce identical
//! bytes regardless of emission order.
//!
//! Blank node *relabeling* (URDNA2015-style canonicalization) is out of
//! scope: the decoder keeps blank node identities, so re-serializing a
//! decoded instance reuses the labels of the input.

use std::collections::BTreeSet;
use std::fmt;

use oxrdf::{Graph, Triple, TripleRef};

/// N-Triples text in canonical line order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalTriples(String);

impl CanonicalTriples {
    /// Canonicalize owned triples.
    pub fn new(triples: impl IntoIterator<Item = Triple>) -> Self {
        Self::from_lines(triples.into_iter().map(|t| format!("{t} .")))
    }

    /// Canonicalize every triple of a graph.
    pub fn from_graph(graph: &Graph) -> Self {
        Self::from_refs(graph.iter())
    }

    /// Canonicalize borrowed triples.
    pub fn from_refs<'a>(triples: impl IntoIterator<Item = TripleRef<'a>>) -> Self {
        Self::from_lines(triples.into_iter().map(|t| format!("{t} .")))
    }

    fn from_lines(lines: impl Iterator<Item = String>) -> Self {
        let sorted: BTreeSet<String> = lines.collect();
        let mut out = String::with_capacity(sorted.iter().map(|l| l.len() + 1).sum());
        for line in sorted {
            out.push_str(&line);
            out.push('\n');
        }
        Self(out)
    }

    /// The canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical text as bytes, for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.0.lines().count()
    }

    /// Returns true if there are no triples.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the canonical text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalTriples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for CanonicalTriples {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

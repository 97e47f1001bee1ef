//! # Digest Subcommand
//!
//! Canonicalize an N-Triples file: sorted, de-duplicated lines, hashed with
//! SHA-256.

use std::path::PathBuf;

use anyhow::Result;
use apg_core::{sha256_digest, CanonicalTriples};
use clap::Args;

use crate::input::{describe, read};

/// Arguments for the digest subcommand.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// N-Triples file.
    pub input: PathBuf,

    /// Print the canonical text instead of its digest.
    #[arg(long)]
    pub canonical: bool,
}

/// Run the subcommand.
pub fn run(args: &DigestArgs) -> Result<String> {
    let canonical = canonicalize(&read(&args.input)?)?;
    if args.canonical {
        Ok(canonical.into_string())
    } else {
        Ok(format!("{}\n", sha256_digest(&canonical)))
    }
}

/// Canonical form of N-Triples text.
pub fn canonicalize(text: &str) -> Result<CanonicalTriples> {
    let graph = apg_format::read_ntriples(text).map_err(describe)?;
    Ok(CanonicalTriples::from_graph(&graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_duplicates_do_not_matter() {
        let a = canonicalize(
            "_:b <http://example.com/p> \"2\" .\n\
             _:a <http://example.com/p> \"1\" .\n\
             _:a <http://example.com/p> \"1\" .\n",
        )
        .unwrap();
        let b = canonicalize(
            "_:a <http://example.com/p> \"1\" .\n\
             _:b <http://example.com/p> \"2\" .\n",
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn test_syntax_error() {
        assert!(canonicalize("not n-triples").is_err());
    }
}

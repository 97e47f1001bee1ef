//! # apg-cli — Command-Line Interface
//!
//! ## Subcommands
//!
//! - `parse` — decode an N-Triples graph against a schema
//! - `parse-schema` — decode a schema graph into JSON
//! - `serialize-schema` — write a schema as a canonical schema graph
//! - `compile` — print the compiled shapes as ShExJ-style JSON
//! - `digest` — canonical N-Triples and their SHA-256 digest
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers; every handler returns
//!   its output as a string and `main` prints it.
//! - Handlers delegate to `apg-format`; no codec logic here.

pub mod compile;
pub mod digest;
pub mod input;
pub mod parse;
pub mod schema;

//! # Schema Subcommands
//!
//! Convert between JSON schemas and schema graphs.

use std::path::PathBuf;

use anyhow::Result;
use apg_core::Schema;
use apg_format::ParseOptions;
use clap::Args;
use tracing::info;

use crate::input::{describe, read, OptionsInput, SchemaInput};

/// Arguments for the parse-schema subcommand.
#[derive(Args, Debug)]
pub struct ParseSchemaArgs {
    /// Schema graph in N-Triples.
    pub input: PathBuf,

    #[command(flatten)]
    pub options: OptionsInput,
}

/// Arguments for the serialize-schema subcommand.
#[derive(Args, Debug)]
pub struct SerializeSchemaArgs {
    #[command(flatten)]
    pub schema: SchemaInput,
}

/// Decode a schema graph and print it as JSON.
pub fn run_parse(args: &ParseSchemaArgs) -> Result<String> {
    let options = args.options.load()?;
    let schema = read_schema_graph(&read(&args.input)?, &options)?;
    Ok(serde_json::to_string_pretty(&schema)? + "\n")
}

/// Print a schema as canonical N-Triples.
pub fn run_serialize(args: &SerializeSchemaArgs) -> Result<String> {
    let schema = args.schema.load()?;
    let triples = apg_format::serialize_schema_string(&schema)?;
    info!(labels = schema.len(), bytes = triples.len(), "wrote schema graph");
    Ok(triples.into_string())
}

/// Decode N-Triples text holding a schema graph.
pub fn read_schema_graph(text: &str, options: &ParseOptions) -> Result<Schema> {
    let graph = apg_format::read_ntriples(text).map_err(describe)?;
    let schema = apg_format::parse_schema_with_options(&graph, options).map_err(describe)?;
    info!(labels = schema.len(), "decoded schema graph");
    Ok(schema)
}

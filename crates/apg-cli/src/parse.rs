//! # Parse Subcommand
//!
//! Decode an N-Triples graph against a schema and print the instance.

use std::path::PathBuf;

use anyhow::Result;
use apg_core::Schema;
use apg_format::ParseOptions;
use clap::{Args, ValueEnum};
use tracing::info;

use crate::input::{describe, read, OptionsInput, SchemaInput};

/// How a decoded instance is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON keyed by label.
    #[default]
    Json,
    /// Re-serialized canonical N-Triples.
    Ntriples,
}

/// Arguments for the parse subcommand.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// N-Triples file to decode.
    pub input: PathBuf,

    #[command(flatten)]
    pub schema: SchemaInput,

    #[command(flatten)]
    pub options: OptionsInput,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

/// Run the subcommand.
pub fn run(args: &ParseArgs) -> Result<String> {
    let schema = args.schema.load()?;
    let options = args.options.load()?;
    let text = read(&args.input)?;
    render(&text, &schema, &options, args.output)
}

/// Decode `text` and render the instance.
pub fn render(
    text: &str,
    schema: &Schema,
    options: &ParseOptions,
    output: OutputFormat,
) -> Result<String> {
    let graph = apg_format::read_ntriples(text).map_err(describe)?;
    let instance = apg_format::parse_with_options(&graph, schema, options).map_err(describe)?;
    info!(
        triples = graph.len(),
        elements = instance.iter().map(|(_, e)| e.len()).sum::<usize>(),
        "decoded graph"
    );
    match output {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&instance.to_json(schema))? + "\n"),
        OutputFormat::Ntriples => Ok(apg_format::serialize_string(&instance, schema)?.into_string()),
    }
}

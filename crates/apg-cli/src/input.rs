//! # Input Loading
//!
//! Schema files, decode options and error reporting shared by the
//! subcommands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use apg_core::Schema;
use apg_format::{ParseError, ParseOptions};
use clap::{Args, ValueEnum};

/// How a schema file is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    /// A JSON array of labels.
    Json,
    /// A schema graph in N-Triples.
    Ntriples,
}

impl SchemaFormat {
    /// `.json` files are JSON; anything else is read as a schema graph.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Ntriples,
        }
    }
}

/// Schema file arguments.
#[derive(Args, Debug)]
pub struct SchemaInput {
    /// Schema file: JSON, or a schema graph in N-Triples.
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Schema encoding; inferred from the file extension when omitted.
    #[arg(long, value_enum)]
    pub schema_format: Option<SchemaFormat>,
}

impl SchemaInput {
    /// Read and decode the schema file.
    pub fn load(&self) -> Result<Schema> {
        let text = read(&self.schema)?;
        let format = self
            .schema_format
            .unwrap_or_else(|| SchemaFormat::from_path(&self.schema));
        schema_from_str(&text, format)
            .with_context(|| format!("loading schema {}", self.schema.display()))
    }
}

/// Decode option arguments.
#[derive(Args, Debug)]
pub struct OptionsInput {
    /// JSON file with decode options, e.g. `{"max_depth": 256}`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reference depth limit; overrides the config file.
    #[arg(long)]
    pub max_depth: Option<usize>,
}

impl OptionsInput {
    /// Merge the config file and flag overrides.
    pub fn load(&self) -> Result<ParseOptions> {
        let config = self.config.as_deref().map(read).transpose()?;
        options_from(config.as_deref(), self.max_depth)
    }
}

/// Decode a schema from text.
pub fn schema_from_str(text: &str, format: SchemaFormat) -> Result<Schema> {
    match format {
        SchemaFormat::Json => serde_json::from_str(text).context("invalid JSON schema"),
        SchemaFormat::Ntriples => apg_format::parse_schema_string(text).map_err(describe),
    }
}

/// Options from an optional JSON config, with `max_depth` overriding it.
pub fn options_from(config: Option<&str>, max_depth: Option<usize>) -> Result<ParseOptions> {
    let mut options = match config {
        Some(text) => serde_json::from_str(text).context("invalid decode options")?,
        None => ParseOptions::default(),
    };
    if let Some(max_depth) = max_depth {
        options.max_depth = max_depth;
    }
    if options.max_depth == 0 {
        bail!("max_depth must be at least 1");
    }
    Ok(options)
}

/// Read a file to a string.
pub fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Validation failures are rendered as an indented report; everything
/// else keeps its message.
pub fn describe(error: ParseError) -> anyhow::Error {
    match error.as_validation() {
        Some(failure) => anyhow!("graph does not conform to the schema:\n{}", failure.report()),
        None => error.into(),
    }
}

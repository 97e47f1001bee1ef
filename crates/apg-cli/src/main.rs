//! # apg CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// apg: algebraic schemas over RDF triples.
///
/// Decodes N-Triples graphs into typed instances, converts schemas to and
/// from schema graphs, and prints compiled shapes and canonical digests.
#[derive(Parser, Debug)]
#[command(name = "apg", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Decode an N-Triples graph against a schema.
    Parse(apg_cli::parse::ParseArgs),
    /// Decode a schema graph and print the schema as JSON.
    ParseSchema(apg_cli::schema::ParseSchemaArgs),
    /// Write a schema as a canonical schema graph.
    SerializeSchema(apg_cli::schema::SerializeSchemaArgs),
    /// Print the shapes a schema compiles to.
    Compile(apg_cli::compile::CompileArgs),
    /// Print the canonical form or SHA-256 digest of an N-Triples file.
    Digest(apg_cli::digest::DigestArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Parse(args) => apg_cli::parse::run(&args)?,
        Commands::ParseSchema(args) => apg_cli::schema::run_parse(&args)?,
        Commands::SerializeSchema(args) => apg_cli::schema::run_serialize(&args)?,
        Commands::Compile(args) => apg_cli::compile::run(&args)?,
        Commands::Digest(args) => apg_cli::digest::run(&args)?,
    };
    print!("{output}");

    Ok(())
}

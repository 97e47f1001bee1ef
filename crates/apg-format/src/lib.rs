//! # apg-format — Algebraic Schemas over RDF Triples
//!
//! Decodes RDF graphs into typed [`Instance`]s of an algebraic [`Schema`]
//! and encodes them back.
//!
//! ## Pipeline
//!
//! ```text
//! Schema ──compile──▶ ConstraintSchema ──Validator──▶ Witness ──decode──▶ Instance
//!                                                                          │
//! Graph ◀──────────────────────────── serialize ◀──────────────────────────┘
//! ```
//!
//! - [`registry`]: ids and canonical member keys for every content type.
//! - [`compile`]: one shape per content type, one root shape per label.
//! - [`shapes`]: shape constructors and matchers that recognize the
//!   engine's witnesses for them.
//! - [`decode`]: walks witnesses into values, deduplicating nodes per
//!   label and resolving cycles with placeholders.
//! - [`parse_schema`]: schemas stored as graphs of the bootstrap
//!   [`schema_schema`].
//! - [`serialize`]: instances back to triples.
//!
//! ## Errors
//!
//! Non-conforming data is a reportable [`ParseError::Validation`]. A
//! schema that cannot be compiled is a [`CompileError`]. Disagreement
//! between engine and decoder is a [`Defect`]; see
//! [`ParseError::is_fatal`].
//!
//! ## Crate Policy
//!
//! - Validation is delegated through [`ShapeValidator`]; the decoder never
//!   inspects the graph directly except to enumerate label subjects.
//! - No partial results: the first error aborts a decode.

pub mod compile;
pub mod decode;
pub mod error;
pub mod options;
pub mod parse_schema;
pub mod registry;
pub mod schema_schema;
pub mod serialize;
pub mod shapes;

pub use compile::{compile, CompiledSchema};
pub use decode::{decode, DecodeSession};
pub use error::{CompileError, Defect, ParseError, SchemaWriteError, SerializeError};
pub use options::ParseOptions;
pub use parse_schema::{
    instance_to_schema, parse_schema, parse_schema_with_options, schema_to_instance,
};
pub use registry::{TypeId, TypeRegistry};
pub use schema_schema::schema_schema;
pub use serialize::{serialize, serialize_canonical};

use apg_core::{CanonicalTriples, Instance, Schema};
use apg_shex::{ShapeValidator, Validator};
use oxrdf::Graph;
use oxttl::NTriplesParser;

/// Read N-Triples text into a graph.
pub fn read_ntriples(input: &str) -> Result<Graph, ParseError> {
    let mut graph = Graph::new();
    for triple in NTriplesParser::new().for_reader(input.as_bytes()) {
        graph.insert(&triple?);
    }
    Ok(graph)
}

/// Decode every instance of `schema` in `graph`.
pub fn parse(graph: &Graph, schema: &Schema) -> Result<Instance, ParseError> {
    parse_with_options(graph, schema, &ParseOptions::default())
}

/// Decode with explicit options.
pub fn parse_with_options(
    graph: &Graph,
    schema: &Schema,
    options: &ParseOptions,
) -> Result<Instance, ParseError> {
    let compiled = compile(schema)?;
    let validator = Validator::new(compiled.constraints(), graph).with_max_depth(options.max_depth);
    decode(graph, schema, &compiled, validator, options)
}

/// Decode with a caller-supplied engine. `validator` must check nodes of
/// `graph` against `compiled.constraints()`.
pub fn parse_with_validator<V: ShapeValidator + Send>(
    graph: &Graph,
    schema: &Schema,
    compiled: &CompiledSchema,
    validator: V,
    options: &ParseOptions,
) -> Result<Instance, ParseError> {
    decode(graph, schema, compiled, validator, options)
}

/// Decode N-Triples text.
pub fn parse_string(input: &str, schema: &Schema) -> Result<Instance, ParseError> {
    parse(&read_ntriples(input)?, schema)
}

/// Decode a schema graph from N-Triples text.
pub fn parse_schema_string(input: &str) -> Result<Schema, ParseError> {
    parse_schema(&read_ntriples(input)?)
}

/// Serialize to canonical N-Triples.
pub fn serialize_string(
    instance: &Instance,
    schema: &Schema,
) -> Result<CanonicalTriples, SerializeError> {
    serialize_canonical(instance, schema)
}

/// Write a schema as a graph of the bootstrap schema.
pub fn serialize_schema(schema: &Schema) -> Result<Vec<oxrdf::Triple>, SchemaWriteError> {
    Ok(serialize(&schema_to_instance(schema)?, &schema_schema())?)
}

/// Write a schema as canonical N-Triples.
pub fn serialize_schema_string(schema: &Schema) -> Result<CanonicalTriples, SchemaWriteError> {
    Ok(CanonicalTriples::new(serialize_schema(schema)?))
}

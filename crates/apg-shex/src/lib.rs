//! # apg-shex — Shape Constraints, Witnesses, and a Reference Engine
//!
//! The `apg-format` compiler turns a schema into a [`ConstraintSchema`]: a
//! set of labeled shape expressions in the style of ShEx. A validation
//! engine checks a graph node against one of those shapes and answers with
//! either a [`ValidationFailure`] or a [`Witness`], a structured proof of
//! *how* the node matched, which the decoder walks to build typed values.
//!
//! ## Modules
//!
//! - [`schema`] — constraint model (`ShapeExpr`, `TripleExpr`, …) and its
//!   ShExJ rendering.
//! - [`witness`] — success witness tree, including the `Recursion` leaf
//!   emitted when a node re-enters a shape that is still being checked.
//! - [`failure`] — structured failures with nested violations.
//! - [`traits`] — the [`ShapeValidator`] seam the decoder is written against.
//! - [`validator`] — [`Validator`], the reference engine over an
//!   `oxrdf::Graph`.
//!
//! ## Crate Policy
//!
//! - Knows nothing about the schema language; only shapes and triples.
//! - Validation is a pure function of (constraints, graph, node, shape).

pub mod failure;
pub mod schema;
pub mod traits;
pub mod validator;
pub mod witness;

pub use failure::{ValidationFailure, Violation};
pub use schema::{
    ConstraintSchema, NodeConstraint, NodeKind, Shape, ShapeDecl, ShapeExpr, ShapeLabel,
    TripleConstraint, TripleExpr,
};
pub use traits::{EngineError, ShapeValidator};
pub use validator::Validator;
pub use witness::{
    EachOfSolution, OneOfSolution, TestedTriple, TripleConstraintSolutions, TripleExprSolutions,
    Witness,
};

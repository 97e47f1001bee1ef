//! # Success Witnesses
//!
//! A [`Witness`] records how a node satisfied a shape. Its structure mirrors
//! the shape expression that was checked: a conjunction yields
//! [`Witness::ShapeAnd`], a node constraint [`Witness::NodeConstraintTest`],
//! a shape [`Witness::ShapeTest`] carrying the solution of its triple
//! expression. When a node reaches a `(node, shape)` pair that is already
//! being checked further up, the engine answers [`Witness::Recursion`]
//! instead of re-entering it.

use std::sync::Arc;

use oxrdf::{NamedNode, Term};

use crate::schema::{NodeConstraint, ShapeLabel};

/// Proof that a node satisfied a labeled shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Witness {
    /// Every conjunct held; one witness per conjunct in declared order.
    ShapeAnd {
        /// Node tested.
        node: Term,
        /// Declaration the conjunction belongs to.
        shape: ShapeLabel,
        /// Conjunct witnesses.
        solutions: Vec<Witness>,
    },
    /// A node constraint held.
    NodeConstraintTest {
        /// Node tested.
        node: Term,
        /// Declaration the constraint belongs to.
        shape: ShapeLabel,
        /// The constraint that held.
        constraint: NodeConstraint,
    },
    /// A shape held.
    ShapeTest {
        /// Node tested.
        node: Term,
        /// Declaration the shape belongs to.
        shape: ShapeLabel,
        /// Solution of the triple expression; `None` for an empty shape.
        solution: Option<TripleExprSolutions>,
    },
    /// The node re-entered a shape still being checked.
    Recursion {
        /// Node tested.
        node: Term,
        /// Shape being re-entered.
        shape: ShapeLabel,
    },
}

impl Witness {
    /// Node the witness is about.
    pub fn node(&self) -> &Term {
        match self {
            Self::ShapeAnd { node, .. }
            | Self::NodeConstraintTest { node, .. }
            | Self::ShapeTest { node, .. }
            | Self::Recursion { node, .. } => node,
        }
    }

    /// Declaration label the witness was produced for.
    pub fn shape(&self) -> &ShapeLabel {
        match self {
            Self::ShapeAnd { shape, .. }
            | Self::NodeConstraintTest { shape, .. }
            | Self::ShapeTest { shape, .. }
            | Self::Recursion { shape, .. } => shape,
        }
    }

    /// Short tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShapeAnd { .. } => "ShapeAndResults",
            Self::NodeConstraintTest { .. } => "NodeConstraintTest",
            Self::ShapeTest { .. } => "ShapeTest",
            Self::Recursion { .. } => "Recursion",
        }
    }
}

/// Solution of a triple expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripleExprSolutions {
    /// `EachOf` solutions.
    EachOf(Vec<EachOfSolution>),
    /// `OneOf` solutions.
    OneOf(Vec<OneOfSolution>),
    /// Triples matched by a triple constraint.
    TripleConstraint(TripleConstraintSolutions),
}

impl TripleExprSolutions {
    /// Short tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EachOf(_) => "EachOfSolutions",
            Self::OneOf(_) => "OneOfSolutions",
            Self::TripleConstraint(_) => "TripleConstraintSolutions",
        }
    }
}

/// One way an `EachOf` was satisfied: one solution per sub-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EachOfSolution {
    /// Sub-expression solutions in declared order.
    pub expressions: Vec<TripleExprSolutions>,
}

/// One way a `OneOf` was satisfied: the solution of the chosen branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOfSolution {
    /// Solutions of the chosen branch (always one for this engine).
    pub expressions: Vec<TripleExprSolutions>,
}

/// Triples matched by one triple constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleConstraintSolutions {
    /// Constraint predicate.
    pub predicate: NamedNode,
    /// Referenced shape, when the value expression is a shape reference.
    pub value_expr: Option<ShapeLabel>,
    /// Production label of the constraint.
    pub production_label: Option<String>,
    /// Minimum cardinality the constraint declared.
    pub min: u32,
    /// Maximum cardinality the constraint declared.
    pub max: Option<u32>,
    /// Matched triples, in graph order.
    pub solutions: Vec<TestedTriple>,
}

/// A matched triple and the witness for its object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestedTriple {
    /// Subject (the node being validated).
    pub subject: Term,
    /// Predicate.
    pub predicate: NamedNode,
    /// Object.
    pub object: Term,
    /// Witness for the object, when the constraint has a value expression.
    /// Shared with every other triple whose object was checked against the
    /// same shape.
    pub referenced: Option<Arc<Witness>>,
}

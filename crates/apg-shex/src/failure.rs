//! # Validation Failures
//!
//! A [`ValidationFailure`] names the shape and node that failed and lists
//! every [`Violation`] found. Failures of referenced shapes nest through
//! [`Violation::Nested`], so the innermost failure localizes the problem.

use std::fmt;
use std::sync::Arc;

use oxrdf::{NamedNode, Term};
use thiserror::Error;

use crate::schema::{NodeKind, ShapeLabel};

/// A node did not satisfy a shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node {node} does not satisfy shape {shape}: {}", ViolationList(.violations))]
pub struct ValidationFailure {
    /// Declaration that failed.
    pub shape: ShapeLabel,
    /// Node that failed it.
    pub node: Term,
    /// Everything that went wrong; never empty.
    pub violations: Vec<Violation>,
}

/// One reason a node failed a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The node has the wrong term kind.
    NodeKind {
        /// Kind required.
        expected: NodeKind,
    },
    /// The node is not a literal of the required datatype.
    Datatype {
        /// Datatype required.
        expected: NamedNode,
    },
    /// The node is not in the value set.
    NotInValueSet,
    /// The number of triples with a predicate is out of bounds.
    Cardinality {
        /// Predicate.
        predicate: NamedNode,
        /// Minimum required.
        min: u32,
        /// Maximum allowed; `None` is unbounded.
        max: Option<u32>,
        /// Number found.
        found: usize,
    },
    /// A triple no constraint accounts for.
    UnexpectedTriple {
        /// Predicate.
        predicate: NamedNode,
        /// Object.
        object: Term,
    },
    /// No branch of a `OneOf` matched.
    NoMatchingOption,
    /// A referenced value failed its own shape.
    Nested(Arc<ValidationFailure>),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeKind { expected } => write!(f, "expected a node of kind {expected}"),
            Self::Datatype { expected } => write!(f, "expected a literal of datatype {expected}"),
            Self::NotInValueSet => f.write_str("value not in the allowed set"),
            Self::Cardinality {
                predicate,
                min,
                max,
                found,
            } => {
                let max = max.map_or_else(|| "*".to_string(), |m| m.to_string());
                write!(f, "{found} triples with {predicate}, expected {min}..{max}")
            }
            Self::UnexpectedTriple { predicate, object } => {
                write!(f, "unexpected triple {predicate} {object}")
            }
            Self::NoMatchingOption => f.write_str("no option matched"),
            Self::Nested(failure) => write!(f, "({failure})"),
        }
    }
}

struct ViolationList<'a>(&'a [Violation]);

impl fmt::Display for ViolationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl ValidationFailure {
    /// A failure with a single violation.
    pub fn new(shape: ShapeLabel, node: Term, violation: Violation) -> Self {
        Self {
            shape,
            node,
            violations: vec![violation],
        }
    }

    /// This failure and every nested one, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let next = pending.pop()?;
            for violation in next.violations.iter().rev() {
                if let Violation::Nested(inner) = violation {
                    pending.push(inner);
                }
            }
            Some(next)
        })
    }

    /// The first failure, searching outermost first, for this shape.
    pub fn find(&self, shape: &ShapeLabel) -> Option<&ValidationFailure> {
        self.iter().find(|failure| &failure.shape == shape)
    }

    /// Multi-line report, one failure per line, indented by depth.
    pub fn report(&self) -> String {
        let mut out = String::new();
        self.write_report(&mut out, 0);
        out
    }

    fn write_report(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{indent}{} @ {}\n", self.shape, self.node));
        for violation in &self.violations {
            match violation {
                Violation::Nested(inner) => inner.write_report(out, depth + 1),
                other => out.push_str(&format!("{indent}  - {other}\n")),
            }
        }
    }
}

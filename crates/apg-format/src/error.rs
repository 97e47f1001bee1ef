//! # Error Types
//!
//! Three disjoint classes:
//!
//! - [`CompileError`]: the schema itself cannot be compiled (duplicate or
//!   reserved keys, malformed IRIs, out-of-range references). A programmer
//!   or schema error.
//! - [`ParseError::Validation`]: the data does not conform to the schema.
//!   Reportable; carries the failing shape, node and nested violations.
//! - [`Defect`]: the engine reported success with a witness the decoder
//!   cannot reconcile with the compiled shapes. Always fatal; never
//!   downgraded to a validation failure.

use apg_core::{ModelError, TypeKind};
use apg_shex::{ShapeLabel, ValidationFailure};
use oxrdf::Term;
use thiserror::Error;

/// A schema that cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Two labels share a key.
    #[error("duplicate label key {key}")]
    DuplicateLabel {
        /// The repeated key.
        key: String,
    },

    /// A product or coproduct repeats a member key.
    #[error("duplicate {kind} member key {key} in label {label}")]
    DuplicateKey {
        /// Key of the enclosing label.
        label: String,
        /// Product or coproduct.
        kind: TypeKind,
        /// The repeated key.
        key: String,
    },

    /// A product or coproduct uses the type-marker predicate as a key.
    #[error("{kind} in label {label} uses the reserved key {key}")]
    ReservedKey {
        /// Key of the enclosing label.
        label: String,
        /// Product or coproduct.
        kind: TypeKind,
        /// The reserved key.
        key: String,
    },

    /// A key or datatype is not an absolute IRI.
    #[error("invalid IRI {iri:?}: {reason}")]
    InvalidIri {
        /// The offending text.
        iri: String,
        /// Parser message.
        reason: String,
    },

    /// A reference targets a label that does not exist.
    #[error("reference to label {target} in label {label}, but the schema has {count} labels")]
    ReferenceOutOfRange {
        /// Key of the enclosing label.
        label: String,
        /// Referenced index.
        target: usize,
        /// Number of labels.
        count: usize,
    },

    /// A content type node the registry did not reach.
    #[error("{kind} type node is not registered")]
    UnregisteredType {
        /// Type kind.
        kind: TypeKind,
    },

    /// A label's value is a chain of references leading back to itself.
    #[error("label {label} is defined only by references back to itself")]
    UnguardedReferenceCycle {
        /// Key of the label.
        label: String,
    },

    /// A schema graph whose product or coproduct contains itself other
    /// than through a reference.
    #[error("schema graph: {kind} in label {label} contains itself")]
    CyclicType {
        /// Key of the enclosing label.
        label: String,
        /// Product or coproduct.
        kind: TypeKind,
    },
}

/// An engine witness inconsistent with the compiled shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// The witness does not have the structure of the expected shape.
    #[error("expected a witness for shape {expected}, found {found} for {found_shape}")]
    UnexpectedWitness {
        /// Shape the decoder expected.
        expected: ShapeLabel,
        /// Witness tag found.
        found: &'static str,
        /// Shape the witness was produced for.
        found_shape: ShapeLabel,
    },

    /// The witnessed node has the wrong term kind for its type.
    #[error("{kind} shape {shape} matched node {node}")]
    NodeKind {
        /// Type kind.
        kind: TypeKind,
        /// Shape of the type.
        shape: ShapeLabel,
        /// The node.
        node: Term,
    },

    /// A product witness has the wrong number of component solutions.
    #[error("product shape {shape} has {expected} components, witness has {found}")]
    ComponentCount {
        /// Product shape.
        shape: ShapeLabel,
        /// Declared component count.
        expected: usize,
        /// Solutions in the witness.
        found: usize,
    },

    /// A member solution carries the wrong production label.
    #[error("expected production {expected}, found {found:?}")]
    ProductionLabel {
        /// Production label the compiler minted.
        expected: String,
        /// Label in the witness.
        found: Option<String>,
    },

    /// A coproduct witness names an option that does not exist.
    #[error("coproduct shape {shape} matched unknown option {found}")]
    OptionLabel {
        /// Coproduct shape.
        shape: ShapeLabel,
        /// Production label in the witness.
        found: String,
    },

    /// A member solution references the wrong value shape.
    #[error("production {production} expected value shape {expected}, found {found:?}")]
    ValueExpr {
        /// Production label.
        production: String,
        /// Shape the compiler referenced.
        expected: ShapeLabel,
        /// Shape in the witness.
        found: Option<ShapeLabel>,
    },

    /// A member solution matched other than exactly one triple.
    #[error("production {production} matched {found} triples, expected exactly one")]
    SolutionCount {
        /// Production label.
        production: String,
        /// Triples matched.
        found: usize,
    },

    /// A member solution has no witness for its object.
    #[error("production {production} has no witness for its object")]
    MissingReferenced {
        /// Production label.
        production: String,
    },

    /// A recursion signal with no matching frame on the decoder stack.
    #[error("recursion to {shape} at {node} has no matching frame")]
    UnexpectedRecursion {
        /// Node re-entered.
        node: Term,
        /// Shape re-entered.
        shape: ShapeLabel,
    },

    /// A content type the registry never assigned an id.
    #[error("{kind} type has no registry id")]
    UnregisteredType {
        /// Type kind.
        kind: TypeKind,
    },

    /// A label index outside the schema.
    #[error("label {label} is out of range")]
    LabelOutOfRange {
        /// The index.
        label: usize,
    },

    /// An element of a decoded schema graph does not have the shape its
    /// bootstrap label gives it.
    #[error("schema graph element {index} of bootstrap label {label} is malformed")]
    SchemaElement {
        /// Bootstrap label index.
        label: usize,
        /// Element index.
        index: usize,
    },

    /// The engine does not know a shape the compiler emitted.
    #[error("engine does not know shape {0}")]
    UnknownShape(ShapeLabel),

    /// The finished instance violates a data-model invariant.
    #[error("decoded instance is inconsistent: {0}")]
    Integrity(#[from] ModelError),
}

/// Why decoding failed.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The data does not conform to the schema.
    #[error("validation failed: {0}")]
    Validation(Box<ValidationFailure>),

    /// References nest deeper than the configured limit.
    #[error("reference depth limit of {limit} exceeded")]
    DepthLimitExceeded {
        /// Configured limit.
        limit: usize,
    },

    /// The input is not valid N-Triples.
    #[error("N-Triples syntax error: {0}")]
    Syntax(#[from] oxttl::TurtleParseError),

    /// The schema does not compile.
    #[error("schema does not compile: {0}")]
    Compile(#[from] CompileError),

    /// Engine and decoder disagree about the compiled shapes.
    #[error("internal consistency defect: {0}")]
    Defect(#[from] Defect),

    /// The depth limit needs a larger decode stack than can be reserved.
    #[error("depth limit {max_depth} needs more stack than a decode worker may reserve")]
    DepthLimitTooLarge {
        /// Configured limit.
        max_depth: usize,
    },

    /// The decode worker thread could not be started.
    #[error("cannot start decode worker: {0}")]
    Worker(#[source] std::io::Error),
}

impl ParseError {
    /// Whether the error points at the program or its configuration
    /// rather than at non-conforming data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Defect(_)
                | Self::Compile(_)
                | Self::DepthLimitTooLarge { .. }
                | Self::Worker(_)
        )
    }

    /// The validation failure, if that is what this is.
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<ValidationFailure> for ParseError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(Box::new(failure))
    }
}

/// An instance that does not fit the schema it is serialized with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// Instance and schema have different label counts.
    #[error("instance has {found} labels, schema has {expected}")]
    LabelCount {
        /// Labels in the schema.
        expected: usize,
        /// Labels in the instance.
        found: usize,
    },

    /// A value of the wrong shape for its type.
    #[error("label {label}: expected a {kind} value, found {found}")]
    TypeMismatch {
        /// Key of the enclosing label.
        label: String,
        /// Type kind expected.
        kind: TypeKind,
        /// Value variant found.
        found: &'static str,
    },

    /// A record or variant whose keys differ from the type's canonical keys.
    #[error("label {label}: {kind} keys do not match the schema")]
    KeyMismatch {
        /// Key of the enclosing label.
        label: String,
        /// Product or coproduct.
        kind: TypeKind,
    },

    /// A literal whose datatype differs from its type's.
    #[error("label {label}: literal has datatype {found}, expected {expected}")]
    Datatype {
        /// Key of the enclosing label.
        label: String,
        /// Datatype of the type.
        expected: String,
        /// Datatype of the literal.
        found: String,
    },

    /// A pointer into the wrong label or past the end of one.
    #[error("label {label}: pointer to element {index} of label {target} does not resolve")]
    UnresolvedPointer {
        /// Key of the enclosing label.
        label: String,
        /// Target label index.
        target: usize,
        /// Target element index.
        index: usize,
    },

    /// A chain of pointers that never reaches a node.
    #[error("label {label}: pointer chain does not reach a node")]
    PointerCycle {
        /// Key of the enclosing label.
        label: String,
    },

    /// A key or datatype that is not an IRI.
    #[error("invalid IRI {0:?}")]
    InvalidIri(String),
}

/// A schema that could not be written as a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaWriteError {
    /// The schema does not compile.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The bootstrap instance does not serialize.
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::BlankNode;

    #[test]
    fn test_fatal_classification() {
        let failure = ValidationFailure::new(
            ShapeLabel::new("_:l0"),
            Term::from(BlankNode::new_unchecked("a")),
            apg_shex::Violation::NoMatchingOption,
        );
        assert!(!ParseError::from(failure).is_fatal());
        assert!(!ParseError::DepthLimitExceeded { limit: 4 }.is_fatal());
        assert!(ParseError::from(Defect::LabelOutOfRange { label: 3 }).is_fatal());
        assert!(ParseError::from(CompileError::DuplicateLabel {
            key: "http://example.com/A".into()
        })
        .is_fatal());
        assert!(ParseError::DepthLimitTooLarge { max_depth: usize::MAX }.is_fatal());
        assert!(ParseError::Worker(std::io::Error::other("no threads")).is_fatal());
    }

    #[test]
    fn test_defect_message_includes_context() {
        let defect = Defect::ProductionLabel {
            expected: "_:t0-c1".into(),
            found: Some("_:t0-c2".into()),
        };
        assert_eq!(
            defect.to_string(),
            "expected production _:t0-c1, found Some(\"_:t0-c2\")"
        );
    }
}

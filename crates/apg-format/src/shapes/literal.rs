//! Literal: a literal of exactly one datatype.

use apg_shex::{NodeConstraint, ShapeExpr, ShapeLabel, Witness};
use oxrdf::NamedNode;

/// `NodeConstraint { datatype }`.
pub fn make_literal_shape(datatype: NamedNode) -> ShapeExpr {
    ShapeExpr::NodeConstraint(NodeConstraint::Datatype(datatype))
}

/// Whether `witness` is a literal witness for shape `id` and `datatype`.
pub fn is_literal_result(witness: &Witness, id: &ShapeLabel, datatype: &str) -> bool {
    matches!(
        witness,
        Witness::NodeConstraintTest {
            shape,
            constraint: NodeConstraint::Datatype(expected),
            ..
        } if shape == id && expected.as_str() == datatype
    )
}

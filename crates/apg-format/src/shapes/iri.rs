//! IRI: any named node.

use apg_shex::{NodeConstraint, NodeKind, ShapeExpr, ShapeLabel, Witness};

/// `NodeConstraint { nodeKind: iri }`.
pub fn make_iri_shape() -> ShapeExpr {
    ShapeExpr::NodeConstraint(NodeConstraint::NodeKind(NodeKind::Iri))
}

/// Whether `witness` is an IRI witness for shape `id`.
pub fn is_iri_result(witness: &Witness, id: &ShapeLabel) -> bool {
    matches!(
        witness,
        Witness::NodeConstraintTest {
            shape,
            constraint: NodeConstraint::NodeKind(NodeKind::Iri),
            ..
        } if shape == id
    )
}

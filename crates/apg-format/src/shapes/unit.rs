//! Unit: a blank node with nothing but `rdf:type` edges.

use apg_shex::{Shape, ShapeExpr, ShapeLabel, Witness};

use super::{any_type, blank_node_constraint, is_any_type_result, parse_blank_node_and};

/// `ShapeAnd[bnode, closed Shape { rdf:type 0..* }]`.
pub fn make_unit_shape() -> ShapeExpr {
    ShapeExpr::And(vec![
        blank_node_constraint(),
        ShapeExpr::Shape(Shape {
            closed: true,
            extra: Vec::new(),
            expression: Some(any_type()),
        }),
    ])
}

/// Whether `witness` is a unit witness for shape `id`.
pub fn is_unit_result(witness: &Witness, id: &ShapeLabel) -> bool {
    parse_blank_node_and(witness, id).is_some_and(is_any_type_result)
}

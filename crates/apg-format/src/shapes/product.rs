//! Product: a closed blank node with one edge per component.

use apg_shex::{
    Shape, ShapeExpr, ShapeLabel, TripleConstraint, TripleExpr, TripleExprSolutions, Witness,
};
use oxrdf::NamedNode;

use super::{
    any_type, blank_node_constraint, component_production, parse_blank_node_and,
    parse_typed_each_of,
};
use crate::registry::TypeId;

/// `ShapeAnd[bnode, closed Shape { EachOf[rdf:type 0..*, key_i @value_i ...] }]`.
///
/// `components` are `(key, value shape)` pairs in declared order; each
/// triple constraint is labeled `{id}-c{i}`.
pub fn make_product_shape(id: TypeId, components: Vec<(NamedNode, ShapeLabel)>) -> ShapeExpr {
    let mut expressions = Vec::with_capacity(components.len() + 1);
    expressions.push(any_type());
    for (index, (key, value)) in components.into_iter().enumerate() {
        expressions.push(TripleExpr::TripleConstraint(
            TripleConstraint::new(key)
                .with_id(component_production(id, index))
                .with_value(ShapeExpr::Ref(value)),
        ));
    }
    ShapeExpr::And(vec![
        blank_node_constraint(),
        ShapeExpr::Shape(Shape {
            closed: true,
            extra: Vec::new(),
            expression: Some(TripleExpr::EachOf(expressions)),
        }),
    ])
}

/// Component solutions of a product witness for shape `id`, in declared
/// order, or `None` if the witness is not a product witness.
pub fn parse_product_result<'w>(
    witness: &'w Witness,
    id: &ShapeLabel,
) -> Option<&'w [TripleExprSolutions]> {
    parse_blank_node_and(witness, id).and_then(parse_typed_each_of)
}

//! # Shapes and Witness Matchers
//!
//! One module per type kind. Each pairs the constructor of the shape the
//! compiler emits for that kind (`make_*_shape`) with a matcher that
//! recognizes the engine's witness for it and extracts the sub-witnesses
//! of its children (`is_*_result` / `parse_*_result`). A matcher that
//! returns `false` or `None` on a successful witness means compiler and
//! decoder disagree; callers report it as a [`Defect`](crate::Defect).
//!
//! ## Naming
//!
//! | Shape | Label |
//! |-------|-------|
//! | content type | `_:t{n}` |
//! | schema label root | `_:l{n}` |
//! | product component | `{type}-c{declared index}` |
//! | coproduct option | `{type}-o{declared index}` |

pub mod coproduct;
pub mod iri;
pub mod label;
pub mod literal;
pub mod product;
pub mod unit;

use apg_core::vocab::rdf;
use apg_shex::{
    NodeConstraint, NodeKind, ShapeExpr, ShapeLabel, TripleConstraint, TripleExpr,
    TripleExprSolutions, Witness,
};
use oxrdf::NamedNode;

use crate::registry::TypeId;

/// Root shape of the label at `index`.
pub fn label_shape(index: usize) -> ShapeLabel {
    ShapeLabel::new(format!("_:l{index}"))
}

/// Production label of a product component.
pub fn component_production(id: TypeId, index: usize) -> String {
    format!("{id}-c{index}")
}

/// Production label of a coproduct option.
pub fn option_production(id: TypeId, index: usize) -> String {
    format!("{id}-o{index}")
}

pub(crate) fn rdf_type() -> NamedNode {
    NamedNode::new_unchecked(rdf::TYPE)
}

/// Any number of `rdf:type` triples, any object.
pub(crate) fn any_type() -> TripleExpr {
    TripleExpr::TripleConstraint(TripleConstraint::new(rdf_type()).with_cardinality(0, None))
}

pub(crate) fn blank_node_constraint() -> ShapeExpr {
    ShapeExpr::NodeConstraint(NodeConstraint::NodeKind(NodeKind::BlankNode))
}

/// Whether a solution is the unconstrained `rdf:type` match.
pub(crate) fn is_any_type_result(solutions: &TripleExprSolutions) -> bool {
    match solutions {
        TripleExprSolutions::TripleConstraint(tc) => {
            tc.predicate.as_str() == rdf::TYPE
                && tc.min == 0
                && tc.max.is_none()
                && tc.value_expr.is_none()
                && tc.production_label.is_none()
                && tc.solutions.iter().all(|t| t.referenced.is_none())
        }
        TripleExprSolutions::EachOf(_) | TripleExprSolutions::OneOf(_) => false,
    }
}

/// Match `ShapeAnd[bnode test, Shape]` for `id` and return the shape's
/// triple-expression solution.
pub(crate) fn parse_blank_node_and<'w>(
    witness: &'w Witness,
    id: &ShapeLabel,
) -> Option<&'w TripleExprSolutions> {
    let Witness::ShapeAnd {
        shape, solutions, ..
    } = witness
    else {
        return None;
    };
    match solutions.as_slice() {
        [Witness::NodeConstraintTest {
            shape: test_shape,
            constraint: NodeConstraint::NodeKind(NodeKind::BlankNode),
            ..
        }, Witness::ShapeTest {
            shape: shape_test,
            solution: Some(solution),
            ..
        }] if shape == id && test_shape == id && shape_test == id => Some(solution),
        _ => None,
    }
}

/// Match `EachOf[any type, ...rest]` with a single solution and return
/// the rest.
pub(crate) fn parse_typed_each_of(solutions: &TripleExprSolutions) -> Option<&[TripleExprSolutions]> {
    let TripleExprSolutions::EachOf(each) = solutions else {
        return None;
    };
    let [solution] = each.as_slice() else {
        return None;
    };
    let (first, rest) = solution.expressions.split_first()?;
    is_any_type_result(first).then_some(rest)
}

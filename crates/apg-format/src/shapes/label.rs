//! Label roots: the entry point of every reference.
//!
//! A node is an instance of label `i` if it carries `rdf:type <key>` and
//! satisfies the shape of the label's value. Other `rdf:type` triples are
//! tolerated so one node can be typed with several labels.

use apg_shex::{
    NodeConstraint, Shape, ShapeExpr, ShapeLabel, TripleConstraint, TripleExpr,
    TripleExprSolutions, Witness,
};
use oxrdf::{NamedNode, Term};

use super::{label_shape, rdf_type};

/// `ShapeAnd[Shape { EXTRA rdf:type; rdf:type [key] }, @value]`.
pub fn make_label_shape(key: NamedNode, value: ShapeLabel) -> ShapeExpr {
    ShapeExpr::And(vec![
        ShapeExpr::Shape(Shape {
            closed: false,
            extra: vec![rdf_type()],
            expression: Some(TripleExpr::TripleConstraint(
                TripleConstraint::new(rdf_type()).with_value(ShapeExpr::NodeConstraint(
                    NodeConstraint::Values(vec![Term::NamedNode(key)]),
                )),
            )),
        }),
        ShapeExpr::Ref(value),
    ])
}

/// Whether `witness` is a root witness for label `index` with key `key`.
pub fn is_label_result(witness: &Witness, index: usize, key: &str) -> bool {
    parse_label_result(witness, index, key).is_some()
}

/// The witness for the label's value, if `witness` is a root witness for
/// label `index` with key `key`.
pub fn parse_label_result<'w>(witness: &'w Witness, index: usize, key: &str) -> Option<&'w Witness> {
    let id = label_shape(index);
    let Witness::ShapeAnd {
        shape, solutions, ..
    } = witness
    else {
        return None;
    };
    let [Witness::ShapeTest {
        shape: type_shape,
        solution: Some(TripleExprSolutions::TripleConstraint(types)),
        ..
    }, value] = solutions.as_slice()
    else {
        return None;
    };
    let typed = matches!(
        types.solutions.as_slice(),
        [triple] if matches!(&triple.object, Term::NamedNode(object) if object.as_str() == key)
    );
    (*shape == id && *type_shape == id && types.predicate == rdf_type() && typed).then_some(value)
}

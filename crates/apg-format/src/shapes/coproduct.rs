//! Coproduct: a closed blank node with exactly one option edge.

use apg_shex::{
    Shape, ShapeExpr, ShapeLabel, TripleConstraint, TripleConstraintSolutions, TripleExpr,
    TripleExprSolutions, Witness,
};
use oxrdf::NamedNode;

use super::{
    any_type, blank_node_constraint, option_production, parse_blank_node_and, parse_typed_each_of,
};
use crate::registry::TypeId;

/// `ShapeAnd[bnode, closed Shape { EachOf[rdf:type 0..*, OneOf[key_i @value_i ...]] }]`.
///
/// `options` are `(key, value shape)` pairs in declared order; each triple
/// constraint is labeled `{id}-o{i}`.
pub fn make_coproduct_shape(id: TypeId, options: Vec<(NamedNode, ShapeLabel)>) -> ShapeExpr {
    let branches = options
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| {
            TripleExpr::TripleConstraint(
                TripleConstraint::new(key)
                    .with_id(option_production(id, index))
                    .with_value(ShapeExpr::Ref(value)),
            )
        })
        .collect();
    ShapeExpr::And(vec![
        blank_node_constraint(),
        ShapeExpr::Shape(Shape {
            closed: true,
            extra: Vec::new(),
            expression: Some(TripleExpr::EachOf(vec![
                any_type(),
                TripleExpr::OneOf(branches),
            ])),
        }),
    ])
}

/// The chosen option's solution in a coproduct witness for shape `id`, or
/// `None` if the witness is not a coproduct witness.
pub fn parse_coproduct_result<'w>(
    witness: &'w Witness,
    id: &ShapeLabel,
) -> Option<&'w TripleConstraintSolutions> {
    let rest = parse_blank_node_and(witness, id).and_then(parse_typed_each_of)?;
    let [TripleExprSolutions::OneOf(one_of)] = rest else {
        return None;
    };
    let [chosen] = one_of.as_slice() else {
        return None;
    };
    match chosen.expressions.as_slice() {
        [TripleExprSolutions::TripleConstraint(option)] => Some(option),
        _ => None,
    }
}

/// Declared option index encoded in a production label `{id}-o{N}`.
pub fn option_index(id: TypeId, production: &str) -> Option<usize> {
    let tail = production.strip_prefix(&id.to_string())?;
    let digits = tail.strip_prefix("-o")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_index() {
        let id = TypeId::from_index(4);
        assert_eq!(option_index(id, "_:t4-o0"), Some(0));
        assert_eq!(option_index(id, "_:t4-o12"), Some(12));
        assert_eq!(option_index(id, "_:t4-c0"), None);
        assert_eq!(option_index(id, "_:t40-o1"), None);
        assert_eq!(option_index(id, "_:t4-o"), None);
        assert_eq!(option_index(id, "_:t4-o+1"), None);
        assert_eq!(option_index(id, "_:t3-o1"), None);
    }

    #[test]
    fn test_shape_structure() {
        let id = TypeId::from_index(0);
        let ShapeExpr::And(parts) = make_coproduct_shape(
            id,
            vec![(NamedNode::new_unchecked("http://example.com/x"), ShapeLabel::new("_:t1"))],
        ) else {
            panic!("expected ShapeAnd");
        };
        let ShapeExpr::Shape(shape) = &parts[1] else {
            panic!("expected Shape");
        };
        assert!(shape.closed);
        let Some(TripleExpr::EachOf(each)) = &shape.expression else {
            panic!("expected EachOf");
        };
        let TripleExpr::OneOf(branches) = &each[1] else {
            panic!("expected OneOf");
        };
        let TripleExpr::TripleConstraint(tc) = &branches[0] else {
            panic!("expected triple constraint");
        };
        assert_eq!(tc.id.as_deref(), Some("_:t0-o0"));
        assert_eq!(
            tc.value_expr.as_deref(),
            Some(&ShapeExpr::Ref(ShapeLabel::new("_:t1")))
        );
    }
}

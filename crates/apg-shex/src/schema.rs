//! # Constraint Model
//!
//! Labeled shape expressions, close to ShExJ. Only the constructs the apg
//! compiler emits are modeled: node kind / datatype / value-set node
//! constraints, conjunctions, (closed) shapes over `EachOf` / `OneOf` /
//! triple-constraint expressions, and references to other labeled shapes.

use std::collections::{HashMap, HashSet};
use std::fmt;

use oxrdf::{NamedNode, Term};
use serde_json::json;

/// Label of a shape declaration, e.g. `_:t3` or `_:l0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeLabel(String);

impl ShapeLabel {
    /// Create a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RDF term kind tested by a node constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Named node.
    Iri,
    /// Blank node.
    BlankNode,
    /// Literal.
    Literal,
    /// Named or blank node.
    NonLiteral,
}

impl NodeKind {
    /// ShExJ keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iri => "iri",
            Self::BlankNode => "bnode",
            Self::Literal => "literal",
            Self::NonLiteral => "nonliteral",
        }
    }

    /// Whether a term has this kind.
    pub fn matches(&self, term: &Term) -> bool {
        match self {
            Self::Iri => matches!(term, Term::NamedNode(_)),
            Self::BlankNode => matches!(term, Term::BlankNode(_)),
            Self::Literal => matches!(term, Term::Literal(_)),
            Self::NonLiteral => !matches!(term, Term::Literal(_)),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test on a single term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeConstraint {
    /// The term has this kind.
    NodeKind(NodeKind),
    /// The term is a literal with exactly this datatype.
    Datatype(NamedNode),
    /// The term is one of these.
    Values(Vec<Term>),
}

/// A shape expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeExpr {
    /// Node constraint.
    NodeConstraint(NodeConstraint),
    /// Every conjunct holds.
    And(Vec<ShapeExpr>),
    /// Constraint on the node's outgoing triples.
    Shape(Shape),
    /// Reference to a labeled shape.
    Ref(ShapeLabel),
}

/// Constraint on the outgoing triples of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// Closed shapes reject any triple the expression does not claim.
    pub closed: bool,
    /// Predicates whose triples may fail the value expression without
    /// failing the shape; such triples are left unclaimed.
    pub extra: Vec<NamedNode>,
    /// Triple expression; `None` is the empty expression.
    pub expression: Option<TripleExpr>,
}

/// A triple expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripleExpr {
    /// Every sub-expression matches a disjoint part of the neighbourhood.
    EachOf(Vec<TripleExpr>),
    /// Exactly one sub-expression matches.
    OneOf(Vec<TripleExpr>),
    /// Triples with one predicate.
    TripleConstraint(TripleConstraint),
}

impl TripleExpr {
    /// Every predicate mentioned in the expression.
    pub fn predicates(&self) -> Vec<&NamedNode> {
        match self {
            Self::EachOf(exprs) | Self::OneOf(exprs) => {
                exprs.iter().flat_map(TripleExpr::predicates).collect()
            }
            Self::TripleConstraint(tc) => vec![&tc.predicate],
        }
    }
}

/// Triples with one predicate whose objects satisfy a value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleConstraint {
    /// Production label, reported back in witnesses.
    pub id: Option<String>,
    /// Predicate.
    pub predicate: NamedNode,
    /// Constraint on objects; `None` accepts any object.
    pub value_expr: Option<Box<ShapeExpr>>,
    /// Minimum number of triples.
    pub min: u32,
    /// Maximum number of triples; `None` is unbounded.
    pub max: Option<u32>,
}

impl TripleConstraint {
    /// Exactly one triple with `predicate`, any object.
    pub fn new(predicate: NamedNode) -> Self {
        Self {
            id: None,
            predicate,
            value_expr: None,
            min: 1,
            max: Some(1),
        }
    }

    /// Set the production label.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the value expression.
    pub fn with_value(mut self, value_expr: ShapeExpr) -> Self {
        self.value_expr = Some(Box::new(value_expr));
        self
    }

    /// Set the cardinality.
    pub fn with_cardinality(mut self, min: u32, max: Option<u32>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

/// A labeled shape expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDecl {
    /// Declaration label.
    pub id: ShapeLabel,
    /// Declared expression.
    pub expr: ShapeExpr,
}

/// Labeled shape declarations in emission order.
///
/// Some declarations may be marked as recursion roots. Re-entering a
/// `(node, root)` pair that is still being checked yields
/// [`Witness::Recursion`](crate::Witness::Recursion); other declarations
/// are checked again inline unless no root lies between the two visits.
/// With no root marked, every declaration is a root.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSchema {
    shapes: Vec<ShapeDecl>,
    index: HashMap<ShapeLabel, usize>,
    roots: HashSet<ShapeLabel>,
}

impl ConstraintSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration. Returns `false` (and leaves the schema unchanged)
    /// if the label is already declared.
    pub fn insert(&mut self, decl: ShapeDecl) -> bool {
        if self.index.contains_key(&decl.id) {
            return false;
        }
        self.index.insert(decl.id.clone(), self.shapes.len());
        self.shapes.push(decl);
        true
    }

    /// Add a declaration and mark it as a recursion root.
    pub fn insert_root(&mut self, decl: ShapeDecl) -> bool {
        let id = decl.id.clone();
        let inserted = self.insert(decl);
        if inserted {
            self.roots.insert(id);
        }
        inserted
    }

    /// Whether re-entering `label` on the same node yields a recursion
    /// witness.
    pub fn is_root(&self, label: &ShapeLabel) -> bool {
        self.roots.is_empty() || self.roots.contains(label)
    }

    /// Expression declared under a label.
    pub fn get(&self, label: &ShapeLabel) -> Option<&ShapeExpr> {
        self.index.get(label).map(|&i| &self.shapes[i].expr)
    }

    /// Declarations in emission order.
    pub fn shapes(&self) -> &[ShapeDecl] {
        &self.shapes
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// ShExJ rendering of the schema.
    pub fn to_shexj(&self) -> serde_json::Value {
        let shapes: Vec<serde_json::Value> = self
            .shapes
            .iter()
            .map(|decl| {
                json!({
                    "type": "ShapeDecl",
                    "id": decl.id.as_str(),
                    "shapeExpr": shape_expr_json(&decl.expr),
                })
            })
            .collect();
        json!({
            "@context": "http://www.w3.org/ns/shex.jsonld",
            "type": "Schema",
            "shapes": shapes,
        })
    }
}

fn shape_expr_json(expr: &ShapeExpr) -> serde_json::Value {
    match expr {
        ShapeExpr::NodeConstraint(NodeConstraint::NodeKind(kind)) => {
            json!({ "type": "NodeConstraint", "nodeKind": kind.as_str() })
        }
        ShapeExpr::NodeConstraint(NodeConstraint::Datatype(datatype)) => {
            json!({ "type": "NodeConstraint", "datatype": datatype.as_str() })
        }
        ShapeExpr::NodeConstraint(NodeConstraint::Values(values)) => {
            let values: Vec<serde_json::Value> = values.iter().map(term_json).collect();
            json!({ "type": "NodeConstraint", "values": values })
        }
        ShapeExpr::And(exprs) => json!({
            "type": "ShapeAnd",
            "shapeExprs": exprs.iter().map(shape_expr_json).collect::<Vec<_>>(),
        }),
        ShapeExpr::Shape(shape) => {
            let mut object = json!({ "type": "Shape" });
            if shape.closed {
                object["closed"] = json!(true);
            }
            if !shape.extra.is_empty() {
                let extra: Vec<&str> = shape.extra.iter().map(NamedNode::as_str).collect();
                object["extra"] = json!(extra);
            }
            if let Some(expression) = &shape.expression {
                object["expression"] = triple_expr_json(expression);
            }
            object
        }
        ShapeExpr::Ref(label) => json!(label.as_str()),
    }
}

fn triple_expr_json(expr: &TripleExpr) -> serde_json::Value {
    match expr {
        TripleExpr::EachOf(exprs) => json!({
            "type": "EachOf",
            "expressions": exprs.iter().map(triple_expr_json).collect::<Vec<_>>(),
        }),
        TripleExpr::OneOf(exprs) => json!({
            "type": "OneOf",
            "expressions": exprs.iter().map(triple_expr_json).collect::<Vec<_>>(),
        }),
        TripleExpr::TripleConstraint(tc) => {
            let mut object = json!({
                "type": "TripleConstraint",
                "predicate": tc.predicate.as_str(),
            });
            if let Some(id) = &tc.id {
                object["id"] = json!(id);
            }
            if let Some(value_expr) = &tc.value_expr {
                object["valueExpr"] = shape_expr_json(value_expr);
            }
            if tc.min != 1 || tc.max != Some(1) {
                object["min"] = json!(tc.min);
                object["max"] = json!(tc.max.map_or(-1, i64::from));
            }
            object
        }
    }
}

fn term_json(term: &Term) -> serde_json::Value {
    match term {
        Term::NamedNode(node) => json!(node.as_str()),
        Term::BlankNode(node) => json!(node.to_string()),
        Term::Literal(literal) => match literal.language() {
            Some(language) => json!({ "value": literal.value(), "language": language }),
            None => json!({ "value": literal.value(), "type": literal.datatype().as_str() }),
        },
        #[allow(unreachable_patterns)]
        other => json!(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal};

    fn predicate(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    #[test]
    fn test_insert_rejects_duplicate_label() {
        let mut schema = ConstraintSchema::new();
        let decl = ShapeDecl {
            id: ShapeLabel::new("_:t0"),
            expr: ShapeExpr::NodeConstraint(NodeConstraint::NodeKind(NodeKind::Iri)),
        };
        assert!(schema.insert(decl.clone()));
        assert!(!schema.insert(decl));
        assert_eq!(schema.len(), 1);
        assert!(schema.get(&ShapeLabel::new("_:t0")).is_some());
        assert!(schema.get(&ShapeLabel::new("_:t1")).is_none());
    }

    #[test]
    fn test_roots_default_to_every_declaration() {
        let decl = |id: &str| ShapeDecl {
            id: ShapeLabel::new(id),
            expr: ShapeExpr::NodeConstraint(NodeConstraint::NodeKind(NodeKind::Iri)),
        };
        let mut schema = ConstraintSchema::new();
        schema.insert(decl("_:t0"));
        assert!(schema.is_root(&ShapeLabel::new("_:t0")));

        assert!(schema.insert_root(decl("_:l0")));
        assert!(schema.is_root(&ShapeLabel::new("_:l0")));
        assert!(!schema.is_root(&ShapeLabel::new("_:t0")));
        assert!(!schema.insert_root(decl("_:l0")));
    }

    #[test]
    fn test_node_kind_matches() {
        let iri = Term::from(predicate("http://example.com/a"));
        let bnode = Term::from(BlankNode::new_unchecked("b"));
        let literal = Term::from(Literal::new_simple_literal("c"));
        assert!(NodeKind::Iri.matches(&iri));
        assert!(NodeKind::BlankNode.matches(&bnode));
        assert!(NodeKind::Literal.matches(&literal));
        assert!(NodeKind::NonLiteral.matches(&iri));
        assert!(!NodeKind::NonLiteral.matches(&literal));
    }

    #[test]
    fn test_predicates_collects_nested() {
        let expr = TripleExpr::EachOf(vec![
            TripleExpr::TripleConstraint(TripleConstraint::new(predicate("http://example.com/a"))),
            TripleExpr::OneOf(vec![TripleExpr::TripleConstraint(TripleConstraint::new(
                predicate("http://example.com/b"),
            ))]),
        ]);
        let predicates: Vec<&str> = expr.predicates().into_iter().map(NamedNode::as_str).collect();
        assert_eq!(predicates, vec!["http://example.com/a", "http://example.com/b"]);
    }

    #[test]
    fn test_shexj_triple_constraint_cardinality() {
        let mut schema = ConstraintSchema::new();
        schema.insert(ShapeDecl {
            id: ShapeLabel::new("_:t0"),
            expr: ShapeExpr::Shape(Shape {
                closed: true,
                extra: Vec::new(),
                expression: Some(TripleExpr::TripleConstraint(
                    TripleConstraint::new(predicate("http://example.com/p"))
                        .with_id("_:t0-c0")
                        .with_cardinality(0, None),
                )),
            }),
        });
        let json = schema.to_shexj();
        let expression = &json["shapes"][0]["shapeExpr"]["expression"];
        assert_eq!(json["shapes"][0]["shapeExpr"]["closed"], true);
        assert_eq!(expression["id"], "_:t0-c0");
        assert_eq!(expression["min"], 0);
        assert_eq!(expression["max"], -1);
    }
}

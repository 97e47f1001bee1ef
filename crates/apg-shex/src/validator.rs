//! # Reference Validation Engine
//!
//! [`Validator`] checks nodes of an `oxrdf::Graph` against a
//! [`ConstraintSchema`] and builds a [`Witness`] on success.
//!
//! ## Matching Rules
//!
//! - A triple constraint claims every still-unclaimed triple with its
//!   predicate whose object satisfies the value expression, then checks the
//!   count against `min..=max`. Objects that fail are violations unless the
//!   predicate is listed in the shape's `extra`, in which case they stay
//!   unclaimed.
//! - `EachOf` combines its sub-expressions over disjoint claims.
//! - `OneOf` yields one alternative per branch that matches.
//! - A closed shape accepts an alternative only if every triple outside
//!   `extra` is claimed; an open shape only checks triples whose predicate
//!   the expression mentions.
//!
//! ## Recursion
//!
//! The engine keeps the `(node, shape)` pairs currently being checked.
//! Reaching a recursion root again (see [`ConstraintSchema::is_root`])
//! yields [`Witness::Recursion`] instead of re-entering it. Any other
//! shape reached again is checked inline, unless no root frame lies
//! between the two visits. Nesting of root frames is bounded by
//! `max_depth`; exceeding it is an [`EngineError::DepthLimitExceeded`].
//!
//! ## Memo
//!
//! Results are cached per `(node, shape)`. A result that leans on open
//! frames (its witness holds a `Recursion` into them) is provisional: it
//! is reused only while those frames stay open, and dropped when one of
//! them closes or when an enclosing frame fails. Results that lean on
//! nothing are settled and persist across [`ShapeValidator::validate`]
//! calls. Failures are always settled: an assumed `Recursion` can only
//! add matches, never remove a violation. Witnesses share cached
//! subtrees through `Arc`, so a node reached along many paths is checked
//! and stored once.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use oxrdf::{Graph, NamedNode, SubjectRef, Term};
use tracing::trace;

use crate::failure::{ValidationFailure, Violation};
use crate::schema::{
    ConstraintSchema, NodeConstraint, Shape, ShapeExpr, ShapeLabel, TripleConstraint, TripleExpr,
};
use crate::traits::{EngineError, ShapeValidator};
use crate::witness::{
    EachOfSolution, OneOfSolution, TestedTriple, TripleConstraintSolutions, TripleExprSolutions,
    Witness,
};

/// Default bound on nested shape references.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

type Key = (Term, ShapeLabel);
type Memo = Result<Arc<Witness>, Arc<ValidationFailure>>;
/// Positions of open frames a result leans on.
type Leans = BTreeSet<usize>;

/// A `(node, shape)` pair being checked.
#[derive(Debug)]
struct Frame {
    node: Term,
    shape: ShapeLabel,
    root: bool,
    leans: Leans,
    /// Length of the provisional log when the frame was opened.
    log_start: usize,
}

/// Validation engine over one constraint schema and one graph.
#[derive(Debug)]
pub struct Validator<'a> {
    schema: &'a ConstraintSchema,
    graph: &'a Graph,
    max_depth: usize,
    in_progress: Vec<Frame>,
    open_roots: usize,
    settled: HashMap<Key, Memo>,
    provisional: HashMap<Key, (Memo, Leans)>,
    provisional_log: Vec<Key>,
}

/// One way a triple expression matched: its solution and the triples it
/// claimed (indices into the neighbourhood).
struct Alternative {
    solution: TripleExprSolutions,
    claimed: BTreeSet<usize>,
}

/// Result of matching a triple expression. `violations` is only
/// meaningful (and then non-empty) when `alternatives` is empty.
struct Matches {
    alternatives: Vec<Alternative>,
    violations: Vec<Violation>,
}

impl Matches {
    fn failed(violations: Vec<Violation>) -> Self {
        Self {
            alternatives: Vec::new(),
            violations,
        }
    }

    fn matched(alternatives: Vec<Alternative>) -> Self {
        Self {
            alternatives,
            violations: Vec::new(),
        }
    }
}

/// The node whose shape is being matched and its outgoing triples.
struct Neighbourhood<'n> {
    node: &'n Term,
    label: &'n ShapeLabel,
    triples: &'n [(NamedNode, Term)],
    extra: &'n [NamedNode],
}

impl<'a> Validator<'a> {
    /// A validator with the default depth limit.
    pub fn new(schema: &'a ConstraintSchema, graph: &'a Graph) -> Self {
        Self {
            schema,
            graph,
            max_depth: DEFAULT_MAX_DEPTH,
            in_progress: Vec::new(),
            open_roots: 0,
            settled: HashMap::new(),
            provisional: HashMap::new(),
            provisional_log: Vec::new(),
        }
    }

    /// Override the depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn validate_label(
        &mut self,
        node: &Term,
        label: &ShapeLabel,
    ) -> Result<Arc<Witness>, EngineError> {
        let key = (node.clone(), label.clone());
        if let Some(memo) = self.settled.get(&key) {
            return memo.clone().map_err(failure_error);
        }
        if let Some((memo, leans)) = self.provisional.get(&key).cloned() {
            self.assume(leans);
            return memo.map_err(failure_error);
        }

        let schema = self.schema;
        let root = schema.is_root(label);
        if let Some(position) = self.reentry(node, label, root) {
            trace!(%node, %label, position, "re-entered shape in progress");
            self.assume(Leans::from([position]));
            return Ok(Arc::new(Witness::Recursion {
                node: node.clone(),
                shape: label.clone(),
            }));
        }
        if root && self.open_roots >= self.max_depth {
            return Err(EngineError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        let expr = schema
            .get(label)
            .ok_or_else(|| EngineError::UnknownShape(label.clone()))?;

        let position = self.in_progress.len();
        let log_start = self.provisional_log.len();
        self.in_progress.push(Frame {
            node: node.clone(),
            shape: label.clone(),
            root,
            leans: Leans::new(),
            log_start,
        });
        self.open_roots += usize::from(root);
        let result = self.validate_expr(node, label, expr);
        self.open_roots -= usize::from(root);
        let mut leans = self
            .in_progress
            .pop()
            .map(|frame| frame.leans)
            .unwrap_or_default();
        leans.remove(&position);

        match result {
            Ok(witness) => {
                self.release(position, log_start, false);
                let witness = Arc::new(witness);
                if leans.is_empty() {
                    self.settled.insert(key, Ok(witness.clone()));
                } else {
                    self.assume(leans.clone());
                    if self
                        .provisional
                        .insert(key.clone(), (Ok(witness.clone()), leans))
                        .is_none()
                    {
                        self.provisional_log.push(key);
                    }
                }
                Ok(witness)
            }
            Err(EngineError::Failure(failure)) => {
                trace!(%node, %label, violations = failure.violations.len(), "shape failed");
                self.release(position, log_start, true);
                let failure: Arc<ValidationFailure> = Arc::from(failure);
                self.settled.insert(key, Err(failure.clone()));
                Err(failure_error(failure))
            }
            Err(other) => {
                self.release(position, log_start, true);
                Err(other)
            }
        }
    }

    /// Position of the open frame a re-entry answers with `Recursion`.
    fn reentry(&self, node: &Term, label: &ShapeLabel, root: bool) -> Option<usize> {
        let position = self
            .in_progress
            .iter()
            .rposition(|frame| frame.node == *node && frame.shape == *label)?;
        let guarded = self.in_progress[position + 1..].iter().any(|frame| frame.root);
        (root || !guarded).then_some(position)
    }

    /// Record that the current frame leans on open frames.
    fn assume(&mut self, leans: Leans) {
        if let Some(top) = self.in_progress.last_mut() {
            top.leans.extend(leans);
        }
    }

    /// Drop the provisional results recorded while the frame at `position`
    /// was open that no longer hold: all of them if it failed, otherwise
    /// those leaning on it.
    fn release(&mut self, position: usize, log_start: usize, failed: bool) {
        let mut kept = log_start;
        for index in log_start..self.provisional_log.len() {
            let holds = !failed
                && self
                    .provisional
                    .get(&self.provisional_log[index])
                    .is_some_and(|(_, leans)| !leans.contains(&position));
            if holds {
                self.provisional_log.swap(kept, index);
                kept += 1;
            } else {
                self.provisional.remove(&self.provisional_log[index]);
            }
        }
        self.provisional_log.truncate(kept);
    }

    fn validate_expr(
        &mut self,
        node: &Term,
        label: &ShapeLabel,
        expr: &ShapeExpr,
    ) -> Result<Witness, EngineError> {
        match expr {
            ShapeExpr::NodeConstraint(constraint) => {
                test_node(constraint, node)
                    .map_err(|v| ValidationFailure::new(label.clone(), node.clone(), v))?;
                Ok(Witness::NodeConstraintTest {
                    node: node.clone(),
                    shape: label.clone(),
                    constraint: constraint.clone(),
                })
            }
            ShapeExpr::And(exprs) => {
                let solutions = exprs
                    .iter()
                    .map(|e| self.validate_expr(node, label, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Witness::ShapeAnd {
                    node: node.clone(),
                    shape: label.clone(),
                    solutions,
                })
            }
            ShapeExpr::Shape(shape) => self.validate_shape(node, label, shape),
            ShapeExpr::Ref(target) => match self.validate_label(node, target) {
                Ok(witness) => Ok(into_owned(witness)),
                Err(EngineError::Failure(failure)) => Err(ValidationFailure::new(
                    label.clone(),
                    node.clone(),
                    Violation::Nested(Arc::from(failure)),
                )
                .into()),
                Err(other) => Err(other),
            },
        }
    }

    fn validate_shape(
        &mut self,
        node: &Term,
        label: &ShapeLabel,
        shape: &Shape,
    ) -> Result<Witness, EngineError> {
        let triples = self.neighbourhood(node);
        let mentioned: Vec<&NamedNode> = shape
            .expression
            .as_ref()
            .map(TripleExpr::predicates)
            .unwrap_or_default();
        let unexpected = |claimed: &BTreeSet<usize>| -> Vec<Violation> {
            triples
                .iter()
                .enumerate()
                .filter(|(index, (predicate, _))| {
                    !claimed.contains(index)
                        && !shape.extra.contains(predicate)
                        && (shape.closed || mentioned.contains(&predicate))
                })
                .map(|(_, (predicate, object))| Violation::UnexpectedTriple {
                    predicate: predicate.clone(),
                    object: object.clone(),
                })
                .collect()
        };

        let Some(expression) = &shape.expression else {
            let violations = unexpected(&BTreeSet::new());
            if violations.is_empty() {
                return Ok(Witness::ShapeTest {
                    node: node.clone(),
                    shape: label.clone(),
                    solution: None,
                });
            }
            return Err(ValidationFailure {
                shape: label.clone(),
                node: node.clone(),
                violations,
            }
            .into());
        };

        let neighbourhood = Neighbourhood {
            node,
            label,
            triples: &triples,
            extra: &shape.extra,
        };
        let available: BTreeSet<usize> = (0..triples.len()).collect();
        let matches = self.match_triple_expr(&neighbourhood, expression, &available)?;

        let mut violations = matches.violations;
        for alternative in matches.alternatives {
            let leftover = unexpected(&alternative.claimed);
            if leftover.is_empty() {
                return Ok(Witness::ShapeTest {
                    node: node.clone(),
                    shape: label.clone(),
                    solution: Some(alternative.solution),
                });
            }
            if violations.is_empty() {
                violations = leftover;
            }
        }
        Err(ValidationFailure {
            shape: label.clone(),
            node: node.clone(),
            violations,
        }
        .into())
    }

    fn match_triple_expr(
        &mut self,
        hood: &Neighbourhood<'_>,
        expr: &TripleExpr,
        available: &BTreeSet<usize>,
    ) -> Result<Matches, EngineError> {
        match expr {
            TripleExpr::TripleConstraint(tc) => self.match_triple_constraint(hood, tc, available),
            TripleExpr::EachOf(exprs) => {
                let mut partials: Vec<(Vec<TripleExprSolutions>, BTreeSet<usize>)> =
                    vec![(Vec::new(), BTreeSet::new())];
                for expr in exprs {
                    let mut next = Vec::new();
                    let mut violations = Vec::new();
                    for (solutions, claimed) in &partials {
                        let remaining: BTreeSet<usize> =
                            available.difference(claimed).copied().collect();
                        let matches = self.match_triple_expr(hood, expr, &remaining)?;
                        violations.extend(matches.violations);
                        for alternative in matches.alternatives {
                            let mut solutions = solutions.clone();
                            solutions.push(alternative.solution);
                            let claimed = claimed.union(&alternative.claimed).copied().collect();
                            next.push((solutions, claimed));
                        }
                    }
                    if next.is_empty() {
                        return Ok(Matches::failed(violations));
                    }
                    partials = next;
                }
                Ok(Matches::matched(
                    partials
                        .into_iter()
                        .map(|(expressions, claimed)| Alternative {
                            solution: TripleExprSolutions::EachOf(vec![EachOfSolution {
                                expressions,
                            }]),
                            claimed,
                        })
                        .collect(),
                ))
            }
            TripleExpr::OneOf(exprs) => {
                let mut alternatives = Vec::new();
                let mut nested = Vec::new();
                for expr in exprs {
                    let matches = self.match_triple_expr(hood, expr, available)?;
                    nested.extend(
                        matches
                            .violations
                            .into_iter()
                            .filter(|v| matches!(v, Violation::Nested(_))),
                    );
                    alternatives.extend(matches.alternatives.into_iter().map(|alternative| {
                        Alternative {
                            solution: TripleExprSolutions::OneOf(vec![OneOfSolution {
                                expressions: vec![alternative.solution],
                            }]),
                            claimed: alternative.claimed,
                        }
                    }));
                }
                if alternatives.is_empty() {
                    let mut violations = vec![Violation::NoMatchingOption];
                    violations.extend(nested);
                    return Ok(Matches::failed(violations));
                }
                Ok(Matches::matched(alternatives))
            }
        }
    }

    fn match_triple_constraint(
        &mut self,
        hood: &Neighbourhood<'_>,
        tc: &TripleConstraint,
        available: &BTreeSet<usize>,
    ) -> Result<Matches, EngineError> {
        let tolerant = hood.extra.contains(&tc.predicate);
        let mut claimed = BTreeSet::new();
        let mut solutions = Vec::new();
        let mut violations = Vec::new();

        for &index in available {
            let (predicate, object) = &hood.triples[index];
            if predicate != &tc.predicate {
                continue;
            }
            let referenced = match tc.value_expr.as_deref() {
                None => None,
                Some(value_expr) => match self.validate_value(hood.label, object, value_expr) {
                    Ok(witness) => Some(witness),
                    Err(EngineError::Failure(failure)) => {
                        if !tolerant {
                            violations.push(Violation::Nested(Arc::from(failure)));
                        }
                        continue;
                    }
                    Err(other) => return Err(other),
                },
            };
            claimed.insert(index);
            solutions.push(TestedTriple {
                subject: hood.node.clone(),
                predicate: predicate.clone(),
                object: object.clone(),
                referenced,
            });
        }

        let found = solutions.len();
        let too_many = tc.max.is_some_and(|max| found > max as usize);
        if found < tc.min as usize || too_many {
            violations.push(Violation::Cardinality {
                predicate: tc.predicate.clone(),
                min: tc.min,
                max: tc.max,
                found,
            });
        }
        if !violations.is_empty() {
            return Ok(Matches::failed(violations));
        }

        let value_expr = match tc.value_expr.as_deref() {
            Some(ShapeExpr::Ref(target)) => Some(target.clone()),
            _ => None,
        };
        Ok(Matches::matched(vec![Alternative {
            solution: TripleExprSolutions::TripleConstraint(TripleConstraintSolutions {
                predicate: tc.predicate.clone(),
                value_expr,
                production_label: tc.id.clone(),
                min: tc.min,
                max: tc.max,
                solutions,
            }),
            claimed,
        }]))
    }

    fn validate_value(
        &mut self,
        label: &ShapeLabel,
        object: &Term,
        expr: &ShapeExpr,
    ) -> Result<Arc<Witness>, EngineError> {
        match expr {
            ShapeExpr::Ref(target) => self.validate_label(object, target),
            inline => self.validate_expr(object, label, inline).map(Arc::new),
        }
    }

    fn neighbourhood(&self, node: &Term) -> Vec<(NamedNode, Term)> {
        let subject: SubjectRef<'_> = match node {
            Term::NamedNode(n) => n.as_ref().into(),
            Term::BlankNode(b) => b.as_ref().into(),
            _ => return Vec::new(),
        };
        self.graph
            .triples_for_subject(subject)
            .map(|t| (t.predicate.into_owned(), t.object.into_owned()))
            .collect()
    }
}

impl ShapeValidator for Validator<'_> {
    fn validate(&mut self, node: &Term, shape: &ShapeLabel) -> Result<Witness, EngineError> {
        self.in_progress.clear();
        self.open_roots = 0;
        self.provisional.clear();
        self.provisional_log.clear();
        self.validate_label(node, shape).map(into_owned)
    }
}

fn into_owned(witness: Arc<Witness>) -> Witness {
    Arc::try_unwrap(witness).unwrap_or_else(|shared| (*shared).clone())
}

fn failure_error(failure: Arc<ValidationFailure>) -> EngineError {
    EngineError::Failure(Box::new((*failure).clone()))
}

fn test_node(constraint: &NodeConstraint, node: &Term) -> Result<(), Violation> {
    match constraint {
        NodeConstraint::NodeKind(kind) => {
            if kind.matches(node) {
                Ok(())
            } else {
                Err(Violation::NodeKind { expected: *kind })
            }
        }
        NodeConstraint::Datatype(datatype) => match node {
            Term::Literal(literal) if literal.datatype() == datatype.as_ref() => Ok(()),
            _ => Err(Violation::Datatype {
                expected: datatype.clone(),
            }),
        },
        NodeConstraint::Values(values) => {
            if values.contains(node) {
                Ok(())
            } else {
                Err(Violation::NotInValueSet)
            }
        }
    }
}

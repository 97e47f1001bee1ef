//! # Recursive Instance Decoder
//!
//! Walks engine witnesses back into typed [`Value`]s, one label instance
//! at a time.
//!
//! ## Session State
//!
//! A [`DecodeSession`] owns everything one decode needs: the growing
//! [`Instance`], a per-label cache from blank node to element index (so a
//! node reached twice under one label is decoded once and then pointed
//! at), the stack of open reference frames, and a session token.
//!
//! ## Cycles
//!
//! Decoding a reference pushes a frame `(node, label)`. When the engine
//! answers a reference with `Recursion` back to an open frame, the decoder
//! marks the frame used and returns a [`Placeholder`] for that frame's
//! depth. When the frame closes, the index its value is about to occupy is
//! known, and every copy of the placeholder is rewritten into a
//! [`Pointer`]: in the value itself and in every element appended to the
//! instance while the frame was open (values decoded for other labels
//! inside the cycle). Placeholders never reach the caller.
//!
//! ## Stack
//!
//! Engine and decoder both recurse once per nested shape. [`decode`] runs
//! the session on a scoped worker thread whose stack is sized from
//! `max_depth` and the deepest type in the schema, so the depth limit is
//! reached before the stack runs out.
//!
//! ## Failures
//!
//! Engine failures are reportable ([`ParseError::Validation`]). Witnesses
//! that claim success but do not match the compiled shapes are
//! [`Defect`]s. The first error aborts the decode; no partial instance is
//! returned.

use std::collections::HashMap;
use std::sync::Arc;

use apg_core::vocab::rdf;
use apg_core::{
    Instance, Member, Placeholder, Pointer, Record, Schema, Type, TypeKind, TypeRef, Value,
    Variant,
};
use apg_shex::{
    EngineError, NodeKind, ShapeLabel, ShapeValidator, TripleConstraintSolutions,
    TripleExprSolutions, ValidationFailure, Violation, Witness,
};
use oxrdf::{BlankNode, Graph, NamedNodeRef, Term};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::compile::CompiledSchema;
use crate::error::{Defect, ParseError};
use crate::options::ParseOptions;
use crate::registry::{TypeId, TypeRegistry};
use crate::shapes::{
    component_production, coproduct, iri, label, label_shape, literal, option_production,
    product, unit,
};

/// Stack reserved for a decode worker regardless of depth.
const STACK_BASE: usize = 4 << 20;
/// Stack reserved per nested shape frame.
const STACK_PER_NESTING: usize = 32 << 10;
/// Largest stack a decode worker may reserve.
const STACK_CEILING: usize = 1 << 30;

/// Decode every label instance of `graph` with an arbitrary engine.
///
/// `compiled` must be the compilation of `schema`, and `validator` must
/// validate against `compiled.constraints()` over `graph`. The session
/// runs on a worker thread; a panic in it resumes on the caller.
pub fn decode<V: ShapeValidator + Send>(
    graph: &Graph,
    schema: &Schema,
    compiled: &CompiledSchema,
    validator: V,
    options: &ParseOptions,
) -> Result<Instance, ParseError> {
    let stack_size = worker_stack_size(schema, options.max_depth)?;
    debug!(stack_size, max_depth = options.max_depth, "starting decode worker");
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name("apg-decode".into())
            .stack_size(stack_size)
            .spawn_scoped(scope, move || {
                DecodeSession::new(schema, compiled.registry(), validator, options).run(graph)
            })
            .map_err(ParseError::Worker)?;
        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

/// Stack needed to reach `max_depth` label frames, each holding at most
/// one frame per level of the deepest type.
fn worker_stack_size(schema: &Schema, max_depth: usize) -> Result<usize, ParseError> {
    let nesting = schema
        .labels()
        .iter()
        .map(|l| type_height(&l.value))
        .max()
        .unwrap_or(0)
        + 1;
    max_depth
        .checked_mul(nesting)
        .and_then(|frames| frames.checked_mul(STACK_PER_NESTING))
        .and_then(|bytes| bytes.checked_add(STACK_BASE))
        .filter(|&bytes| bytes <= STACK_CEILING)
        .ok_or(ParseError::DepthLimitTooLarge { max_depth })
}

/// Levels of content types from `ty` down to its deepest leaf.
fn type_height(ty: &TypeRef) -> usize {
    let members = match &**ty {
        Type::Product { components } => components,
        Type::Coproduct { options } => options,
        _ => return 1,
    };
    1 + members
        .iter()
        .map(|member| type_height(&member.value))
        .max()
        .unwrap_or(0)
}

/// An open reference frame.
#[derive(Debug)]
struct Frame {
    node: BlankNode,
    shape: ShapeLabel,
    used: bool,
    /// Length of the append log when the frame was opened.
    log_start: usize,
}

/// State of one decode call. [`DecodeSession::run`] recurses on the
/// calling thread's stack.
pub struct DecodeSession<'s, V> {
    schema: &'s Schema,
    registry: &'s TypeRegistry,
    validator: V,
    instance: Instance,
    caches: Vec<HashMap<BlankNode, usize>>,
    stack: Vec<Frame>,
    /// Every element appended so far, in order.
    appended: Vec<Pointer>,
    token: Uuid,
    max_depth: usize,
}

impl<'s, V: ShapeValidator> DecodeSession<'s, V> {
    /// A fresh session with an empty instance.
    pub fn new(
        schema: &'s Schema,
        registry: &'s TypeRegistry,
        validator: V,
        options: &ParseOptions,
    ) -> Self {
        Self {
            schema,
            registry,
            validator,
            instance: Instance::new(schema.len()),
            caches: vec![HashMap::new(); schema.len()],
            stack: Vec::new(),
            appended: Vec::new(),
            token: Uuid::new_v4(),
            max_depth: options.max_depth,
        }
    }

    /// Decode every subject typed with a label key, labels in declared
    /// order, and return the finished instance.
    pub fn run(mut self, graph: &Graph) -> Result<Instance, ParseError> {
        let schema = self.schema;
        let rdf_type = NamedNodeRef::new_unchecked(rdf::TYPE);
        for (index, l) in schema.labels().iter().enumerate() {
            let shape = label_shape(index);
            let key = NamedNodeRef::new_unchecked(&l.key);
            let subjects: Vec<Term> = graph
                .subjects_for_predicate_object(rdf_type, key)
                .map(|s| s.into_owned().into())
                .collect();
            debug!(label = %l.key, subjects = subjects.len(), "decoding label");

            for subject in subjects {
                let Term::BlankNode(node) = &subject else {
                    return Err(not_blank(shape, subject).into());
                };
                if self.caches[index].contains_key(node) {
                    trace!(%node, label = %l.key, "subject already decoded");
                    continue;
                }
                let witness = self.validate(&subject, &shape)?;
                self.decode_reference(&witness, index)?;
            }
        }
        self.instance.check_integrity().map_err(Defect::from)?;
        Ok(self.instance)
    }

    fn validate(&mut self, node: &Term, shape: &ShapeLabel) -> Result<Witness, ParseError> {
        self.validator
            .validate(node, shape)
            .map_err(|error| match error {
                EngineError::Failure(failure) => ParseError::Validation(failure),
                EngineError::DepthLimitExceeded { limit } => {
                    ParseError::DepthLimitExceeded { limit }
                }
                EngineError::UnknownShape(shape) => Defect::UnknownShape(shape).into(),
            })
    }

    fn decode_reference(&mut self, witness: &Witness, target: usize) -> Result<Value, ParseError> {
        let shape = label_shape(target);
        if let Witness::Recursion {
            node,
            shape: recursion,
        } = witness
        {
            if *recursion == shape {
                return self.resolve_recursion(node, recursion);
            }
        }

        let schema = self.schema;
        let l = schema
            .get(target)
            .ok_or(Defect::LabelOutOfRange { label: target })?;
        let inner = label::parse_label_result(witness, target, &l.key)
            .ok_or_else(|| unexpected(&shape, witness))?;
        let node = match witness.node() {
            Term::BlankNode(node) => node.clone(),
            other => return Err(not_blank(shape, other.clone()).into()),
        };
        if let Some(&index) = self.caches[target].get(&node) {
            return Ok(Value::Pointer(Pointer::new(index, target)));
        }
        if self.stack.len() >= self.max_depth {
            return Err(ParseError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        let depth = self.stack.len();
        self.stack.push(Frame {
            node: node.clone(),
            shape,
            used: false,
            log_start: self.appended.len(),
        });
        let decoded = self.decode_value(&l.value, inner);
        let frame = self.stack.pop();
        let mut value = decoded?;

        let pointer = Pointer::new(self.instance.elements(target).len(), target);
        if let Some(frame) = frame.filter(|frame| frame.used) {
            let placeholder = Placeholder {
                session: self.token,
                depth,
            };
            let mut replaced = value.substitute_placeholder(&placeholder, pointer);
            for &earlier in &self.appended[frame.log_start..] {
                if let Some(element) = self.instance.element_mut(earlier) {
                    replaced += element.substitute_placeholder(&placeholder, pointer);
                }
            }
            trace!(node = %frame.node, label = target, index = pointer.index, replaced, "closed cycle");
        }

        self.instance
            .push(target, value)
            .ok_or(Defect::LabelOutOfRange { label: target })?;
        self.appended.push(pointer);
        self.caches[target].insert(node, pointer.index);
        Ok(Value::Pointer(pointer))
    }

    fn resolve_recursion(&mut self, node: &Term, shape: &ShapeLabel) -> Result<Value, ParseError> {
        let depth = self
            .stack
            .iter()
            .rposition(|frame| {
                frame.shape == *shape && matches!(node, Term::BlankNode(n) if *n == frame.node)
            })
            .ok_or_else(|| Defect::UnexpectedRecursion {
                node: node.clone(),
                shape: shape.clone(),
            })?;
        self.stack[depth].used = true;
        trace!(%node, %shape, depth, "recursion into open frame");
        Ok(Value::Placeholder(Placeholder {
            session: self.token,
            depth,
        }))
    }

    fn decode_value(&mut self, ty: &TypeRef, witness: &Witness) -> Result<Value, ParseError> {
        match &**ty {
            Type::Reference { value } => self.decode_reference(witness, *value),
            Type::Unit => {
                let shape = self.type_id(ty)?.shape();
                if !unit::is_unit_result(witness, &shape) {
                    return Err(unexpected(&shape, witness));
                }
                Ok(Value::BlankNode(blank_node(witness, TypeKind::Unit, &shape)?))
            }
            Type::Iri => {
                let shape = self.type_id(ty)?.shape();
                if !iri::is_iri_result(witness, &shape) {
                    return Err(unexpected(&shape, witness));
                }
                match witness.node() {
                    Term::NamedNode(node) => Ok(Value::NamedNode(node.clone())),
                    other => Err(wrong_kind(TypeKind::Iri, &shape, other).into()),
                }
            }
            Type::Literal { datatype } => {
                let shape = self.type_id(ty)?.shape();
                if !literal::is_literal_result(witness, &shape, datatype) {
                    return Err(unexpected(&shape, witness));
                }
                match witness.node() {
                    Term::Literal(literal) => Ok(Value::Literal(literal.clone())),
                    other => Err(wrong_kind(TypeKind::Literal, &shape, other).into()),
                }
            }
            Type::Product { components } => {
                let id = self.type_id(ty)?;
                self.decode_product(id, components, witness)
            }
            Type::Coproduct { options } => {
                let id = self.type_id(ty)?;
                self.decode_coproduct(id, options, witness)
            }
        }
    }

    fn decode_product(
        &mut self,
        id: TypeId,
        components: &[Member],
        witness: &Witness,
    ) -> Result<Value, ParseError> {
        let shape = id.shape();
        let solutions = product::parse_product_result(witness, &shape)
            .ok_or_else(|| unexpected(&shape, witness))?;
        let node = blank_node(witness, TypeKind::Product, &shape)?;
        if solutions.len() != components.len() {
            return Err(Defect::ComponentCount {
                shape,
                expected: components.len(),
                found: solutions.len(),
            }
            .into());
        }
        let keys = self.canonical_keys(id, TypeKind::Product)?;

        let mut decoded = Vec::with_capacity(components.len());
        for (index, (component, solution)) in components.iter().zip(solutions).enumerate() {
            let production = component_production(id, index);
            let TripleExprSolutions::TripleConstraint(tc) = solution else {
                return Err(Defect::ProductionLabel {
                    expected: production,
                    found: None,
                }
                .into());
            };
            let referenced = self.member_witness(production, tc, &component.value)?;
            let value = self.decode_value(&component.value, referenced)?;
            decoded.push((component.key.as_str(), value));
        }
        decoded.sort_by(|a, b| a.0.cmp(b.0));

        Ok(Value::Record(Record {
            node,
            keys,
            components: decoded.into_iter().map(|(_, value)| value).collect(),
        }))
    }

    fn decode_coproduct(
        &mut self,
        id: TypeId,
        options: &[Member],
        witness: &Witness,
    ) -> Result<Value, ParseError> {
        let shape = id.shape();
        let chosen = coproduct::parse_coproduct_result(witness, &shape)
            .ok_or_else(|| unexpected(&shape, witness))?;
        let node = blank_node(witness, TypeKind::Coproduct, &shape)?;
        let found = chosen.production_label.clone().unwrap_or_default();
        let Some(index) = coproduct::option_index(id, &found).filter(|&i| i < options.len()) else {
            return Err(Defect::OptionLabel { shape, found }.into());
        };

        let option = &options[index];
        let referenced = self.member_witness(option_production(id, index), chosen, &option.value)?;
        let value = self.decode_value(&option.value, referenced)?;

        let keys = self.canonical_keys(id, TypeKind::Coproduct)?;
        let Ok(selected) = keys.binary_search(&option.key) else {
            return Err(Defect::OptionLabel { shape, found }.into());
        };
        Ok(Value::Variant(Variant {
            node,
            keys,
            index: selected,
            value: Box::new(value),
        }))
    }

    /// Check a member solution against what the compiler emitted for it and
    /// return the witness of its object.
    fn member_witness<'w>(
        &self,
        production: String,
        tc: &'w TripleConstraintSolutions,
        value: &TypeRef,
    ) -> Result<&'w Witness, Defect> {
        if tc.production_label.as_deref() != Some(production.as_str()) {
            return Err(Defect::ProductionLabel {
                expected: production,
                found: tc.production_label.clone(),
            });
        }
        let expected = self
            .registry
            .shape_of(value)
            .ok_or(Defect::UnregisteredType { kind: value.kind() })?;
        if tc.value_expr.as_ref() != Some(&expected) {
            return Err(Defect::ValueExpr {
                production,
                expected,
                found: tc.value_expr.clone(),
            });
        }
        let [triple] = tc.solutions.as_slice() else {
            return Err(Defect::SolutionCount {
                production,
                found: tc.solutions.len(),
            });
        };
        triple
            .referenced
            .as_deref()
            .ok_or(Defect::MissingReferenced { production })
    }

    fn type_id(&self, ty: &TypeRef) -> Result<TypeId, Defect> {
        self.registry
            .id(ty)
            .ok_or(Defect::UnregisteredType { kind: ty.kind() })
    }

    fn canonical_keys(&self, id: TypeId, kind: TypeKind) -> Result<Arc<[String]>, Defect> {
        self.registry
            .canonical_keys(id)
            .cloned()
            .ok_or(Defect::UnregisteredType { kind })
    }
}

fn unexpected(expected: &ShapeLabel, witness: &Witness) -> ParseError {
    Defect::UnexpectedWitness {
        expected: expected.clone(),
        found: witness.kind(),
        found_shape: witness.shape().clone(),
    }
    .into()
}

fn wrong_kind(kind: TypeKind, shape: &ShapeLabel, node: &Term) -> Defect {
    Defect::NodeKind {
        kind,
        shape: shape.clone(),
        node: node.clone(),
    }
}

fn blank_node(witness: &Witness, kind: TypeKind, shape: &ShapeLabel) -> Result<BlankNode, Defect> {
    match witness.node() {
        Term::BlankNode(node) => Ok(node.clone()),
        other => Err(wrong_kind(kind, shape, other)),
    }
}

/// Label instances are identified by blank node; a named subject typed
/// with a label key does not conform.
fn not_blank(shape: ShapeLabel, node: Term) -> ValidationFailure {
    ValidationFailure::new(
        shape,
        node,
        Violation::NodeKind {
            expected: NodeKind::BlankNode,
        },
    )
}

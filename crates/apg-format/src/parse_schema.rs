//! # Schema-of-Schemas Adapter
//!
//! A schema is itself data: an instance of [`schema_schema`]. This module
//! converts in both directions.
//!
//! ## Storage Order
//!
//! A schema graph stores labels, components and options in whatever order
//! its elements were decoded; references inside it address labels by that
//! storage position. [`parse_schema`] sorts labels by key and remaps every
//! reference through `permutation[storage] = canonical`, so the result is
//! independent of storage order. [`schema_to_instance`] writes labels in
//! canonical order, which makes the two directions inverse for canonical
//! schemas (labels and members sorted by key).
//!
//! ## Sharing
//!
//! One stored element reached from several value positions becomes one
//! shared `Arc` node, and one shared `Arc` is written as one element.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use apg_core::vocab::ns;
use apg_core::{Instance, Pointer, Record, Schema, Type, TypeKind, TypeRef, Value, Variant};
use oxrdf::{BlankNode, Graph};
use tracing::debug;

use crate::compile::{check_schema, parse_iri};
use crate::error::{CompileError, Defect, ParseError};
use crate::options::ParseOptions;
use crate::schema_schema::{index, schema_schema};

/// Option keys of the shared value coproduct, in canonical order.
const VALUE_KEYS: [&str; 6] = [
    ns::COPRODUCT,
    ns::IRI,
    ns::LITERAL,
    ns::PRODUCT,
    ns::REFERENCE,
    ns::UNIT,
];

/// Decode a schema graph.
pub fn parse_schema(graph: &Graph) -> Result<Schema, ParseError> {
    parse_schema_with_options(graph, &ParseOptions::default())
}

/// Decode a schema graph with explicit options.
pub fn parse_schema_with_options(
    graph: &Graph,
    options: &ParseOptions,
) -> Result<Schema, ParseError> {
    let instance = crate::parse_with_options(graph, &schema_schema(), options)?;
    let schema = instance_to_schema(&instance)?;
    debug!(labels = schema.len(), "parsed schema graph");
    Ok(schema)
}

/// Rebuild a schema from an instance of [`schema_schema`].
pub fn instance_to_schema(instance: &Instance) -> Result<Schema, ParseError> {
    if instance.label_count() != index::UNIT + 1 {
        return Err(Defect::LabelOutOfRange {
            label: instance.label_count(),
        }
        .into());
    }
    let schema = SchemaReader::new(instance)?.read()?;
    check_schema(&schema)?;
    Ok(schema)
}

struct SchemaReader<'i> {
    instance: &'i Instance,
    permutation: Vec<usize>,
    components: HashMap<usize, Vec<usize>>,
    options: HashMap<usize, Vec<usize>>,
    memo: HashMap<(usize, usize), TypeRef>,
    open: HashSet<(usize, usize)>,
    current: String,
}

impl<'i> SchemaReader<'i> {
    fn new(instance: &'i Instance) -> Result<Self, ParseError> {
        let mut keys = Vec::new();
        for (storage, element) in instance.elements(index::LABEL).iter().enumerate() {
            let record = record(element, index::LABEL, storage)?;
            keys.push(iri_component(record, ns::KEY, index::LABEL, storage)?);
        }
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        let mut permutation = vec![0; keys.len()];
        for (canonical, &storage) in order.iter().enumerate() {
            permutation[storage] = canonical;
        }

        Ok(Self {
            instance,
            permutation,
            components: group_by_source(instance, index::COMPONENT, index::PRODUCT)?,
            options: group_by_source(instance, index::OPTION, index::COPRODUCT)?,
            memo: HashMap::new(),
            open: HashSet::new(),
            current: String::new(),
        })
    }

    fn read(mut self) -> Result<Schema, ParseError> {
        let instance = self.instance;
        let mut labels = Vec::new();
        for (storage, element) in instance.elements(index::LABEL).iter().enumerate() {
            let record = record(element, index::LABEL, storage)?;
            let key = iri_component(record, ns::KEY, index::LABEL, storage)?;
            let value = variant_component(record, ns::VALUE, index::LABEL, storage)?;
            self.current = key.clone();
            let ty = self.value_type(value, index::LABEL, storage)?;
            labels.push((self.permutation[storage], apg_core::Label::new(key, ty)));
        }
        labels.sort_by_key(|(canonical, _)| *canonical);
        Ok(labels.into_iter().map(|(_, label)| label).collect())
    }

    /// Type designated by a value coproduct found in element `at` of
    /// bootstrap label `owner`.
    fn value_type(&mut self, value: &Variant, owner: usize, at: usize) -> Result<TypeRef, ParseError> {
        match *value.value {
            Value::Pointer(target) => self.element_type(target),
            _ => Err(Defect::SchemaElement {
                label: owner,
                index: at,
            }
            .into()),
        }
    }

    fn element_type(&mut self, target: Pointer) -> Result<TypeRef, ParseError> {
        let slot = (target.label, target.index);
        if let Some(ty) = self.memo.get(&slot) {
            return Ok(Arc::clone(ty));
        }
        let malformed = Defect::SchemaElement {
            label: target.label,
            index: target.index,
        };
        let instance = self.instance;
        let element = instance.resolve(target).ok_or_else(|| malformed.clone())?;

        let ty = match target.label {
            index::UNIT => Type::unit(),
            index::IRI => Type::iri(),
            index::LITERAL => {
                let record = record(element, target.label, target.index)?;
                Type::literal(iri_component(record, ns::DATATYPE, target.label, target.index)?)
            }
            index::REFERENCE => {
                let record = record(element, target.label, target.index)?;
                let label = match record.get(ns::VALUE) {
                    Some(Value::Pointer(p)) if p.label == index::LABEL => {
                        self.permutation.get(p.index).copied()
                    }
                    _ => None,
                };
                Type::reference(label.ok_or(malformed)?)
            }
            index::PRODUCT | index::COPRODUCT => {
                let kind = if target.label == index::PRODUCT {
                    TypeKind::Product
                } else {
                    TypeKind::Coproduct
                };
                if !self.open.insert(slot) {
                    return Err(CompileError::CyclicType {
                        label: self.current.clone(),
                        kind,
                    }
                    .into());
                }
                let members = self.members(kind, target.index)?;
                self.open.remove(&slot);
                match kind {
                    TypeKind::Product => Type::product(members),
                    _ => Type::coproduct(members),
                }
            }
            _ => return Err(malformed.into()),
        };

        self.memo.insert(slot, Arc::clone(&ty));
        Ok(ty)
    }

    /// Members whose `source` is the given product or coproduct element,
    /// sorted by key.
    fn members(&mut self, kind: TypeKind, source: usize) -> Result<Vec<(String, TypeRef)>, ParseError> {
        let (label, grouped) = match kind {
            TypeKind::Product => (index::COMPONENT, &self.components),
            _ => (index::OPTION, &self.options),
        };
        let indices = grouped.get(&source).cloned().unwrap_or_default();
        let instance = self.instance;

        let mut members = Vec::with_capacity(indices.len());
        for at in indices {
            let element = instance
                .elements(label)
                .get(at)
                .ok_or(Defect::SchemaElement { label, index: at })?;
            let record = record(element, label, at)?;
            let key = iri_component(record, ns::KEY, label, at)?;
            let value = variant_component(record, ns::VALUE, label, at)?;
            members.push((key, self.value_type(value, label, at)?));
        }
        members.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(members)
    }
}

/// Element indices of `label` grouped by the index their `source` points
/// at in `target`.
fn group_by_source(
    instance: &Instance,
    label: usize,
    target: usize,
) -> Result<HashMap<usize, Vec<usize>>, Defect> {
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for (at, element) in instance.elements(label).iter().enumerate() {
        match record(element, label, at)?.get(ns::SOURCE) {
            Some(Value::Pointer(source)) if source.label == target => {
                groups.entry(source.index).or_default().push(at);
            }
            _ => return Err(Defect::SchemaElement { label, index: at }),
        }
    }
    Ok(groups)
}

fn record(element: &Value, label: usize, index: usize) -> Result<&Record, Defect> {
    match element {
        Value::Record(record) => Ok(record),
        _ => Err(Defect::SchemaElement { label, index }),
    }
}

fn iri_component(record: &Record, key: &str, label: usize, index: usize) -> Result<String, Defect> {
    match record.get(key) {
        Some(Value::NamedNode(node)) => Ok(node.as_str().to_string()),
        _ => Err(Defect::SchemaElement { label, index }),
    }
}

fn variant_component<'r>(
    record: &'r Record,
    key: &str,
    label: usize,
    index: usize,
) -> Result<&'r Variant, Defect> {
    match record.get(key) {
        Some(Value::Variant(variant)) => Ok(variant),
        _ => Err(Defect::SchemaElement { label, index }),
    }
}

/// Express a schema as an instance of [`schema_schema`].
///
/// Labels are written in canonical order. Blank nodes are minted as
/// `b0`, `b1`, … in write order, so the result is deterministic.
pub fn schema_to_instance(schema: &Schema) -> Result<Instance, CompileError> {
    check_schema(schema)?;
    let mut writer = SchemaWriter {
        permutation: schema.storage_permutation(),
        elements: vec![Vec::new(); index::UNIT + 1],
        written: HashMap::new(),
        next_node: 0,
        value_keys: VALUE_KEYS.iter().map(|k| k.to_string()).collect(),
    };
    for declared in schema.canonical_order() {
        let label = &schema.labels()[declared];
        let node = writer.fresh();
        let key = parse_iri(&label.key)?;
        let value = writer.value(&label.value)?;
        writer.push(
            index::LABEL,
            Value::Record(Record {
                node,
                keys: keys(&[ns::KEY, ns::VALUE]),
                components: vec![Value::NamedNode(key), value],
            }),
        );
    }
    Ok(Instance::from_elements(writer.elements))
}

struct SchemaWriter {
    permutation: Vec<usize>,
    elements: Vec<Vec<Value>>,
    /// Element written for each type node, by `Arc` address.
    written: HashMap<usize, Pointer>,
    next_node: usize,
    value_keys: Arc<[String]>,
}

impl SchemaWriter {
    fn fresh(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.next_node));
        self.next_node += 1;
        node
    }

    fn push(&mut self, label: usize, value: Value) -> Pointer {
        let elements = &mut self.elements[label];
        elements.push(value);
        Pointer::new(elements.len() - 1, label)
    }

    /// The value coproduct pointing at `ty`'s element.
    fn value(&mut self, ty: &TypeRef) -> Result<Value, CompileError> {
        let node = self.fresh();
        let target = self.element(ty)?;
        let option = match **ty {
            Type::Unit => ns::UNIT,
            Type::Iri => ns::IRI,
            Type::Literal { .. } => ns::LITERAL,
            Type::Product { .. } => ns::PRODUCT,
            Type::Coproduct { .. } => ns::COPRODUCT,
            Type::Reference { .. } => ns::REFERENCE,
        };
        let index = VALUE_KEYS
            .binary_search(&option)
            .map_err(|_| CompileError::UnregisteredType { kind: ty.kind() })?;
        Ok(Value::Variant(Variant {
            node,
            keys: Arc::clone(&self.value_keys),
            index,
            value: Box::new(Value::Pointer(target)),
        }))
    }

    fn element(&mut self, ty: &TypeRef) -> Result<Pointer, CompileError> {
        let address = Arc::as_ptr(ty) as usize;
        if let Some(&pointer) = self.written.get(&address) {
            return Ok(pointer);
        }
        let node = self.fresh();
        let pointer = match &**ty {
            Type::Unit => self.push(index::UNIT, Value::BlankNode(node)),
            Type::Iri => self.push(index::IRI, Value::BlankNode(node)),
            Type::Literal { datatype } => {
                let datatype = parse_iri(datatype)?;
                self.push(
                    index::LITERAL,
                    Value::Record(Record {
                        node,
                        keys: keys(&[ns::DATATYPE]),
                        components: vec![Value::NamedNode(datatype)],
                    }),
                )
            }
            Type::Reference { value } => {
                let count = self.permutation.len();
                let target = self.permutation.get(*value).copied().ok_or_else(|| {
                    CompileError::ReferenceOutOfRange {
                        label: String::new(),
                        target: *value,
                        count,
                    }
                })?;
                self.push(
                    index::REFERENCE,
                    Value::Record(Record {
                        node,
                        keys: keys(&[ns::VALUE]),
                        components: vec![Value::Pointer(Pointer::new(target, index::LABEL))],
                    }),
                )
            }
            Type::Product { components: members } | Type::Coproduct { options: members } => {
                let (label, member_label) = match **ty {
                    Type::Product { .. } => (index::PRODUCT, index::COMPONENT),
                    _ => (index::COPRODUCT, index::OPTION),
                };
                let source = self.push(label, Value::BlankNode(node));
                self.written.insert(address, source);
                for member in members {
                    let node = self.fresh();
                    let key = parse_iri(&member.key)?;
                    let value = self.value(&member.value)?;
                    self.push(
                        member_label,
                        Value::Record(Record {
                            node,
                            keys: keys(&[ns::KEY, ns::SOURCE, ns::VALUE]),
                            components: vec![Value::NamedNode(key), Value::Pointer(source), value],
                        }),
                    );
                }
                source
            }
        };
        self.written.insert(address, pointer);
        Ok(pointer)
    }
}

fn keys(keys: &[&str]) -> Arc<[String]> {
    keys.iter().map(|k| k.to_string()).collect()
}

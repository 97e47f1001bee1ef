//! # Decoded Values and Instances
//!
//! A [`Value`] is one decoded datum; an [`Instance`] holds, per schema
//! label, the append-only sequence of values decoded for that label.
//!
//! Records and variants remember the blank node they were decoded from so
//! that serialization reproduces the original graph. Their key lists are the
//! canonical (sorted) member keys of their type and are shared between all
//! values of that type.
//!
//! ## Placeholders
//!
//! While decoding a cycle, a reference back to a value that is still under
//! construction cannot be a [`Pointer`] yet: the index it will occupy is
//! unknown. The decoder stores a [`Placeholder`] leaf instead and rewrites it
//! with [`Value::substitute_placeholder`] once the index is known. A finished
//! instance never contains placeholders; [`Instance::check_integrity`]
//! verifies it.

use std::sync::Arc;

use oxrdf::{BlankNode, Literal, NamedNode};
use serde_json::json;
use uuid::Uuid;

use crate::error::ModelError;
use crate::types::Schema;

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An `iri`-typed value.
    NamedNode(NamedNode),
    /// A `literal`-typed value.
    Literal(Literal),
    /// A `unit`-typed value; only its identity is meaningful.
    BlankNode(BlankNode),
    /// A `product`-typed value.
    Record(Record),
    /// A `coproduct`-typed value.
    Variant(Variant),
    /// A `reference`-typed value.
    Pointer(Pointer),
    /// A not-yet-resolvable self-reference. Only exists during decoding.
    Placeholder(Placeholder),
}

/// A product instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Node the record was decoded from.
    pub node: BlankNode,
    /// Canonical (sorted) component keys.
    pub keys: Arc<[String]>,
    /// Component values, aligned with `keys`.
    pub components: Vec<Value>,
}

impl Record {
    /// Component value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let index = self.keys.binary_search_by(|k| k.as_str().cmp(key)).ok()?;
        self.components.get(index)
    }
}

/// A coproduct instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Node the variant was decoded from.
    pub node: BlankNode,
    /// Canonical (sorted) option keys.
    pub keys: Arc<[String]>,
    /// Position of the selected option in `keys`.
    pub index: usize,
    /// Value of the selected option.
    pub value: Box<Value>,
}

impl Variant {
    /// Key of the selected option.
    pub fn key(&self) -> Option<&str> {
        self.keys.get(self.index).map(String::as_str)
    }
}

/// The `index`-th element stored under label `label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    /// Element index within the label's sequence.
    pub index: usize,
    /// Label index within the schema.
    pub label: usize,
}

impl Pointer {
    /// Create a pointer.
    pub fn new(index: usize, label: usize) -> Self {
        Self { index, label }
    }
}

/// Session-unique marker for a reference to a value still under
/// construction at a given decoder stack depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder {
    /// Token of the decode session that minted it.
    pub session: Uuid,
    /// Stack depth of the frame being referred back to.
    pub depth: usize,
}

impl Value {
    /// Node identity of a record, variant, or unit value.
    pub fn node(&self) -> Option<&BlankNode> {
        match self {
            Self::Record(record) => Some(&record.node),
            Self::Variant(variant) => Some(&variant.node),
            Self::BlankNode(node) => Some(node),
            Self::NamedNode(_) | Self::Literal(_) | Self::Pointer(_) | Self::Placeholder(_) => None,
        }
    }

    /// Visit every leaf (non-record, non-variant value) depth-first.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Value)) {
        match self {
            Self::Record(record) => {
                for component in &record.components {
                    component.for_each_leaf(f);
                }
            }
            Self::Variant(variant) => variant.value.for_each_leaf(f),
            leaf => f(leaf),
        }
    }

    /// Rewrite every leaf in place, depth-first.
    pub fn rewrite_leaves(&mut self, f: &mut impl FnMut(&mut Value)) {
        match self {
            Self::Record(record) => {
                for component in &mut record.components {
                    component.rewrite_leaves(f);
                }
            }
            Self::Variant(variant) => variant.value.rewrite_leaves(f),
            leaf => f(leaf),
        }
    }

    /// Replace every leaf equal to `placeholder` with `pointer`.
    /// Returns the number of leaves replaced.
    pub fn substitute_placeholder(&mut self, placeholder: &Placeholder, pointer: Pointer) -> usize {
        let mut replaced = 0;
        self.rewrite_leaves(&mut |leaf| {
            if matches!(leaf, Value::Placeholder(p) if p == placeholder) {
                *leaf = Value::Pointer(pointer);
                replaced += 1;
            }
        });
        replaced
    }

    /// JSON view of the value, for display.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::NamedNode(node) => json!({ "iri": node.as_str() }),
            Self::Literal(literal) => {
                let mut object = json!({
                    "literal": literal.value(),
                    "datatype": literal.datatype().as_str(),
                });
                if let Some(language) = literal.language() {
                    object["language"] = json!(language);
                }
                object
            }
            Self::BlankNode(node) => json!({ "node": node.to_string() }),
            Self::Record(record) => {
                let components: serde_json::Map<String, serde_json::Value> = record
                    .keys
                    .iter()
                    .zip(&record.components)
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect();
                json!({ "node": record.node.to_string(), "components": components })
            }
            Self::Variant(variant) => json!({
                "node": variant.node.to_string(),
                "option": variant.key(),
                "value": variant.value.to_json(),
            }),
            Self::Pointer(pointer) => json!({
                "pointer": { "label": pointer.label, "index": pointer.index }
            }),
            Self::Placeholder(placeholder) => json!({ "placeholder": placeholder.depth }),
        }
    }
}

/// Decoded data: one ordered value sequence per schema label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instance {
    labels: Vec<Vec<Value>>,
}

impl Instance {
    /// An empty instance with `label_count` empty sequences.
    pub fn new(label_count: usize) -> Self {
        Self {
            labels: vec![Vec::new(); label_count],
        }
    }

    /// An instance from pre-built sequences, one per label.
    pub fn from_elements(labels: Vec<Vec<Value>>) -> Self {
        Self { labels }
    }

    /// Number of labels.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Elements stored under a label; empty for unknown labels.
    pub fn elements(&self, label: usize) -> &[Value] {
        self.labels.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The element a pointer designates.
    pub fn resolve(&self, pointer: Pointer) -> Option<&Value> {
        self.labels.get(pointer.label)?.get(pointer.index)
    }

    /// Append a value to a label's sequence, returning its pointer.
    /// Returns `None` if the label does not exist.
    pub fn push(&mut self, label: usize, value: Value) -> Option<Pointer> {
        let elements = self.labels.get_mut(label)?;
        elements.push(value);
        Some(Pointer::new(elements.len() - 1, label))
    }

    /// Mutable access to an element, used to resolve placeholders before
    /// the instance is handed out.
    pub fn element_mut(&mut self, pointer: Pointer) -> Option<&mut Value> {
        self.labels.get_mut(pointer.label)?.get_mut(pointer.index)
    }

    /// Iterate `(label index, elements)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Value])> {
        self.labels.iter().map(Vec::as_slice).enumerate()
    }

    /// Consume into the per-label sequences.
    pub fn into_inner(self) -> Vec<Vec<Value>> {
        self.labels
    }

    /// Verify that no pointer dangles and no placeholder remains.
    pub fn check_integrity(&self) -> Result<(), ModelError> {
        let count = self.labels.len();
        for (label, elements) in self.iter() {
            for (index, element) in elements.iter().enumerate() {
                let mut error = None;
                element.for_each_leaf(&mut |leaf| {
                    if error.is_some() {
                        return;
                    }
                    match leaf {
                        Value::Pointer(pointer) => match self.labels.get(pointer.label) {
                            None => {
                                error = Some(ModelError::LabelOutOfRange {
                                    label: pointer.label,
                                    count,
                                });
                            }
                            Some(target) if pointer.index >= target.len() => {
                                error = Some(ModelError::DanglingPointer {
                                    label: pointer.label,
                                    index: pointer.index,
                                    len: target.len(),
                                });
                            }
                            Some(_) => {}
                        },
                        Value::Placeholder(placeholder) => {
                            error = Some(ModelError::PlaceholderLeak {
                                label,
                                index,
                                depth: placeholder.depth,
                            });
                        }
                        _ => {}
                    }
                });
                if let Some(error) = error {
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// JSON view keyed by label key.
    pub fn to_json(&self, schema: &Schema) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (label, elements) in self.iter() {
            let key = schema
                .get(label)
                .map(|l| l.key.clone())
                .unwrap_or_else(|| label.to_string());
            let values: Vec<serde_json::Value> = elements.iter().map(Value::to_json).collect();
            object.insert(key, serde_json::Value::Array(values));
        }
        serde_json::Value::Object(object)
    }
}

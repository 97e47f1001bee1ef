//! # Type Registry
//!
//! Assigns every distinct content type node (unit, iri, literal, product,
//! coproduct) an opaque id `_:t{n}`, and freezes the canonical (sorted)
//! member keys of products and coproducts when their id is minted.
//!
//! ## Identity
//!
//! Nodes are interned by `Arc` pointer, never by structural equality: two
//! equal but separately built literal types get two ids, while one `Arc`
//! reached from several places gets one. References carry no id; they
//! compile to the root shape of their target label.
//!
//! ## Order
//!
//! Ids follow a pre-order walk over the labels in declared order, then over
//! each type's members in declared (not canonical) order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use apg_core::{Schema, Type, TypeRef};
use apg_shex::ShapeLabel;

use crate::shapes::label_shape;

/// Registry id of a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    /// Position in minting order.
    pub fn index(&self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Shape label the compiler declares this type under.
    pub fn shape(&self) -> ShapeLabel {
        ShapeLabel::new(self.to_string())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:t{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    ty: TypeRef,
    canonical_keys: Option<Arc<[String]>>,
}

/// Ids and canonical member keys for one schema.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: Vec<Entry>,
    ids: HashMap<usize, TypeId>,
}

/// Identity of a type node. Entries keep every registered node alive, so
/// addresses are not reused while the registry exists.
fn address(ty: &TypeRef) -> usize {
    Arc::as_ptr(ty) as usize
}

impl TypeRegistry {
    /// Walk a schema and assign ids.
    pub fn assign(schema: &Schema) -> Self {
        let mut registry = Self::default();
        for label in schema.labels() {
            registry.visit(&label.value);
        }
        registry
    }

    fn visit(&mut self, ty: &TypeRef) {
        if matches!(**ty, Type::Reference { .. }) || self.ids.contains_key(&address(ty)) {
            return;
        }
        let id = TypeId(self.entries.len());
        self.ids.insert(address(ty), id);
        self.entries.push(Entry {
            ty: Arc::clone(ty),
            canonical_keys: ty.canonical_keys().map(Arc::from),
        });
        if let Some(members) = ty.members() {
            for member in members {
                self.visit(&member.value);
            }
        }
    }

    /// Id of a content type node; `None` for references and foreign nodes.
    pub fn id(&self, ty: &TypeRef) -> Option<TypeId> {
        self.ids.get(&address(ty)).copied()
    }

    /// Canonical member keys of a product or coproduct.
    pub fn canonical_keys(&self, id: TypeId) -> Option<&Arc<[String]>> {
        self.entries.get(id.0)?.canonical_keys.as_ref()
    }

    /// The type registered under an id.
    pub fn get(&self, id: TypeId) -> Option<&TypeRef> {
        self.entries.get(id.0).map(|entry| &entry.ty)
    }

    /// Shape a value of this type is checked against: the target label's
    /// root shape for references, the type's own shape otherwise.
    pub fn shape_of(&self, ty: &TypeRef) -> Option<ShapeLabel> {
        match **ty {
            Type::Reference { value } => Some(label_shape(value)),
            _ => self.id(ty).map(|id| id.shape()),
        }
    }

    /// Registered types in minting order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeRef)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (TypeId(index), &entry.ty))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

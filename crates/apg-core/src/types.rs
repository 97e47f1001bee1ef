//! # Schema Types
//!
//! The algebraic schema language: unit, IRI, literal, labeled product,
//! labeled coproduct, and references to top-level labels.
//!
//! ## Identity
//!
//! Type nodes are immutable and held behind [`TypeRef`] (`Arc<Type>`).
//! Sharing an `Arc` is how a schema says "these positions have the *same*
//! type"; the registry interns by pointer identity, never by structural
//! equality. `PartialEq` on `Type` is structural and is meant for tests and
//! comparisons across schemas, not for interning.
//!
//! ## Serialization
//!
//! `Schema` (de)serializes as a JSON array of `{ "key", "value" }` labels,
//! types tagged by `"type"`: `{"type": "product", "components": [...]}`,
//! `{"type": "reference", "value": 0}`. Deserialization does not restore
//! sharing; every node read from JSON is its own `Arc`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared handle to an immutable type node.
pub type TypeRef = Arc<Type>;

/// A type in the schema language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Type {
    /// A blank node with no content.
    Unit,
    /// Any named node.
    Iri,
    /// A literal of exactly this datatype.
    Literal {
        /// Datatype IRI.
        datatype: String,
    },
    /// A blank node with one edge per component.
    Product {
        /// Components in declared order.
        components: Vec<Member>,
    },
    /// A blank node with exactly one edge, chosen among the options.
    Coproduct {
        /// Options in declared order.
        options: Vec<Member>,
    },
    /// A value of the top-level label at this index.
    Reference {
        /// Index of the target label in the schema.
        value: usize,
    },
}

/// Discriminant of [`Type`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// [`Type::Unit`].
    Unit,
    /// [`Type::Iri`].
    Iri,
    /// [`Type::Literal`].
    Literal,
    /// [`Type::Product`].
    Product,
    /// [`Type::Coproduct`].
    Coproduct,
    /// [`Type::Reference`].
    Reference,
}

impl TypeKind {
    /// Returns the lowercase kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Iri => "iri",
            Self::Literal => "literal",
            Self::Product => "product",
            Self::Coproduct => "coproduct",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed member of a product (component) or coproduct (option).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Predicate IRI the member is stored under.
    pub key: String,
    /// Member type.
    pub value: TypeRef,
}

impl Member {
    /// Create a member.
    pub fn new(key: impl Into<String>, value: TypeRef) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl Type {
    /// A fresh unit type node.
    pub fn unit() -> TypeRef {
        Arc::new(Self::Unit)
    }

    /// A fresh IRI type node.
    pub fn iri() -> TypeRef {
        Arc::new(Self::Iri)
    }

    /// A fresh literal type node.
    pub fn literal(datatype: impl Into<String>) -> TypeRef {
        Arc::new(Self::Literal {
            datatype: datatype.into(),
        })
    }

    /// A fresh product type node; components keep the given order.
    pub fn product<K: Into<String>>(components: impl IntoIterator<Item = (K, TypeRef)>) -> TypeRef {
        Arc::new(Self::Product {
            components: components
                .into_iter()
                .map(|(key, value)| Member::new(key, value))
                .collect(),
        })
    }

    /// A fresh coproduct type node; options keep the given order.
    pub fn coproduct<K: Into<String>>(options: impl IntoIterator<Item = (K, TypeRef)>) -> TypeRef {
        Arc::new(Self::Coproduct {
            options: options
                .into_iter()
                .map(|(key, value)| Member::new(key, value))
                .collect(),
        })
    }

    /// A fresh reference to the label at `index`.
    pub fn reference(index: usize) -> TypeRef {
        Arc::new(Self::Reference { value: index })
    }

    /// The kind of this type.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Unit => TypeKind::Unit,
            Self::Iri => TypeKind::Iri,
            Self::Literal { .. } => TypeKind::Literal,
            Self::Product { .. } => TypeKind::Product,
            Self::Coproduct { .. } => TypeKind::Coproduct,
            Self::Reference { .. } => TypeKind::Reference,
        }
    }

    /// Components of a product or options of a coproduct, in declared order.
    pub fn members(&self) -> Option<&[Member]> {
        match self {
            Self::Product { components } => Some(components),
            Self::Coproduct { options } => Some(options),
            Self::Unit | Self::Iri | Self::Literal { .. } | Self::Reference { .. } => None,
        }
    }

    /// Member keys sorted lexicographically (canonical member order).
    pub fn canonical_keys(&self) -> Option<Vec<String>> {
        self.members().map(|members| {
            let mut keys: Vec<String> = members.iter().map(|m| m.key.clone()).collect();
            keys.sort();
            keys
        })
    }
}

/// A named top-level type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label IRI; instances carry it as their `rdf:type`.
    pub key: String,
    /// Label type.
    pub value: TypeRef,
}

impl Label {
    /// Create a label.
    pub fn new(key: impl Into<String>, value: TypeRef) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// An ordered list of labels.
///
/// Declared order addresses references. Canonical *storage* order, used when
/// a schema is persisted as graph data, is lexicographic by key; see
/// [`Schema::storage_permutation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    labels: Vec<Label>,
}

impl Schema {
    /// Create a schema from labels in declared order.
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Labels in declared order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Label at a declared index.
    pub fn get(&self, index: usize) -> Option<&Label> {
        self.labels.get(index)
    }

    /// Declared index of the label with this key.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.labels.iter().position(|label| label.key == key)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the schema has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Declared label indices in canonical (key-sorted) order.
    pub fn canonical_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.labels.len()).collect();
        order.sort_by(|&a, &b| self.labels[a].key.cmp(&self.labels[b].key));
        order
    }

    /// `permutation[declared] = canonical` position of every label.
    pub fn storage_permutation(&self) -> Vec<usize> {
        let mut permutation = vec![0; self.labels.len()];
        for (canonical, declared) in self.canonical_order().into_iter().enumerate() {
            permutation[declared] = canonical;
        }
        permutation
    }
}

impl FromIterator<Label> for Schema {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

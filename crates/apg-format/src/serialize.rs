//! # Serializer
//!
//! Writes an [`Instance`] back out as triples: `node rdf:type <key>` for
//! every label element, one triple per record component, one triple for a
//! variant's chosen option. Inline records and variants are written where
//! they occur; a pointer is written as the node of the element it
//! designates, which is itself written under its own label.
//!
//! For an instance decoded from a graph that holds exactly the triples the
//! schema accounts for, the output is that graph.

use apg_core::vocab::rdf;
use apg_core::{CanonicalTriples, Instance, Member, Schema, Type, TypeKind, TypeRef, Value};
use oxrdf::{BlankNode, NamedNode, Term, Triple};
use tracing::debug;

use crate::error::SerializeError;

/// Serialize an instance of `schema` to triples, in element order.
pub fn serialize(instance: &Instance, schema: &Schema) -> Result<Vec<Triple>, SerializeError> {
    if instance.label_count() != schema.len() {
        return Err(SerializeError::LabelCount {
            expected: schema.len(),
            found: instance.label_count(),
        });
    }
    let mut writer = Writer {
        instance,
        schema,
        triples: Vec::new(),
        label: String::new(),
    };
    let rdf_type = NamedNode::new_unchecked(rdf::TYPE);
    for (index, elements) in instance.iter() {
        let label = &schema.labels()[index];
        writer.label.clone_from(&label.key);
        let key = named_node(&label.key)?;
        for element in elements {
            let subject = writer.element_node(element, index)?;
            writer.triples.push(Triple::new(subject, rdf_type.clone(), key.clone()));
            writer.write(&label.value, element)?;
        }
    }
    debug!(triples = writer.triples.len(), "serialized instance");
    Ok(writer.triples)
}

/// Serialize in canonical order.
pub fn serialize_canonical(
    instance: &Instance,
    schema: &Schema,
) -> Result<CanonicalTriples, SerializeError> {
    serialize(instance, schema).map(CanonicalTriples::new)
}

struct Writer<'a> {
    instance: &'a Instance,
    schema: &'a Schema,
    triples: Vec<Triple>,
    /// Key of the label being written, for error context.
    label: String,
}

impl Writer<'_> {
    /// Emit the triples of `value` as a value of `ty` and return the term it
    /// appears as in its parent triple.
    fn write(&mut self, ty: &TypeRef, value: &Value) -> Result<Term, SerializeError> {
        match (&**ty, value) {
            (Type::Unit, Value::BlankNode(node)) => Ok(node.clone().into()),
            (Type::Iri, Value::NamedNode(node)) => Ok(node.clone().into()),
            (Type::Literal { datatype }, Value::Literal(literal)) => {
                if literal.datatype().as_str() != datatype {
                    return Err(SerializeError::Datatype {
                        label: self.label.clone(),
                        expected: datatype.clone(),
                        found: literal.datatype().as_str().to_string(),
                    });
                }
                Ok(literal.clone().into())
            }
            (Type::Product { components }, Value::Record(record)) => {
                let members = self.sorted(components, &record.keys, TypeKind::Product)?;
                if members.len() != record.components.len() {
                    return Err(self.key_mismatch(TypeKind::Product));
                }
                for (member, component) in members.into_iter().zip(&record.components) {
                    let object = self.write(&member.value, component)?;
                    self.triples.push(Triple::new(
                        record.node.clone(),
                        named_node(&member.key)?,
                        object,
                    ));
                }
                Ok(record.node.clone().into())
            }
            (Type::Coproduct { options }, Value::Variant(variant)) => {
                let members = self.sorted(options, &variant.keys, TypeKind::Coproduct)?;
                let member = members
                    .get(variant.index)
                    .copied()
                    .ok_or_else(|| self.key_mismatch(TypeKind::Coproduct))?;
                let object = self.write(&member.value, &variant.value)?;
                self.triples.push(Triple::new(
                    variant.node.clone(),
                    named_node(&member.key)?,
                    object,
                ));
                Ok(variant.node.clone().into())
            }
            (Type::Reference { value: target }, Value::Pointer(pointer)) => {
                let resolved = (pointer.label == *target)
                    .then(|| self.instance.resolve(*pointer))
                    .flatten()
                    .ok_or_else(|| SerializeError::UnresolvedPointer {
                        label: self.label.clone(),
                        target: pointer.label,
                        index: pointer.index,
                    })?;
                Ok(self.element_node(resolved, pointer.label)?.into())
            }
            (ty, value) => Err(SerializeError::TypeMismatch {
                label: self.label.clone(),
                kind: ty.kind(),
                found: value_kind(value),
            }),
        }
    }

    /// Members in the order of `keys`, which must be the type's canonical
    /// keys.
    fn sorted<'t>(
        &self,
        members: &'t [Member],
        keys: &[String],
        kind: TypeKind,
    ) -> Result<Vec<&'t Member>, SerializeError> {
        let mut sorted: Vec<&Member> = members.iter().collect();
        sorted.sort_by(|a, b| a.key.cmp(&b.key));
        if sorted.iter().map(|m| &m.key).eq(keys.iter()) {
            Ok(sorted)
        } else {
            Err(self.key_mismatch(kind))
        }
    }

    fn key_mismatch(&self, kind: TypeKind) -> SerializeError {
        SerializeError::KeyMismatch {
            label: self.label.clone(),
            kind,
        }
    }

    /// The blank node an element of label `owner` is written under.
    /// Pointers are followed to the element they designate.
    fn element_node(&self, element: &Value, owner: usize) -> Result<BlankNode, SerializeError> {
        let bound = self.instance.iter().map(|(_, e)| e.len()).sum::<usize>() + 1;
        let mut current = element;
        let mut owner = owner;
        for _ in 0..bound {
            match current {
                Value::BlankNode(node) => return Ok(node.clone()),
                Value::Record(record) => return Ok(record.node.clone()),
                Value::Variant(variant) => return Ok(variant.node.clone()),
                Value::Pointer(pointer) => {
                    owner = pointer.label;
                    current = self.instance.resolve(*pointer).ok_or_else(|| {
                        SerializeError::UnresolvedPointer {
                            label: self.label.clone(),
                            target: pointer.label,
                            index: pointer.index,
                        }
                    })?;
                }
                other => {
                    return Err(SerializeError::TypeMismatch {
                        label: self.label.clone(),
                        kind: self
                            .schema
                            .get(owner)
                            .map_or(TypeKind::Reference, |l| l.value.kind()),
                        found: value_kind(other),
                    })
                }
            }
        }
        Err(SerializeError::PointerCycle {
            label: self.label.clone(),
        })
    }
}

fn named_node(iri: &str) -> Result<NamedNode, SerializeError> {
    NamedNode::new(iri).map_err(|_| SerializeError::InvalidIri(iri.to_string()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::NamedNode(_) => "named node",
        Value::Literal(_) => "literal",
        Value::BlankNode(_) => "blank node",
        Value::Record(_) => "record",
        Value::Variant(_) => "variant",
        Value::Pointer(_) => "pointer",
        Value::Placeholder(_) => "placeholder",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apg_core::vocab::xsd;
    use apg_core::{Label, Pointer, Record, Variant};
    use oxrdf::Literal;
    use std::sync::Arc;

    const PERSON: &str = "http://example.com/Person";
    const NAME: &str = "http://example.com/name";
    const KNOWS: &str = "http://example.com/knows";

    fn person_schema() -> Schema {
        Schema::new(vec![Label::new(
            PERSON,
            Type::product([
                (NAME, Type::literal(xsd::STRING)),
                (KNOWS, Type::reference(0)),
            ]),
        )])
    }

    fn person(node: &str, name: &str, knows: usize) -> Value {
        Value::Record(Record {
            node: BlankNode::new_unchecked(node),
            keys: Arc::from(vec![KNOWS.to_string(), NAME.to_string()]),
            components: vec![
                Value::Pointer(Pointer::new(knows, 0)),
                Value::Literal(Literal::new_simple_literal(name)),
            ],
        })
    }

    #[test]
    fn test_self_loop_serializes() {
        let instance = Instance::from_elements(vec![vec![person("a", "A", 0)]]);
        let triples = serialize_canonical(&instance, &person_schema()).unwrap();
        assert_eq!(
            triples.as_str(),
            "_:a <http://example.com/knows> _:a .\n\
             _:a <http://example.com/name> \"A\" .\n\
             _:a <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Person> .\n"
        );
    }

    #[test]
    fn test_dangling_pointer_rejected() {
        let instance = Instance::from_elements(vec![vec![person("a", "A", 3)]]);
        assert!(matches!(
            serialize(&instance, &person_schema()),
            Err(SerializeError::UnresolvedPointer { index: 3, .. })
        ));
    }

    #[test]
    fn test_key_mismatch_rejected() {
        let mut element = person("a", "A", 0);
        if let Value::Record(record) = &mut element {
            record.keys = Arc::from(vec![NAME.to_string(), KNOWS.to_string()]);
        }
        let instance = Instance::from_elements(vec![vec![element]]);
        assert!(matches!(
            serialize(&instance, &person_schema()),
            Err(SerializeError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_variant_writes_chosen_option() {
        let schema = Schema::new(vec![Label::new(
            "http://example.com/Shape",
            Type::coproduct([
                ("http://example.com/square", Type::unit()),
                ("http://example.com/circle", Type::iri()),
            ]),
        )]);
        let instance = Instance::from_elements(vec![vec![Value::Variant(Variant {
            node: BlankNode::new_unchecked("s"),
            keys: Arc::from(vec![
                "http://example.com/circle".to_string(),
                "http://example.com/square".to_string(),
            ]),
            index: 0,
            value: Box::new(Value::NamedNode(NamedNode::new_unchecked(
                "http://example.com/c",
            ))),
        })]]);
        let triples = serialize(&instance, &schema).unwrap();
        assert_eq!(triples.len(), 2);
        assert!(triples.iter().any(|t| t.predicate.as_str() == "http://example.com/circle"));
    }

    #[test]
    fn test_label_count_mismatch() {
        let instance = Instance::new(2);
        assert_eq!(
            serialize(&instance, &person_schema()),
            Err(SerializeError::LabelCount {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_wrong_value_kind() {
        let instance = Instance::from_elements(vec![vec![Value::BlankNode(
            BlankNode::new_unchecked("a"),
        )]]);
        assert!(matches!(
            serialize(&instance, &person_schema()),
            Err(SerializeError::TypeMismatch {
                kind: TypeKind::Product,
                found: "blank node",
                ..
            })
        ));
    }
}

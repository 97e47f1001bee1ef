//! # Schemas Stored as Graphs
//!
//! Schemas written with the bootstrap schema read back to the same schema,
//! whatever order their labels were stored in.

use std::sync::Arc;

use apg_core::vocab::{ns, xsd};
use apg_core::{Instance, Label, Member, Pointer, Record, Schema, Type, TypeRef, Value, Variant};
use apg_format::schema_schema::index;
use apg_format::{
    instance_to_schema, parse_schema_string, schema_schema, schema_to_instance,
    serialize_schema_string, CompileError, ParseError,
};
use oxrdf::{BlankNode, NamedNode};

/// Helper: the same schema with every member list sorted by key.
fn canonicalize(schema: &Schema) -> Schema {
    fn ty(ty: &TypeRef) -> TypeRef {
        match &**ty {
            Type::Product { components } => Type::product(members(components)),
            Type::Coproduct { options } => Type::coproduct(members(options)),
            _ => Arc::clone(ty),
        }
    }
    fn members(members: &[Member]) -> Vec<(String, TypeRef)> {
        let mut sorted: Vec<(String, TypeRef)> =
            members.iter().map(|m| (m.key.clone(), ty(&m.value))).collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
    }
    schema
        .labels()
        .iter()
        .map(|l| Label::new(l.key.clone(), ty(&l.value)))
        .collect()
}

fn bnode(id: &str) -> BlankNode {
    BlankNode::new_unchecked(id)
}

fn iri(value: &str) -> Value {
    Value::NamedNode(NamedNode::new_unchecked(value))
}

fn keys(keys: &[&str]) -> Arc<[String]> {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Helper: a value coproduct choosing `option` and pointing at `target`.
fn value(node: &str, option: &str, target: Pointer) -> Value {
    let options = keys(&[
        ns::COPRODUCT,
        ns::IRI,
        ns::LITERAL,
        ns::PRODUCT,
        ns::REFERENCE,
        ns::UNIT,
    ]);
    let position = options.iter().position(|k| k == option).unwrap();
    Value::Variant(Variant {
        node: bnode(node),
        keys: options,
        index: position,
        value: Box::new(Value::Pointer(target)),
    })
}

// ---------------------------------------------------------------------------
// Storage order
// ---------------------------------------------------------------------------

#[test]
fn test_dog_stored_before_cat() {
    // Storage: label 0 = Dog, label 1 = Cat. Dog chases Cat, addressed by
    // its storage position 1.
    let mut elements = vec![Vec::new(); index::UNIT + 1];
    elements[index::LABEL] = vec![
        Value::Record(Record {
            node: bnode("dog"),
            keys: keys(&[ns::KEY, ns::VALUE]),
            components: vec![
                iri("http://example.com/Dog"),
                value("dv", ns::PRODUCT, Pointer::new(0, index::PRODUCT)),
            ],
        }),
        Value::Record(Record {
            node: bnode("cat"),
            keys: keys(&[ns::KEY, ns::VALUE]),
            components: vec![
                iri("http://example.com/Cat"),
                value("cv", ns::UNIT, Pointer::new(0, index::UNIT)),
            ],
        }),
    ];
    elements[index::PRODUCT] = vec![Value::BlankNode(bnode("p"))];
    elements[index::UNIT] = vec![Value::BlankNode(bnode("u"))];
    elements[index::COMPONENT] = vec![Value::Record(Record {
        node: bnode("c"),
        keys: keys(&[ns::KEY, ns::SOURCE, ns::VALUE]),
        components: vec![
            iri("http://example.com/chases"),
            Value::Pointer(Pointer::new(0, index::PRODUCT)),
            value("chv", ns::REFERENCE, Pointer::new(0, index::REFERENCE)),
        ],
    })];
    elements[index::REFERENCE] = vec![Value::Record(Record {
        node: bnode("r"),
        keys: keys(&[ns::VALUE]),
        components: vec![Value::Pointer(Pointer::new(1, index::LABEL))],
    })];
    let instance = Instance::from_elements(elements);
    assert!(instance.check_integrity().is_ok());

    let schema = instance_to_schema(&instance).unwrap();
    assert_eq!(
        schema,
        Schema::new(vec![
            Label::new("http://example.com/Cat", Type::unit()),
            Label::new(
                "http://example.com/Dog",
                Type::product([("http://example.com/chases", Type::reference(0))]),
            ),
        ])
    );
}

// ---------------------------------------------------------------------------
// Round trips through N-Triples
// ---------------------------------------------------------------------------

#[test]
fn test_schema_graph_round_trip_keeps_sharing() {
    let name = Type::literal(xsd::STRING);
    let schema = Schema::new(vec![
        Label::new(
            "http://example.com/Cat",
            Type::product([
                ("http://example.com/name", Arc::clone(&name)),
                ("http://example.com/nickname", Arc::clone(&name)),
            ]),
        ),
        Label::new(
            "http://example.com/Dog",
            Type::product([
                ("http://example.com/chases", Type::reference(0)),
                (
                    "http://example.com/collar",
                    Type::coproduct([
                        ("http://example.com/none", Type::unit()),
                        ("http://example.com/tag", Type::iri()),
                    ]),
                ),
            ]),
        ),
    ]);
    let text = serialize_schema_string(&schema).unwrap();
    let parsed = parse_schema_string(text.as_str()).unwrap();
    assert_eq!(parsed, schema);

    let members = parsed.labels()[0].value.members().unwrap();
    assert!(Arc::ptr_eq(&members[0].value, &members[1].value));
}

#[test]
fn test_declared_order_is_canonicalized() {
    let schema = Schema::new(vec![
        Label::new(
            "http://example.com/Dog",
            Type::product([("http://example.com/chases", Type::reference(1))]),
        ),
        Label::new("http://example.com/Cat", Type::unit()),
    ]);
    let parsed = parse_schema_string(serialize_schema_string(&schema).unwrap().as_str()).unwrap();
    assert_eq!(parsed.labels()[0].key, "http://example.com/Cat");
    assert_eq!(parsed.labels()[1].key, "http://example.com/Dog");
    assert_eq!(
        *parsed.labels()[1].value,
        *Type::product([("http://example.com/chases", Type::reference(0))])
    );
}

#[test]
fn test_bootstrap_describes_itself() {
    let bootstrap = schema_schema();
    let text = serialize_schema_string(&bootstrap).unwrap();
    assert!(text.as_str().contains("<http://underlay.org/ns/label>"));

    let parsed = parse_schema_string(text.as_str()).unwrap();
    assert_eq!(parsed, canonicalize(&bootstrap));

    // The shared value coproduct stays one node.
    let label_value = &parsed.labels()[index::LABEL].value.members().unwrap()[1].value;
    let component_value = &parsed.labels()[index::COMPONENT].value.members().unwrap()[2].value;
    assert!(Arc::ptr_eq(label_value, component_value));

    // Writing the parsed form again is a fixpoint.
    let again = serialize_schema_string(&parsed).unwrap();
    assert_eq!(parse_schema_string(again.as_str()).unwrap(), parsed);
}

#[test]
fn test_serialize_schema_is_deterministic() {
    let schema = schema_schema();
    assert_eq!(
        serialize_schema_string(&schema).unwrap(),
        serialize_schema_string(&schema).unwrap()
    );
    let instance = schema_to_instance(&schema).unwrap();
    assert_eq!(instance.elements(index::LABEL).len(), schema.len());
    assert_eq!(instance.elements(index::COPRODUCT).len(), 1);
}

// ---------------------------------------------------------------------------
// Malformed schema graphs
// ---------------------------------------------------------------------------

#[test]
fn test_duplicate_label_key_in_graph() {
    let mut elements = vec![Vec::new(); index::UNIT + 1];
    elements[index::UNIT] = vec![Value::BlankNode(bnode("u"))];
    elements[index::LABEL] = ["a", "b"]
        .iter()
        .map(|node| {
            Value::Record(Record {
                node: bnode(node),
                keys: keys(&[ns::KEY, ns::VALUE]),
                components: vec![
                    iri("http://example.com/Same"),
                    value(&format!("{node}v"), ns::UNIT, Pointer::new(0, index::UNIT)),
                ],
            })
        })
        .collect();
    let error = instance_to_schema(&Instance::from_elements(elements)).unwrap_err();
    assert!(matches!(
        error,
        ParseError::Compile(CompileError::DuplicateLabel { .. })
    ));
}

#[test]
fn test_label_value_with_two_options_is_invalid() {
    let text = "_:l <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://underlay.org/ns/label> .\n\
                _:l <http://underlay.org/ns/key> <http://example.com/A> .\n\
                _:l <http://underlay.org/ns/value> _:v .\n\
                _:v <http://underlay.org/ns/unit> _:u .\n\
                _:v <http://underlay.org/ns/iri> _:i .\n\
                _:u <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://underlay.org/ns/unit> .\n\
                _:i <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://underlay.org/ns/iri> .\n";
    let error = parse_schema_string(text).unwrap_err();
    assert!(!error.is_fatal());
    assert!(error.as_validation().is_some());
}

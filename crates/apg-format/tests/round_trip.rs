//! # Round-Trip Tests
//!
//! A graph that holds exactly the triples a schema accounts for decodes to
//! an instance that serializes back to the same canonical N-Triples.

use apg_core::vocab::xsd;
use apg_core::{CanonicalTriples, Label, Schema, Type, Value};
use apg_format::{parse_string, read_ntriples, serialize_string};
use proptest::prelude::*;

const TYPE: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";

fn people_schema() -> Schema {
    Schema::new(vec![Label::new(
        "http://example.com/Person",
        Type::product([
            ("http://example.com/name", Type::literal(xsd::STRING)),
            ("http://example.com/knows", Type::reference(0)),
        ]),
    )])
}

/// Declared out of key order so canonical positions differ from declared
/// ones.
fn events_schema() -> Schema {
    Schema::new(vec![
        Label::new(
            "http://example.com/Event",
            Type::product([
                ("http://example.com/title", Type::literal(xsd::STRING)),
                ("http://example.com/at", Type::literal(xsd::DATE_TIME)),
                (
                    "http://example.com/where",
                    Type::coproduct([
                        ("http://example.com/venue", Type::reference(1)),
                        ("http://example.com/online", Type::iri()),
                    ]),
                ),
                ("http://example.com/cancelled", Type::unit()),
            ]),
        ),
        Label::new(
            "http://example.com/Place",
            Type::product([("http://example.com/name", Type::literal(xsd::STRING))]),
        ),
    ])
}

/// Helper: canonical form of N-Triples text.
fn canonical(text: &str) -> CanonicalTriples {
    CanonicalTriples::from_graph(&read_ntriples(text).unwrap())
}

fn assert_round_trip(text: &str, schema: &Schema) {
    let instance = parse_string(text, schema).unwrap();
    let written = serialize_string(&instance, schema).unwrap();
    assert_eq!(written, canonical(text));
}

// ---------------------------------------------------------------------------
// Fixed graphs
// ---------------------------------------------------------------------------

#[test]
fn test_round_trip_people() {
    let text = format!(
        "_:a {TYPE} <http://example.com/Person> .\n\
         _:a <http://example.com/name> \"Alice\" .\n\
         _:a <http://example.com/knows> _:b .\n\
         _:b {TYPE} <http://example.com/Person> .\n\
         _:b <http://example.com/name> \"Bob\" .\n\
         _:b <http://example.com/knows> _:a .\n"
    );
    assert_round_trip(&text, &people_schema());
}

#[test]
fn test_round_trip_events_with_coproducts() {
    let text = format!(
        "_:e1 {TYPE} <http://example.com/Event> .\n\
         _:e1 <http://example.com/title> \"Launch\" .\n\
         _:e1 <http://example.com/at> \"2024-05-01T10:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n\
         _:e1 <http://example.com/where> _:w1 .\n\
         _:w1 <http://example.com/venue> _:p .\n\
         _:e1 <http://example.com/cancelled> _:u1 .\n\
         _:e2 {TYPE} <http://example.com/Event> .\n\
         _:e2 <http://example.com/title> \"Stream\" .\n\
         _:e2 <http://example.com/at> \"2024-06-01T18:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n\
         _:e2 <http://example.com/where> _:w2 .\n\
         _:w2 <http://example.com/online> <http://example.com/live> .\n\
         _:e2 <http://example.com/cancelled> _:u2 .\n\
         _:p {TYPE} <http://example.com/Place> .\n\
         _:p <http://example.com/name> \"Hall\" .\n"
    );
    let schema = events_schema();
    assert_round_trip(&text, &schema);

    let instance = parse_string(&text, &schema).unwrap();
    assert_eq!(instance.elements(0).len(), 2);
    assert_eq!(instance.elements(1).len(), 1);

    let keys: Vec<&str> = match &instance.elements(0)[0] {
        Value::Record(record) => record.keys.iter().map(String::as_str).collect(),
        other => panic!("expected record, found {other:?}"),
    };
    assert_eq!(
        keys,
        vec![
            "http://example.com/at",
            "http://example.com/cancelled",
            "http://example.com/title",
            "http://example.com/where",
        ]
    );
}

#[test]
fn test_variant_index_is_canonical_position() {
    let text = format!(
        "_:e {TYPE} <http://example.com/Event> .\n\
         _:e <http://example.com/title> \"Stream\" .\n\
         _:e <http://example.com/at> \"2024-06-01T18:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n\
         _:e <http://example.com/where> _:w .\n\
         _:w <http://example.com/online> <http://example.com/live> .\n\
         _:e <http://example.com/cancelled> _:u .\n"
    );
    let instance = parse_string(&text, &events_schema()).unwrap();
    let Value::Record(event) = &instance.elements(0)[0] else {
        panic!("expected record");
    };
    let Some(Value::Variant(place)) = event.get("http://example.com/where") else {
        panic!("expected variant");
    };
    // `online` is declared second but sorts first.
    assert_eq!(place.index, 0);
    assert_eq!(place.key(), Some("http://example.com/online"));
}

#[test]
fn test_unreferenced_label_subjects_all_decoded() {
    let text = format!(
        "_:p {TYPE} <http://example.com/Place> .\n\
         _:p <http://example.com/name> \"Hall\" .\n\
         _:q {TYPE} <http://example.com/Place> .\n\
         _:q <http://example.com/name> \"Park\" .\n"
    );
    let instance = parse_string(&text, &events_schema()).unwrap();
    assert!(instance.elements(0).is_empty());
    assert_eq!(instance.elements(1).len(), 2);
    assert_round_trip(&text, &events_schema());
}

// ---------------------------------------------------------------------------
// Generated graphs
// ---------------------------------------------------------------------------

/// Helper: N-Triples for `names.len()` people where person `i` knows
/// person `knows[i]`.
fn people_text(names: &[String], knows: &[usize]) -> String {
    let mut text = String::new();
    for (i, (name, target)) in names.iter().zip(knows).enumerate() {
        text.push_str(&format!("_:p{i} {TYPE} <http://example.com/Person> .\n"));
        text.push_str(&format!("_:p{i} <http://example.com/name> \"{name}\" .\n"));
        text.push_str(&format!("_:p{i} <http://example.com/knows> _:p{target} .\n"));
    }
    text
}

fn people() -> impl Strategy<Value = (Vec<String>, Vec<usize>)> {
    (1usize..7).prop_flat_map(|n| {
        (
            proptest::collection::vec("[a-z]{1,8}", n),
            proptest::collection::vec(0..n, n),
        )
    })
}

proptest! {
    #[test]
    fn prop_linked_people_round_trip((names, knows) in people()) {
        let text = people_text(&names, &knows);
        let schema = people_schema();
        let instance = parse_string(&text, &schema).unwrap();

        prop_assert_eq!(instance.elements(0).len(), names.len());
        prop_assert!(instance.check_integrity().is_ok());
        prop_assert_eq!(serialize_string(&instance, &schema).unwrap(), canonical(&text));
    }

    #[test]
    fn prop_decoding_is_deterministic((names, knows) in people()) {
        let text = people_text(&names, &knows);
        let schema = people_schema();
        prop_assert_eq!(
            parse_string(&text, &schema).unwrap(),
            parse_string(&text, &schema).unwrap()
        );
    }
}

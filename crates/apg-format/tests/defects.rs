//! # Engine/Decoder Disagreement
//!
//! Witnesses that claim success but do not fit the compiled shapes are
//! fatal defects, never validation failures. A mock engine wraps the
//! reference engine and tampers with its answers.

use apg_core::vocab::{rdf, xsd};
use apg_core::{Label, Schema, Type};
use apg_format::{
    compile, parse_with_validator, read_ntriples, Defect, ParseError, ParseOptions,
};
use apg_shex::{
    EngineError, ShapeLabel, ShapeValidator, TripleExprSolutions, ValidationFailure, Validator,
    Violation, Witness,
};
use oxrdf::{BlankNode, Graph, Term};

const PERSON: &str = "http://example.com/Person";
const NAME: &str = "http://example.com/name";

fn schema() -> Schema {
    Schema::new(vec![Label::new(
        PERSON,
        Type::product([(NAME, Type::literal(xsd::STRING))]),
    )])
}

fn graph() -> Graph {
    read_ntriples(&format!(
        "_:a <{}> <{PERSON}> .\n_:a <{NAME}> \"A\" .\n",
        rdf::TYPE
    ))
    .unwrap()
}

/// Answers every call with the reference engine's result, passed through
/// `tamper`.
struct Tampering<'a, F> {
    inner: Validator<'a>,
    tamper: F,
}

impl<F> ShapeValidator for Tampering<'_, F>
where
    F: FnMut(Result<Witness, EngineError>) -> Result<Witness, EngineError>,
{
    fn validate(&mut self, node: &Term, shape: &ShapeLabel) -> Result<Witness, EngineError> {
        let result = self.inner.validate(node, shape);
        (self.tamper)(result)
    }
}

fn run<F>(tamper: F) -> Result<apg_core::Instance, ParseError>
where
    F: FnMut(Result<Witness, EngineError>) -> Result<Witness, EngineError> + Send,
{
    let schema = schema();
    let graph = graph();
    let compiled = compile(&schema).unwrap();
    let validator = Tampering {
        inner: Validator::new(compiled.constraints(), &graph),
        tamper,
    };
    parse_with_validator(&graph, &schema, &compiled, validator, &ParseOptions::default())
}

/// The name component's solution inside a Person witness.
fn name_solution(
    witness: &mut Witness,
) -> &mut apg_shex::TripleConstraintSolutions {
    let Witness::ShapeAnd { solutions, .. } = witness else {
        panic!("expected label witness");
    };
    let Witness::ShapeAnd { solutions, .. } = &mut solutions[1] else {
        panic!("expected product witness");
    };
    let Witness::ShapeTest {
        solution: Some(TripleExprSolutions::EachOf(each)),
        ..
    } = &mut solutions[1]
    else {
        panic!("expected product shape test");
    };
    let TripleExprSolutions::TripleConstraint(tc) = &mut each[0].expressions[1] else {
        panic!("expected component solution");
    };
    tc
}

#[test]
fn test_untampered_engine_decodes() {
    let instance = run(|result| result).unwrap();
    assert_eq!(instance.elements(0).len(), 1);
}

#[test]
fn test_wrong_production_label_is_defect() {
    let error = run(|result| {
        let mut witness = result?;
        name_solution(&mut witness).production_label = Some("_:t0-c7".into());
        Ok(witness)
    })
    .unwrap_err();
    assert!(error.is_fatal());
    assert!(matches!(
        error,
        ParseError::Defect(Defect::ProductionLabel { expected, .. }) if expected == "_:t0-c0"
    ));
}

#[test]
fn test_wrong_value_shape_is_defect() {
    let error = run(|result| {
        let mut witness = result?;
        name_solution(&mut witness).value_expr = Some(ShapeLabel::new("_:t9"));
        Ok(witness)
    })
    .unwrap_err();
    assert!(matches!(error, ParseError::Defect(Defect::ValueExpr { .. })));
}

#[test]
fn test_missing_object_witness_is_defect() {
    let error = run(|result| {
        let mut witness = result?;
        name_solution(&mut witness).solutions[0].referenced = None;
        Ok(witness)
    })
    .unwrap_err();
    assert!(matches!(
        error,
        ParseError::Defect(Defect::MissingReferenced { .. })
    ));
}

#[test]
fn test_duplicated_solution_is_defect() {
    let error = run(|result| {
        let mut witness = result?;
        let tc = name_solution(&mut witness);
        let copy = tc.solutions[0].clone();
        tc.solutions.push(copy);
        Ok(witness)
    })
    .unwrap_err();
    assert!(matches!(
        error,
        ParseError::Defect(Defect::SolutionCount { found: 2, .. })
    ));
}

#[test]
fn test_recursion_without_frame_is_defect() {
    let error = run(|_| {
        Ok(Witness::Recursion {
            node: BlankNode::new_unchecked("a").into(),
            shape: ShapeLabel::new("_:l0"),
        })
    })
    .unwrap_err();
    assert!(matches!(
        error,
        ParseError::Defect(Defect::UnexpectedRecursion { .. })
    ));
}

#[test]
fn test_foreign_witness_is_defect() {
    let error = run(|_| {
        Ok(Witness::ShapeTest {
            node: BlankNode::new_unchecked("a").into(),
            shape: ShapeLabel::new("_:l0"),
            solution: None,
        })
    })
    .unwrap_err();
    assert!(matches!(
        error,
        ParseError::Defect(Defect::UnexpectedWitness { found: "ShapeTest", .. })
    ));
}

#[test]
fn test_unknown_shape_is_defect() {
    let error = run(|_| Err(EngineError::UnknownShape(ShapeLabel::new("_:l0")))).unwrap_err();
    assert!(matches!(error, ParseError::Defect(Defect::UnknownShape(_))));
}

#[test]
fn test_engine_failure_stays_reportable() {
    let error = run(|_| {
        Err(ValidationFailure::new(
            ShapeLabel::new("_:l0"),
            BlankNode::new_unchecked("a").into(),
            Violation::NoMatchingOption,
        )
        .into())
    })
    .unwrap_err();
    assert!(!error.is_fatal());
    assert!(error.as_validation().is_some());
}

#[test]
fn test_engine_depth_limit_stays_reportable() {
    let error = run(|_| Err(EngineError::DepthLimitExceeded { limit: 3 })).unwrap_err();
    assert!(!error.is_fatal());
    assert!(matches!(error, ParseError::DepthLimitExceeded { limit: 3 }));
}

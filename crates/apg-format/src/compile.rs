//! # Schema Compiler
//!
//! Turns a [`Schema`] into a [`ConstraintSchema`]: one shape per registered
//! content type (`_:t{n}`, in registry order), then one root shape per
//! label (`_:l{i}`, in declared order).
//!
//! Compilation first checks what the shapes rely on: label keys are unique
//! IRIs, member keys are unique IRIs other than `rdf:type`, literal
//! datatypes are IRIs, references are in range, and no label is defined
//! purely by references back to itself.

use std::collections::HashSet;
use std::sync::Arc;

use apg_core::vocab::rdf;
use apg_core::{Member, Schema, Type, TypeRef};
use apg_shex::{ConstraintSchema, ShapeDecl, ShapeExpr, ShapeLabel};
use oxrdf::NamedNode;
use tracing::debug;

use crate::error::CompileError;
use crate::registry::{TypeId, TypeRegistry};
use crate::shapes::{coproduct, iri, label, label_shape, literal, product, unit};

/// A schema compiled to shapes, with the registry the shapes were named by.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    registry: TypeRegistry,
    constraints: ConstraintSchema,
}

impl CompiledSchema {
    /// Type ids and canonical member keys.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The emitted shapes.
    pub fn constraints(&self) -> &ConstraintSchema {
        &self.constraints
    }

    /// ShExJ rendering of the emitted shapes.
    pub fn to_shexj(&self) -> serde_json::Value {
        self.constraints.to_shexj()
    }
}

/// Compile a schema.
pub fn compile(schema: &Schema) -> Result<CompiledSchema, CompileError> {
    check_schema(schema)?;
    let registry = TypeRegistry::assign(schema);
    let mut constraints = ConstraintSchema::new();

    for (id, ty) in registry.iter() {
        let expr = make_type_shape(&registry, id, ty)?;
        constraints.insert(ShapeDecl {
            id: id.shape(),
            expr,
        });
    }
    for (index, l) in schema.labels().iter().enumerate() {
        let key = parse_iri(&l.key)?;
        let value = value_shape(&registry, &l.value)?;
        constraints.insert_root(ShapeDecl {
            id: label_shape(index),
            expr: label::make_label_shape(key, value),
        });
    }

    debug!(
        labels = schema.len(),
        types = registry.len(),
        shapes = constraints.len(),
        "compiled schema"
    );
    Ok(CompiledSchema {
        registry,
        constraints,
    })
}

fn make_type_shape(
    registry: &TypeRegistry,
    id: TypeId,
    ty: &TypeRef,
) -> Result<ShapeExpr, CompileError> {
    Ok(match &**ty {
        Type::Unit => unit::make_unit_shape(),
        Type::Iri => iri::make_iri_shape(),
        Type::Literal { datatype } => literal::make_literal_shape(parse_iri(datatype)?),
        Type::Product { components } => {
            product::make_product_shape(id, member_shapes(registry, components)?)
        }
        Type::Coproduct { options } => {
            coproduct::make_coproduct_shape(id, member_shapes(registry, options)?)
        }
        Type::Reference { .. } => {
            return Err(CompileError::UnregisteredType { kind: ty.kind() });
        }
    })
}

fn member_shapes(
    registry: &TypeRegistry,
    members: &[Member],
) -> Result<Vec<(NamedNode, ShapeLabel)>, CompileError> {
    members
        .iter()
        .map(|m| -> Result<_, CompileError> {
            Ok((parse_iri(&m.key)?, value_shape(registry, &m.value)?))
        })
        .collect()
}

fn value_shape(registry: &TypeRegistry, ty: &TypeRef) -> Result<ShapeLabel, CompileError> {
    registry
        .shape_of(ty)
        .ok_or(CompileError::UnregisteredType { kind: ty.kind() })
}

pub(crate) fn parse_iri(iri: &str) -> Result<NamedNode, CompileError> {
    NamedNode::new(iri).map_err(|e| CompileError::InvalidIri {
        iri: iri.to_string(),
        reason: e.to_string(),
    })
}

/// Check everything compilation relies on.
pub(crate) fn check_schema(schema: &Schema) -> Result<(), CompileError> {
    let mut keys = HashSet::new();
    let mut visited = HashSet::new();
    for l in schema.labels() {
        parse_iri(&l.key)?;
        if !keys.insert(l.key.as_str()) {
            return Err(CompileError::DuplicateLabel { key: l.key.clone() });
        }
        check_type(schema, &l.key, &l.value, &mut visited)?;
    }
    for (index, l) in schema.labels().iter().enumerate() {
        let mut chain = vec![index];
        let mut ty = &l.value;
        while let Type::Reference { value } = **ty {
            if chain.contains(&value) {
                return Err(CompileError::UnguardedReferenceCycle { label: l.key.clone() });
            }
            chain.push(value);
            match schema.get(value) {
                Some(target) => ty = &target.value,
                None => break,
            }
        }
    }
    Ok(())
}

fn check_type(
    schema: &Schema,
    label: &str,
    ty: &TypeRef,
    visited: &mut HashSet<usize>,
) -> Result<(), CompileError> {
    if !visited.insert(Arc::as_ptr(ty) as usize) {
        return Ok(());
    }
    match &**ty {
        Type::Unit | Type::Iri => Ok(()),
        Type::Literal { datatype } => parse_iri(datatype).map(|_| ()),
        Type::Reference { value } => {
            if *value < schema.len() {
                Ok(())
            } else {
                Err(CompileError::ReferenceOutOfRange {
                    label: label.to_string(),
                    target: *value,
                    count: schema.len(),
                })
            }
        }
        Type::Product { components: members } | Type::Coproduct { options: members } => {
            let mut seen = HashSet::new();
            for member in members {
                if member.key == rdf::TYPE {
                    return Err(CompileError::ReservedKey {
                        label: label.to_string(),
                        kind: ty.kind(),
                        key: member.key.clone(),
                    });
                }
                parse_iri(&member.key)?;
                if !seen.insert(member.key.as_str()) {
                    return Err(CompileError::DuplicateKey {
                        label: label.to_string(),
                        kind: ty.kind(),
                        key: member.key.clone(),
                    });
                }
                check_type(schema, label, &member.value, visited)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apg_core::vocab::xsd;
    use apg_core::Label;

    fn person() -> Schema {
        Schema::new(vec![Label::new(
            "http://example.com/Person",
            Type::product([
                ("http://example.com/name", Type::literal(xsd::STRING)),
                ("http://example.com/knows", Type::reference(0)),
            ]),
        )])
    }

    #[test]
    fn test_compile_emits_types_then_labels() {
        let compiled = compile(&person()).unwrap();
        let ids: Vec<&str> = compiled
            .constraints()
            .shapes()
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["_:t0", "_:t1", "_:l0"]);
        assert_eq!(compiled.registry().len(), 2);
    }

    #[test]
    fn test_only_label_shapes_are_recursion_roots() {
        let compiled = compile(&person()).unwrap();
        let constraints = compiled.constraints();
        assert!(constraints.is_root(&ShapeLabel::new("_:l0")));
        assert!(!constraints.is_root(&ShapeLabel::new("_:t0")));
        assert!(!constraints.is_root(&ShapeLabel::new("_:t1")));
    }

    #[test]
    fn test_component_references_use_label_shape() {
        let compiled = compile(&person()).unwrap();
        let shexj = compiled.to_shexj();
        let expressions = &shexj["shapes"][0]["shapeExpr"]["shapeExprs"][1]["expression"]
            ["expressions"];
        assert_eq!(expressions[1]["id"], "_:t0-c0");
        assert_eq!(expressions[1]["valueExpr"], "_:t1");
        assert_eq!(expressions[2]["id"], "_:t0-c1");
        assert_eq!(expressions[2]["valueExpr"], "_:l0");
    }

    #[test]
    fn test_duplicate_member_key() {
        let schema = Schema::new(vec![Label::new(
            "http://example.com/A",
            Type::coproduct([
                ("http://example.com/x", Type::unit()),
                ("http://example.com/x", Type::iri()),
            ]),
        )]);
        assert!(matches!(
            compile(&schema),
            Err(CompileError::DuplicateKey { key, .. }) if key == "http://example.com/x"
        ));
    }

    #[test]
    fn test_reserved_member_key() {
        let schema = Schema::new(vec![Label::new(
            "http://example.com/A",
            Type::product([(rdf::TYPE, Type::iri())]),
        )]);
        assert!(matches!(compile(&schema), Err(CompileError::ReservedKey { .. })));
    }

    #[test]
    fn test_invalid_iri() {
        let schema = Schema::new(vec![Label::new("not an iri", Type::unit())]);
        assert!(matches!(compile(&schema), Err(CompileError::InvalidIri { .. })));
    }

    #[test]
    fn test_duplicate_label() {
        let schema = Schema::new(vec![
            Label::new("http://example.com/A", Type::unit()),
            Label::new("http://example.com/A", Type::iri()),
        ]);
        assert_eq!(
            compile(&schema).unwrap_err(),
            CompileError::DuplicateLabel {
                key: "http://example.com/A".into()
            }
        );
    }

    #[test]
    fn test_reference_out_of_range() {
        let schema = Schema::new(vec![Label::new(
            "http://example.com/A",
            Type::product([("http://example.com/p", Type::reference(3))]),
        )]);
        assert!(matches!(
            compile(&schema),
            Err(CompileError::ReferenceOutOfRange { target: 3, count: 1, .. })
        ));
    }

    #[test]
    fn test_unguarded_reference_cycle() {
        let schema = Schema::new(vec![
            Label::new("http://example.com/A", Type::reference(1)),
            Label::new("http://example.com/B", Type::reference(0)),
        ]);
        assert!(matches!(
            compile(&schema),
            Err(CompileError::UnguardedReferenceCycle { .. })
        ));

        let guarded = Schema::new(vec![
            Label::new("http://example.com/A", Type::reference(1)),
            Label::new(
                "http://example.com/B",
                Type::product([("http://example.com/p", Type::reference(0))]),
            ),
        ]);
        assert!(compile(&guarded).is_ok());
    }
}

//! The bootstrap schema that schemas themselves are instances of.
//!
//! Labels are declared in key order, so declared and storage order agree:
//! a schema graph decoded against [`schema_schema`] needs no permutation of
//! its own labels.

use std::sync::Arc;

use apg_core::vocab::ns;
use apg_core::{Label, Schema, Type};

/// Declared index of each bootstrap label.
pub mod index {
    /// `ns:component`
    pub const COMPONENT: usize = 0;
    /// `ns:coproduct`
    pub const COPRODUCT: usize = 1;
    /// `ns:iri`
    pub const IRI: usize = 2;
    /// `ns:label`
    pub const LABEL: usize = 3;
    /// `ns:literal`
    pub const LITERAL: usize = 4;
    /// `ns:option`
    pub const OPTION: usize = 5;
    /// `ns:product`
    pub const PRODUCT: usize = 6;
    /// `ns:reference`
    pub const REFERENCE: usize = 7;
    /// `ns:unit`
    pub const UNIT: usize = 8;
}

/// The schema of schemas.
///
/// Every value position holds the same coproduct node, so it compiles to a
/// single shape.
pub fn schema_schema() -> Schema {
    let value = Type::coproduct([
        (ns::REFERENCE, Type::reference(index::REFERENCE)),
        (ns::UNIT, Type::reference(index::UNIT)),
        (ns::IRI, Type::reference(index::IRI)),
        (ns::LITERAL, Type::reference(index::LITERAL)),
        (ns::PRODUCT, Type::reference(index::PRODUCT)),
        (ns::COPRODUCT, Type::reference(index::COPRODUCT)),
    ]);
    let member = |source: usize| {
        Type::product([
            (ns::SOURCE, Type::reference(source)),
            (ns::KEY, Type::iri()),
            (ns::VALUE, Arc::clone(&value)),
        ])
    };

    Schema::new(vec![
        Label::new(ns::COMPONENT, member(index::PRODUCT)),
        Label::new(ns::COPRODUCT, Type::unit()),
        Label::new(ns::IRI, Type::unit()),
        Label::new(
            ns::LABEL,
            Type::product([(ns::KEY, Type::iri()), (ns::VALUE, Arc::clone(&value))]),
        ),
        Label::new(ns::LITERAL, Type::product([(ns::DATATYPE, Type::iri())])),
        Label::new(ns::OPTION, member(index::COPRODUCT)),
        Label::new(ns::PRODUCT, Type::unit()),
        Label::new(
            ns::REFERENCE,
            Type::product([(ns::VALUE, Type::reference(index::LABEL))]),
        ),
        Label::new(ns::UNIT, Type::unit()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;

    #[test]
    fn test_declared_order_is_storage_order() {
        let schema = schema_schema();
        let identity: Vec<usize> = (0..schema.len()).collect();
        assert_eq!(schema.storage_permutation(), identity);
        assert_eq!(schema.position(ns::LABEL), Some(index::LABEL));
        assert_eq!(schema.position(ns::UNIT), Some(index::UNIT));
    }

    #[test]
    fn test_value_coproduct_compiles_once() {
        let schema = schema_schema();
        let compiled = compile(&schema).unwrap();
        let coproducts = compiled
            .registry()
            .iter()
            .filter(|(_, ty)| matches!(***ty, Type::Coproduct { .. }))
            .count();
        assert_eq!(coproducts, 1);
    }
}

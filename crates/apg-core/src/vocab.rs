//! # Vocabulary
//!
//! IRIs used by the format: the RDF type marker predicate, a few XSD
//! datatypes, and the `http://underlay.org/ns/` namespace that the
//! schema-of-schemas is written in.

/// RDF vocabulary.
pub mod rdf {
    /// The reserved type-marker predicate. Label instances carry it, and no
    /// product or coproduct may use it as a member key.
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// Datatype of language-tagged strings.
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// XML Schema datatypes.
pub mod xsd {
    /// `xsd:string`, the datatype of simple literals.
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:boolean`.
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `xsd:integer`.
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:dateTime`.
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// The schema-of-schemas namespace.
pub mod ns {
    /// Namespace prefix.
    pub const NAMESPACE: &str = "http://underlay.org/ns/";

    /// Label of schema labels.
    pub const LABEL: &str = "http://underlay.org/ns/label";
    /// Label of product components.
    pub const COMPONENT: &str = "http://underlay.org/ns/component";
    /// Label of coproduct options.
    pub const OPTION: &str = "http://underlay.org/ns/option";
    /// Label of reference types.
    pub const REFERENCE: &str = "http://underlay.org/ns/reference";
    /// Label of unit types.
    pub const UNIT: &str = "http://underlay.org/ns/unit";
    /// Label of IRI types.
    pub const IRI: &str = "http://underlay.org/ns/iri";
    /// Label of literal types.
    pub const LITERAL: &str = "http://underlay.org/ns/literal";
    /// Label of product types.
    pub const PRODUCT: &str = "http://underlay.org/ns/product";
    /// Label of coproduct types.
    pub const COPRODUCT: &str = "http://underlay.org/ns/coproduct";

    /// Component/option → owning product/coproduct.
    pub const SOURCE: &str = "http://underlay.org/ns/source";
    /// Key of a label, component or option.
    pub const KEY: &str = "http://underlay.org/ns/key";
    /// Value type of a label, component or option; target of a reference.
    pub const VALUE: &str = "http://underlay.org/ns/value";
    /// Datatype of a literal type.
    pub const DATATYPE: &str = "http://underlay.org/ns/datatype";
}

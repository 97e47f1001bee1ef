//! # Compile Subcommand
//!
//! Print the shapes a schema compiles to, as ShExJ-style JSON.

use anyhow::Result;
use apg_core::Schema;
use clap::Args;
use tracing::info;

use crate::input::SchemaInput;

/// Arguments for the compile subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub schema: SchemaInput,
}

/// Run the subcommand.
pub fn run(args: &CompileArgs) -> Result<String> {
    let schema = args.schema.load()?;
    Ok(serde_json::to_string_pretty(&shapes(&schema)?)? + "\n")
}

/// ShExJ document for `schema`.
pub fn shapes(schema: &Schema) -> Result<serde_json::Value> {
    let compiled = apg_format::compile(schema)?;
    info!(
        types = compiled.registry().len(),
        shapes = compiled.constraints().len(),
        "compiled schema"
    );
    Ok(compiled.to_shexj())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apg_core::{Label, Type};

    #[test]
    fn test_one_shape_per_type_and_label() {
        let schema = Schema::new(vec![Label::new(
            "http://example.com/Thing",
            Type::product([("http://example.com/self", Type::reference(0))]),
        )]);
        let json = shapes(&schema).unwrap();
        assert_eq!(json["type"], "Schema");
        let ids: Vec<&str> = json["shapes"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|shape| shape["id"].as_str())
            .collect();
        assert!(ids.contains(&"_:l0"));
        assert!(ids.contains(&"_:t0"));
    }

    #[test]
    fn test_bad_reference_is_error() {
        let schema = Schema::new(vec![Label::new(
            "http://example.com/Thing",
            Type::reference(3),
        )]);
        assert!(shapes(&schema).is_err());
    }
}

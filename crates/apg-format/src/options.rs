//! Decode configuration.

use serde::{Deserialize, Serialize};

/// Options for [`parse_with_options`](crate::parse_with_options).
///
/// Deserializes from JSON with every field optional:
///
/// ```json
/// { "max_depth": 256 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Bound on nested references, both in the validation engine and in
    /// the decoder stack. Exceeding it is a reportable
    /// [`ParseError::DepthLimitExceeded`](crate::ParseError::DepthLimitExceeded).
    pub max_depth: usize,
}

impl ParseOptions {
    /// Default reference depth bound.
    pub const DEFAULT_MAX_DEPTH: usize = apg_shex::validator::DEFAULT_MAX_DEPTH;
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

//! # Error Types
//!
//! Structural errors detected on the data model itself. Decoding and
//! compilation errors live in `apg-format`; these are the invariants an
//! [`Instance`](crate::Instance) or [`Schema`](crate::Schema) can be checked
//! against in isolation.

use thiserror::Error;

/// A broken invariant of the data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A pointer targets an element past the end of its label's sequence.
    #[error("pointer to element {index} of label {label} dangles (label holds {len} elements)")]
    DanglingPointer {
        /// Target label index.
        label: usize,
        /// Target element index.
        index: usize,
        /// Number of elements the label actually holds.
        len: usize,
    },

    /// A pointer targets a label the instance does not have.
    #[error("pointer targets label {label} but the instance has {count} labels")]
    LabelOutOfRange {
        /// Target label index.
        label: usize,
        /// Number of labels in the instance.
        count: usize,
    },

    /// A decode placeholder survived into a finished instance.
    #[error("placeholder for stack depth {depth} left in element {index} of label {label}")]
    PlaceholderLeak {
        /// Label holding the offending element.
        label: usize,
        /// Offending element index.
        index: usize,
        /// Stack depth the placeholder was minted for.
        depth: usize,
    },
}

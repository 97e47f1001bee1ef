//! # apg-core — Foundational Types for Algebraic Property Graphs
//!
//! This crate is the leaf of the `apg` workspace. It defines the schema
//! language, the shape of decoded data, and the canonical form used to
//! compare serialized graphs. Every other crate in the workspace depends on
//! `apg-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Types are shared by identity.** A [`Type`] node is held behind an
//!    `Arc` ([`TypeRef`]). Reaching the same `Arc` from two places means the
//!    schema *shares* that node; two structurally equal but separately built
//!    nodes are distinct. The type registry in `apg-format` relies on this.
//!
//! 2. **Canonical member order.** Product and coproduct values always carry
//!    their member keys sorted lexicographically, independent of the order
//!    the schema author declared them in.
//!
//! 3. **`CanonicalTriples` newtype.** All byte-level comparisons and digests
//!    of serialized graphs flow through [`CanonicalTriples`], whose only
//!    constructors sort and de-duplicate N-Triples lines.
//!
//! 4. **No dangling data.** An [`Instance`] can be checked for dangling
//!    pointers and leftover decode placeholders with
//!    [`Instance::check_integrity`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod types;
pub mod value;
pub mod vocab;

pub use canonical::CanonicalTriples;
pub use digest::{sha256_digest, ContentDigest};
pub use error::ModelError;
pub use types::{Label, Member, Schema, Type, TypeKind, TypeRef};
pub use value::{Instance, Placeholder, Pointer, Record, Value, Variant};

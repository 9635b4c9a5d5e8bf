//! Shared identifiers for the Given resolver.
//!
//! Every other crate in the workspace speaks in terms of these handles:
//! - [`Name`]: a compact interned string (classifier keys, declaration origins,
//!   scope names, parameter names)
//! - [`StringInterner`]: the table that owns the strings behind `Name`s
//! - [`DeclId`]: the identity of a collected injectable declaration
//!
//! Nothing in here knows about types or resolution.

mod decl_id;
mod interner;
mod name;

pub use decl_id::DeclId;
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;

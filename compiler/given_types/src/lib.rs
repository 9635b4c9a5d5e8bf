//! Type model for the Given resolver.
//!
//! - [`Classifiers`] / [`ClassifierId`]: the table of classes, type
//!   parameters, tags and function arities
//! - [`Type`]: immutable type values with substitution and tag wrapping
//! - [`check`]: the subtype relation and assignability
//! - [`infer`]: constraint-based inference of type-parameter bindings,
//!   including the staged mode used for add-on rules
//!
//! Nothing here knows about declarations or scopes; the resolver in
//! `given_resolve` drives these pieces.

mod classifier;
pub mod check;
pub mod infer;
mod ty;

#[cfg(test)]
mod fixtures;

pub use check::{
    is_assignable_to, is_equal, is_equal_to, is_subtype, is_subtype_of, Assignability,
    StaticContext, TypeCheckerContext,
};
pub use classifier::{ClassifierData, ClassifierFlags, ClassifierId, Classifiers, Variance};
pub use infer::{run_add_on_inference, run_candidate_inference, InferenceContext};
pub use ty::{Substitution, Type, TypeDisplay, TypeError};

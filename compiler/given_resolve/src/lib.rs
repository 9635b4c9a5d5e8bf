//! Injectable resolution for the Given compiler.
//!
//! Given a requested type and the scopes visible at a call site, find the
//! unique way to build a value of that type from the injectable
//! declarations in scope, or explain why there is none.
//!
//! - [`Declaration`] / [`DeclarationBuilder`]: producers and their
//!   dependencies, built by declaration collection
//! - [`ContextPath`] / [`ScopeFrame`]: what a call site can see
//! - [`DeclarationGraph`]: per-scope index of injectables, with add-on rules
//!   expanded
//! - [`Resolver`]: candidate selection, recursion and cycle detection
//! - [`ResolutionPlan`] / [`PlanVisitor`]: the result, walked by emission
//! - [`ResolutionFailure`]: why a request failed, with its trace
//! - [`resolve_batch`]: many call sites in parallel
//!
//! Set `RUST_LOG=given_resolve=trace` after calling [`init_tracing`] to see
//! every candidate the engine considers.

mod batch;
mod candidate;
mod declaration;
mod failure;
mod graph;
mod options;
mod path;
mod plan;
mod resolve;
mod stack;

#[cfg(test)]
mod fixtures;

use std::sync::Once;

pub use batch::{resolve, resolve_batch, ResolutionRequest};
pub use candidate::Candidate;
pub use declaration::{CallContext, Declaration, DeclarationBuilder, DeclarationKind, Dependency};
pub use failure::{ResolutionFailure, TraceFrame, Via};
pub use graph::{DeclarationGraph, ScopeId, ScopeNode};
pub use options::ResolutionOptions;
pub use path::{ContextPath, ScopeFrame, ScopeKind};
pub use plan::{walk_plan, CallPlan, PlanVisitor, ResolutionPlan, ResolvedDependency};
pub use resolve::Resolver;
pub use stack::ensure_sufficient_stack;

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber if `RUST_LOG` is set.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

//! Independent requests, resolved in parallel.

use rayon::prelude::*;
use tracing::debug;

use given_types::{Classifiers, Type};

use crate::{ContextPath, ResolutionFailure, ResolutionOptions, ResolutionPlan, Resolver};

/// One call site: what it needs and what it can see.
#[derive(Clone, Debug)]
pub struct ResolutionRequest {
    pub requested: Type,
    pub path: ContextPath,
    pub options: ResolutionOptions,
}

impl ResolutionRequest {
    pub fn new(requested: Type, path: ContextPath) -> Self {
        ResolutionRequest {
            requested,
            path,
            options: ResolutionOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ResolutionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Resolve a single request with a fresh graph.
pub fn resolve(
    classifiers: &Classifiers,
    request: &ResolutionRequest,
) -> Result<ResolutionPlan, ResolutionFailure> {
    Resolver::for_path(classifiers, &request.path, request.options).resolve(&request.requested)
}

/// Resolve every request, each with its own graph and state.
///
/// Results come back in request order.
#[tracing::instrument(level = "debug", skip_all, fields(requests = requests.len()))]
pub fn resolve_batch(
    classifiers: &Classifiers,
    requests: &[ResolutionRequest],
) -> Vec<Result<ResolutionPlan, ResolutionFailure>> {
    let results: Vec<_> = requests
        .par_iter()
        .map(|request| resolve(classifiers, request))
        .collect();
    debug!(
        failed = results.iter().filter(|result| result.is_err()).count(),
        "batch resolved"
    );
    results
}

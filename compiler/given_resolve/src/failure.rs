//! Resolution failures.
//!
//! Failures are plain values. Every variant carries the trace from the
//! outermost request to the point of failure, so a caller can report the
//! whole chain ("`Bar` requested via `bar`, `Foo` requested via ...").
//!
//! While candidates compete, the engine also needs to know how *bad* a
//! failure is: a failure inside a candidate's dependencies is more
//! informative than "nothing matched". That ranking lives in [`Ranked`] and
//! never leaves the crate.

use std::fmt::Write as _;
use std::sync::Arc;

use given_ir::{DeclId, Name};
use given_types::{Classifiers, Type};

use crate::{CallContext, Candidate, Declaration};

/// How a trace frame's value was to be produced.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Via {
    Declaration { id: DeclId, origin: Name },
    Lambda,
    List,
}

/// "`requested` was requested via `via`."
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TraceFrame {
    pub requested: Type,
    /// `None` for the frame that failed before a candidate was chosen.
    pub via: Option<Via>,
}

/// Why a request could not be satisfied.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("no injectable candidate for the requested type")]
    NoCandidate { requested: Type, trace: Vec<TraceFrame> },

    #[error("{} injectable candidates are equally specific", .candidates.len())]
    AmbiguousCandidates {
        requested: Type,
        candidates: Vec<Candidate>,
        trace: Vec<TraceFrame>,
    },

    #[error("injectable dependency cycle")]
    DivergingDependency {
        candidate: Candidate,
        trace: Vec<TraceFrame>,
    },

    #[error("injectable requires a component scope that is not active")]
    ScopeMismatch {
        declaration: Arc<Declaration>,
        required: Name,
        actual: Vec<Name>,
        trace: Vec<TraceFrame>,
    },

    #[error("injectable requires a {required:?} call context, caller is {actual:?}")]
    CallContextMismatch {
        declaration: Arc<Declaration>,
        required: CallContext,
        actual: CallContext,
        trace: Vec<TraceFrame>,
    },
}

impl ResolutionFailure {
    /// Frames from the outermost request to the failure.
    pub fn trace(&self) -> &[TraceFrame] {
        match self {
            ResolutionFailure::NoCandidate { trace, .. }
            | ResolutionFailure::AmbiguousCandidates { trace, .. }
            | ResolutionFailure::DivergingDependency { trace, .. }
            | ResolutionFailure::ScopeMismatch { trace, .. }
            | ResolutionFailure::CallContextMismatch { trace, .. } => trace,
        }
    }

    pub fn is_no_candidate(&self) -> bool {
        matches!(self, ResolutionFailure::NoCandidate { .. })
    }

    /// Multi-line description with types and declaration names spelled out.
    pub fn render(&self, classifiers: &Classifiers) -> String {
        let interner = classifiers.interner();
        let origin = |declaration: &Declaration| interner.lookup(declaration.origin());
        let candidate = |candidate: &Candidate| match candidate {
            Candidate::Declared { declaration, .. } => format!("`{}`", origin(declaration)),
            Candidate::Lambda { ty, .. } => format!("lambda `{}`", ty.display(classifiers)),
            Candidate::List { ty, .. } => format!("list `{}`", ty.display(classifiers)),
        };

        let mut out = match self {
            ResolutionFailure::NoCandidate { requested, .. } => {
                format!("no injectable found for `{}`", requested.display(classifiers))
            }
            ResolutionFailure::AmbiguousCandidates {
                requested,
                candidates,
                ..
            } => {
                let names: Vec<String> = candidates.iter().map(candidate).collect();
                format!(
                    "ambiguous injectables for `{}`: {}",
                    requested.display(classifiers),
                    names.join(", ")
                )
            }
            ResolutionFailure::DivergingDependency { candidate: c, .. } => {
                format!("diverging injectable dependency through {}", candidate(c))
            }
            ResolutionFailure::ScopeMismatch {
                declaration,
                required,
                actual,
                ..
            } => {
                let actual: Vec<&str> = actual.iter().map(|&n| interner.lookup(n)).collect();
                format!(
                    "`{}` is scoped to `{}`, active scopes: [{}]",
                    origin(declaration),
                    interner.lookup(*required),
                    actual.join(", ")
                )
            }
            ResolutionFailure::CallContextMismatch {
                declaration,
                required,
                actual,
                ..
            } => format!(
                "`{}` needs a {required:?} call context, called from {actual:?}",
                origin(declaration)
            ),
        };

        for frame in self.trace() {
            let _ = write!(out, "\n  `{}`", frame.requested.display(classifiers));
            match &frame.via {
                Some(Via::Declaration { origin, .. }) => {
                    let _ = write!(out, " via `{}`", interner.lookup(*origin));
                }
                Some(Via::Lambda) => out.push_str(" via lambda"),
                Some(Via::List) => out.push_str(" via list"),
                None => {}
            }
        }
        out
    }
}

/// Severity of a failure when choosing which one to report; lower is
/// reported first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) enum FailureRank {
    Ambiguity,
    /// The candidate matched but could not be used: a dependency failed,
    /// or its scope or call context did not fit.
    Candidate,
    Divergence,
    NoCandidate,
}

#[derive(Clone, Debug)]
pub(crate) struct Ranked {
    pub rank: FailureRank,
    pub failure: ResolutionFailure,
}

impl Ranked {
    pub(crate) fn new(rank: FailureRank, failure: ResolutionFailure) -> Self {
        Ranked { rank, failure }
    }

    /// Rank a failure by its kind alone.
    pub(crate) fn of(failure: ResolutionFailure) -> Self {
        let rank = match failure {
            ResolutionFailure::AmbiguousCandidates { .. } => FailureRank::Ambiguity,
            ResolutionFailure::ScopeMismatch { .. } | ResolutionFailure::CallContextMismatch { .. } => {
                FailureRank::Candidate
            }
            ResolutionFailure::DivergingDependency { .. } => FailureRank::Divergence,
            ResolutionFailure::NoCandidate { .. } => FailureRank::NoCandidate,
        };
        Ranked { rank, failure }
    }
}

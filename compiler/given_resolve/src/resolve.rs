//! The resolution engine.
//!
//! # Algorithm
//!
//! [`Resolver::resolve`] turns a requested type into a [`ResolutionPlan`]
//! by recursion over dependency edges:
//!
//! 1. **Gather** the graph's candidates for the request. Without user
//!    candidates, function types get a synthesized lambda and `List<T>`
//!    collects every matching element.
//! 2. **Filter** candidates whose component scope is not active. This only
//!    fails the request when nothing is left.
//! 3. **Rank** by proximity, dispatch receiver and specificity
//!    ([`compare`]), then try candidates in order. Once a candidate
//!    succeeds, worse candidates are skipped; a failure never stops the
//!    search, so a farther success beats a closer failure. Two successes
//!    that rank equally are ambiguous.
//! 4. **Recurse** into the chosen candidate's dependencies.
//!
//! # Cycles
//!
//! The resolver keeps the chain of candidates currently being resolved,
//! split into segments at lambdas (a lambda defers evaluation of its body).
//! A declaration that comes back while it is on the chain, producing a type
//! over the same classifiers, diverges when the type grew, or when it is the
//! same type and no lambda lies in between. The same type behind a lambda
//! becomes a back reference to the enclosing value. Reusing one generic
//! declaration at unrelated type arguments is not a cycle. `max_depth`
//! bounds everything else.
//!
//! # Memoization
//!
//! Whether a request succeeds depends on the chain above it, so memoized
//! plans are kept per chain prefix: siblings under the same parent share
//! them, and they are dropped when the entry they were computed under is
//! popped.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use given_ir::{DeclId, Name};
use given_types::{ClassifierId, Classifiers, Type, Variance};

use crate::failure::{FailureRank, Ranked};
use crate::stack::ensure_sufficient_stack;
use crate::{
    CallPlan, Candidate, ContextPath, Declaration, DeclarationGraph, DeclarationKind, Dependency,
    ResolutionFailure, ResolutionOptions, ResolutionPlan, ResolvedDependency, ScopeFrame, ScopeId,
    ScopeKind, TraceFrame, Via,
};

mod compare;

use compare::{compare_candidates, sort_candidates};

type PlanResult = Result<Arc<ResolutionPlan>, Ranked>;

/// A candidate whose dependencies are being resolved.
struct ChainEntry {
    requested: Type,
    candidate: Candidate,
    segment: usize,
}

/// Resolves requests against one [`DeclarationGraph`].
///
/// A resolver holds per-request state (the active chain, memoized
/// sub-plans, lambda scopes); reuse it for requests from the same context
/// path, such as the parameters of one call.
pub struct Resolver<'a> {
    classifiers: &'a Classifiers,
    graph: DeclarationGraph,
    options: ResolutionOptions,
    chain: Vec<ChainEntry>,
    /// Lambdas on the chain.
    segment: usize,
    /// One level per chain prefix; `memo.len() == chain.len() + 1`.
    memo: Vec<FxHashMap<(ScopeId, Type), Arc<ResolutionPlan>>>,
    lambda_scopes: FxHashMap<(ScopeId, Type), (ScopeId, Vec<Arc<Declaration>>)>,
}

impl<'a> Resolver<'a> {
    pub fn new(classifiers: &'a Classifiers, graph: DeclarationGraph, options: ResolutionOptions) -> Self {
        Resolver {
            classifiers,
            graph,
            options,
            chain: Vec::new(),
            segment: 0,
            memo: vec![FxHashMap::default()],
            lambda_scopes: FxHashMap::default(),
        }
    }

    /// Build the graph for `path` and a resolver over it.
    pub fn for_path(classifiers: &'a Classifiers, path: &ContextPath, options: ResolutionOptions) -> Self {
        Self::new(classifiers, DeclarationGraph::build(classifiers, path), options)
    }

    pub fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    /// Resolve `requested` in the innermost scope of the graph.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(requested = %requested.display(self.classifiers))
    )]
    pub fn resolve(&mut self, requested: &Type) -> Result<ResolutionPlan, ResolutionFailure> {
        let scope = self.graph.request_scope();
        match self.resolve_request(scope, requested) {
            Ok(plan) => {
                debug!(via = ?plan.candidate().via(), "resolved");
                Ok(Arc::unwrap_or_clone(plan))
            }
            Err(ranked) => {
                debug!(failure = %ranked.failure, "resolution failed");
                Err(ranked.failure)
            }
        }
    }

    /// Resolve every parameter of a call to `callee`, in order.
    ///
    /// The first parameter that fails (and has no usable default) fails
    /// the call; later parameters are not attempted.
    #[tracing::instrument(level = "debug", skip_all, fields(parameters = dependencies.len()))]
    pub fn resolve_call(
        &mut self,
        callee: Name,
        dependencies: &[Dependency],
    ) -> Result<CallPlan, ResolutionFailure> {
        let scope = self.graph.request_scope();
        let mut arguments = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            match self.resolve_request(scope, &dependency.ty) {
                Ok(plan) => arguments.push(ResolvedDependency::Plan(plan)),
                Err(ranked) if dependency.has_default && ranked.failure.is_no_candidate() => {
                    arguments.push(ResolvedDependency::DefaultValue);
                }
                Err(ranked) => return Err(ranked.failure),
            }
        }
        Ok(CallPlan { callee, arguments })
    }

    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(requested = %requested.display(self.classifiers), depth = self.chain.len())
    )]
    fn resolve_request(&mut self, scope: ScopeId, requested: &Type) -> PlanResult {
        ensure_sufficient_stack(|| self.resolve_request_inner(scope, requested))
    }

    fn resolve_request_inner(&mut self, scope: ScopeId, requested: &Type) -> PlanResult {
        let key = (scope, requested.clone());
        if self.options.memoize {
            if let Some(plan) = self.memo.last().and_then(|level| level.get(&key)) {
                trace!("memoized");
                return Ok(Arc::clone(plan));
            }
        }

        if self.chain.len() >= self.options.max_depth {
            if let Some(entry) = self.chain.last() {
                return Err(Ranked::new(
                    FailureRank::Divergence,
                    ResolutionFailure::DivergingDependency {
                        candidate: entry.candidate.clone(),
                        trace: self.trace(requested, None),
                    },
                ));
            }
        }

        let mut candidates = self.graph.candidates_for(self.classifiers, scope, requested);
        if candidates.is_empty() {
            if let Some(builtin) = self.builtin_candidate(scope, requested) {
                candidates.push((builtin, 0));
            }
        }
        if candidates.is_empty() {
            return Err(Ranked::new(
                FailureRank::NoCandidate,
                ResolutionFailure::NoCandidate {
                    requested: requested.clone(),
                    trace: self.trace(requested, None),
                },
            ));
        }

        let candidates = self.filter_scopes(scope, requested, candidates)?;
        let plan = self.resolve_candidates(scope, requested, candidates)?;

        if self.options.memoize {
            if let Some(level) = self.memo.last_mut() {
                level.insert(key, Arc::clone(&plan));
            }
        }
        Ok(plan)
    }

    /// Drop candidates whose component scope is inactive. Fails only when
    /// that removes every candidate.
    fn filter_scopes(
        &self,
        scope: ScopeId,
        requested: &Type,
        candidates: Vec<(Candidate, u32)>,
    ) -> Result<Vec<(Candidate, u32)>, Ranked> {
        let active = self.graph.node(scope).component_scopes();
        let mut first_removed = None;
        let mut kept = Vec::with_capacity(candidates.len());
        for (candidate, distance) in candidates {
            match candidate.target_scope() {
                Some(required) if !active.contains(&required) => {
                    trace!(?required, "candidate scope is not active");
                    first_removed.get_or_insert((candidate, required));
                }
                _ => kept.push((candidate, distance)),
            }
        }

        match first_removed {
            Some((candidate, required)) if kept.is_empty() => {
                let via = candidate.via();
                let Some(declaration) = candidate.declaration().cloned() else {
                    return Ok(kept);
                };
                Err(Ranked::of(ResolutionFailure::ScopeMismatch {
                    declaration,
                    required,
                    actual: active.to_vec(),
                    trace: self.trace(requested, Some(via)),
                }))
            }
            _ => Ok(kept),
        }
    }

    fn resolve_candidates(
        &mut self,
        scope: ScopeId,
        requested: &Type,
        mut candidates: Vec<(Candidate, u32)>,
    ) -> PlanResult {
        if candidates.len() == 1 {
            let (candidate, _) = &candidates[0];
            return self.resolve_candidate(scope, requested, candidate);
        }

        sort_candidates(self.classifiers, &mut candidates);

        let mut successes: Vec<(Candidate, u32, Arc<ResolutionPlan>)> = Vec::new();
        let mut best_failure: Option<Ranked> = None;
        for (candidate, distance) in candidates {
            if let Some((first, first_distance, _)) = successes.first() {
                let order = compare_candidates(
                    self.classifiers,
                    (first, *first_distance),
                    (&candidate, distance),
                );
                if order == Ordering::Less {
                    break;
                }
            }

            match self.resolve_candidate(scope, requested, &candidate) {
                Ok(plan) => {
                    let order = successes.first().map_or(Ordering::Less, |(first, first_distance, _)| {
                        compare_candidates(
                            self.classifiers,
                            (&candidate, distance),
                            (first, *first_distance),
                        )
                    });
                    match order {
                        Ordering::Less => {
                            successes.clear();
                            successes.push((candidate, distance, plan));
                        }
                        Ordering::Equal => successes.push((candidate, distance, plan)),
                        Ordering::Greater => {}
                    }
                }
                Err(failure) => {
                    if best_failure.as_ref().map_or(true, |best| failure.rank < best.rank) {
                        best_failure = Some(failure);
                    }
                }
            }
        }

        match successes.len() {
            0 => Err(best_failure.unwrap_or_else(|| {
                Ranked::of(ResolutionFailure::NoCandidate {
                    requested: requested.clone(),
                    trace: self.trace(requested, None),
                })
            })),
            1 => {
                let (_, _, plan) = successes.swap_remove(0);
                Ok(plan)
            }
            _ => {
                debug!(count = successes.len(), "ambiguous candidates");
                Err(Ranked::of(ResolutionFailure::AmbiguousCandidates {
                    requested: requested.clone(),
                    candidates: successes.into_iter().map(|(candidate, _, _)| candidate).collect(),
                    trace: self.trace(requested, None),
                }))
            }
        }
    }

    fn resolve_candidate(&mut self, scope: ScopeId, requested: &Type, candidate: &Candidate) -> PlanResult {
        let caller = self.graph.node(scope).call_context();
        let callee = candidate.call_context();
        if !caller.can_call(callee) {
            if let Some(declaration) = candidate.declaration() {
                return Err(Ranked::of(ResolutionFailure::CallContextMismatch {
                    declaration: Arc::clone(declaration),
                    required: callee,
                    actual: caller,
                    trace: self.trace(requested, Some(candidate.via())),
                }));
            }
        }

        let substitution = candidate.substitution().cloned().unwrap_or_default();
        if let Some(declaration) = candidate.declaration() {
            if declaration.is_leaf() {
                return Ok(Arc::new(ResolutionPlan::new(candidate.clone(), substitution, Vec::new())));
            }
            if let Some(result) = self.check_reentry(requested, candidate, declaration.id()) {
                return result;
            }
        }

        self.chain.push(ChainEntry {
            requested: requested.clone(),
            candidate: candidate.clone(),
            segment: self.segment,
        });
        self.memo.push(FxHashMap::default());
        let opened_segment = matches!(candidate, Candidate::Lambda { .. });
        if opened_segment {
            self.segment += 1;
        }

        let dependencies = self.resolve_dependencies(scope, candidate);

        if opened_segment {
            self.segment -= 1;
        }
        self.memo.pop();
        self.chain.pop();

        let dependencies = dependencies.map_err(|failure| Ranked::new(FailureRank::Candidate, failure))?;
        Ok(Arc::new(ResolutionPlan::new(candidate.clone(), substitution, dependencies)))
    }

    /// The same declaration coming back while it is being resolved.
    ///
    /// Only earlier uses producing a type over the same classifiers count.
    /// A larger type diverges. The same type diverges unless a lambda lies
    /// in between, in which case it refers back to the enclosing value.
    fn check_reentry(&self, requested: &Type, candidate: &Candidate, id: DeclId) -> Option<PlanResult> {
        let produced = candidate.ty();
        let mut covering: Option<FxHashSet<ClassifierId>> = None;
        let mut back_reference = false;

        for entry in self.chain.iter().rev() {
            if !entry.candidate.declaration().is_some_and(|d| d.id() == id) {
                continue;
            }
            let previous = entry.candidate.ty();
            let wanted = covering.get_or_insert_with(|| produced.covering_set());
            if previous.covering_set() != *wanted {
                continue;
            }

            let deferred = entry.segment < self.segment;
            if previous.type_size() < produced.type_size() || (previous == produced && !deferred) {
                return Some(Err(Ranked::new(
                    FailureRank::Divergence,
                    ResolutionFailure::DivergingDependency {
                        candidate: candidate.clone(),
                        trace: self.trace(requested, Some(candidate.via())),
                    },
                )));
            }
            back_reference |= previous == produced;
        }

        if back_reference {
            trace!("back reference through a lambda");
            let substitution = candidate.substitution().cloned().unwrap_or_default();
            return Some(Ok(Arc::new(ResolutionPlan::back_reference(candidate.clone(), substitution))));
        }
        None
    }

    fn resolve_dependencies(
        &mut self,
        scope: ScopeId,
        candidate: &Candidate,
    ) -> Result<Vec<ResolvedDependency>, ResolutionFailure> {
        match candidate {
            Candidate::Declared { declaration, .. } => {
                let mut resolved = Vec::with_capacity(declaration.dependencies().len());
                for dependency in declaration.dependencies() {
                    match self.resolve_request(scope, &dependency.ty) {
                        Ok(plan) => resolved.push(ResolvedDependency::Plan(plan)),
                        Err(ranked) if dependency.has_default && ranked.failure.is_no_candidate() => {
                            trace!("falling back to default value");
                            resolved.push(ResolvedDependency::DefaultValue);
                        }
                        Err(ranked) => return Err(ranked.failure),
                    }
                }
                Ok(resolved)
            }
            Candidate::Lambda { ty, scope: body_scope, .. } => {
                let Some(return_type) = ty.arguments().last() else {
                    return Ok(Vec::new());
                };
                let body = self
                    .resolve_request(*body_scope, return_type)
                    .map_err(|ranked| ranked.failure)?;
                Ok(vec![ResolvedDependency::Plan(body)])
            }
            Candidate::List { element, elements, .. } => {
                let mut resolved = Vec::with_capacity(elements.len());
                for element_candidate in elements {
                    let plan = self
                        .resolve_candidate(scope, element, element_candidate)
                        .map_err(|ranked| ranked.failure)?;
                    resolved.push(ResolvedDependency::Plan(plan));
                }
                Ok(resolved)
            }
        }
    }

    /// Lambda or list candidate for a request no injectable matches.
    fn builtin_candidate(&mut self, scope: ScopeId, requested: &Type) -> Option<Candidate> {
        if self.options.builtin_lambdas && self.classifiers.function_arity(requested.classifier()).is_some() {
            return Some(self.lambda_candidate(scope, requested));
        }

        if self.options.builtin_lists && requested.classifier() == ClassifierId::LIST {
            let element = requested
                .arguments()
                .first()
                .cloned()
                .unwrap_or_else(Type::nullable_any);
            let elements = self.graph.list_elements_for(self.classifiers, scope, &element);
            if elements.is_empty() {
                return None;
            }
            debug!(elements = elements.len(), "list candidate");
            return Some(Candidate::List {
                ty: requested.clone(),
                element,
                elements,
                owner: scope,
            });
        }

        None
    }

    /// A lambda for the function type `requested`, whose parameters are
    /// injectables of a child scope of `scope`.
    fn lambda_candidate(&mut self, scope: ScopeId, requested: &Type) -> Candidate {
        let key = (scope, requested.clone());
        let (body_scope, parameters) = match self.lambda_scopes.get(&key) {
            Some(entry) => entry.clone(),
            None => {
                let interner = self.classifiers.interner();
                let arguments = requested.arguments();
                let parameter_types = &arguments[..arguments.len().saturating_sub(1)];
                let parameters: Vec<Arc<Declaration>> = parameter_types
                    .iter()
                    .enumerate()
                    .map(|(index, ty)| {
                        let origin = interner.try_intern(&format!("it{index}")).unwrap_or_default();
                        let kind = DeclarationKind::ValueParameter {
                            index: u32::try_from(index).unwrap_or(u32::MAX),
                        };
                        Declaration::builder(DeclId::SYNTHETIC, origin, kind, ty.with_variance(Variance::Invariant))
                            .finish(self.classifiers)
                    })
                    .collect();

                let name = interner.try_intern("lambda").unwrap_or_default();
                let frame = ScopeFrame::new(name, ScopeKind::Lambda).with_injectables(parameters.iter().cloned());
                let body_scope = self.graph.add_child_scope(self.classifiers, scope, &frame);
                self.lambda_scopes.insert(key, (body_scope, parameters.clone()));
                (body_scope, parameters)
            }
        };

        Candidate::Lambda {
            ty: requested.clone(),
            parameters,
            scope: body_scope,
            owner: scope,
        }
    }

    fn trace(&self, requested: &Type, via: Option<Via>) -> Vec<TraceFrame> {
        self.chain
            .iter()
            .map(|entry| TraceFrame {
                requested: entry.requested.clone(),
                via: Some(entry.candidate.via()),
            })
            .chain(std::iter::once(TraceFrame {
                requested: requested.clone(),
                via,
            }))
            .collect()
    }
}

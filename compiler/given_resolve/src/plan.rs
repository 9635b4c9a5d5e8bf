//! Resolution plans and the visitor emission walks them with.
//!
//! A [`ResolutionPlan`] is a tree: each node says which candidate builds the
//! value and how each of its dependencies is obtained. Plans are shared
//! (`Arc`), so a memoized sub-plan may appear under several parents.
//!
//! # Visiting
//!
//! [`PlanVisitor`] follows the same shape as the AST visitors elsewhere in
//! the compiler: `visit_*` methods default to the matching `walk_*`
//! function, which visits children. Dependencies are visited before their
//! node, which is the order in which emitted code has to evaluate them.

use std::sync::Arc;

use given_ir::Name;
use given_types::{Substitution, Type};

use crate::{Candidate, Declaration};

/// How one dependency of a plan node is satisfied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedDependency {
    Plan(Arc<ResolutionPlan>),
    /// Use the default value the call site declares for this parameter.
    DefaultValue,
}

/// A resolved value: the candidate that builds it and its dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionPlan {
    candidate: Candidate,
    substitution: Substitution,
    dependencies: Vec<ResolvedDependency>,
    back_reference: bool,
}

impl ResolutionPlan {
    pub(crate) fn new(
        candidate: Candidate,
        substitution: Substitution,
        dependencies: Vec<ResolvedDependency>,
    ) -> Self {
        ResolutionPlan {
            candidate,
            substitution,
            dependencies,
            back_reference: false,
        }
    }

    /// A node that reuses a value already under construction further up
    /// the tree, reachable through an enclosing lambda.
    pub(crate) fn back_reference(candidate: Candidate, substitution: Substitution) -> Self {
        ResolutionPlan {
            candidate,
            substitution,
            dependencies: Vec::new(),
            back_reference: true,
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Bindings applied to the candidate's type parameters.
    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    pub fn dependencies(&self) -> &[ResolvedDependency] {
        &self.dependencies
    }

    /// Produced type.
    pub fn ty(&self) -> &Type {
        self.candidate.ty()
    }

    pub fn declaration(&self) -> Option<&Arc<Declaration>> {
        self.candidate.declaration()
    }

    #[inline]
    pub fn is_back_reference(&self) -> bool {
        self.back_reference
    }

    /// Whether this node or anything below it is a back reference.
    pub fn contains_back_reference(&self) -> bool {
        self.back_reference
            || self.dependencies.iter().any(|dependency| match dependency {
                ResolvedDependency::Plan(plan) => plan.contains_back_reference(),
                ResolvedDependency::DefaultValue => false,
            })
    }
}

/// Resolved arguments for one call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallPlan {
    pub callee: Name,
    /// One entry per parameter, in declaration order.
    pub arguments: Vec<ResolvedDependency>,
}

impl CallPlan {
    pub fn visit<V: PlanVisitor + ?Sized>(&self, visitor: &mut V) {
        for (index, argument) in self.arguments.iter().enumerate() {
            match argument {
                ResolvedDependency::Plan(plan) => visitor.visit_plan(plan),
                ResolvedDependency::DefaultValue => visitor.visit_default_value(None, index),
            }
        }
    }
}

/// Plan traversal.
///
/// Override `visit_*` to observe nodes; call the `walk_*` function from an
/// override to keep descending.
pub trait PlanVisitor {
    fn visit_plan(&mut self, plan: &ResolutionPlan) {
        walk_plan(self, plan);
    }

    /// Called for every node once its dependencies have been visited.
    fn visit_node(&mut self, _plan: &ResolutionPlan) {}

    /// Dependency `index` of `parent` uses its default value. `parent` is
    /// `None` for call-site arguments.
    fn visit_default_value(&mut self, _parent: Option<&ResolutionPlan>, _index: usize) {}
}

pub fn walk_plan<V: PlanVisitor + ?Sized>(visitor: &mut V, plan: &ResolutionPlan) {
    for (index, dependency) in plan.dependencies.iter().enumerate() {
        match dependency {
            ResolvedDependency::Plan(child) => visitor.visit_plan(child),
            ResolvedDependency::DefaultValue => visitor.visit_default_value(Some(plan), index),
        }
    }
    visitor.visit_node(plan);
}

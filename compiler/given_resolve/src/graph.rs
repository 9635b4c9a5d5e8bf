//! Declaration graph: the injectables visible from each scope of a request.
//!
//! # Structure
//!
//! One [`ScopeNode`] per non-empty frame of the [`ContextPath`], linked to
//! its parent. Nesting grows by one per node, so the innermost scope has the
//! largest nesting; a candidate's distance from the request is the request
//! scope's nesting minus its owner's.
//!
//! # Add-on expansion
//!
//! Add-on rules are not candidates themselves. When a node is built, every
//! add-on rule visible from it is inferred against every injectable type in
//! the chain ([`run_add_on_inference`]). A match yields a specialized
//! declaration that becomes an ordinary injectable of the node, and its
//! produced type is fed back to the rules, so chains such as
//! `@Tag1 Foo -> @Tag2 Foo -> Foo` are derived up front.
//!
//! Termination: each rule remembers the types it was tried against (the set
//! is inherited by child nodes), and a rule is never applied to a type that
//! was itself derived through that rule.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

use given_ir::Name;
use given_types::{
    run_add_on_inference, run_candidate_inference, ClassifierId, Classifiers, Type,
};

use crate::{CallContext, Candidate, ContextPath, Declaration, ScopeFrame, ScopeKind};

/// Index of a node in a [`DeclarationGraph`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        ScopeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct AddOnRule {
    declaration: Arc<Declaration>,
    /// The add-on type parameter, as a type.
    constraint: Type,
    processed: FxHashSet<Type>,
}

/// One scope of the graph.
#[derive(Clone, Debug)]
pub struct ScopeNode {
    id: ScopeId,
    name: Name,
    kind: ScopeKind,
    parent: Option<ScopeId>,
    nesting: u32,
    /// Own injectables, including those derived by add-on rules here.
    injectables: Vec<Arc<Declaration>>,
    add_ons: Vec<AddOnRule>,
    /// Rigid type parameters of this scope and all ancestors.
    static_type_parameters: Vec<ClassifierId>,
    /// Component scopes active in this scope and all ancestors.
    component_scopes: Vec<Name>,
    call_context: CallContext,
}

impl ScopeNode {
    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    #[inline]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    #[inline]
    pub fn nesting(&self) -> u32 {
        self.nesting
    }

    pub fn injectables(&self) -> &[Arc<Declaration>] {
        &self.injectables
    }

    /// Add-on rules visible from this scope.
    pub fn add_on_rules(&self) -> impl Iterator<Item = &Arc<Declaration>> {
        self.add_ons.iter().map(|rule| &rule.declaration)
    }

    pub fn static_type_parameters(&self) -> &[ClassifierId] {
        &self.static_type_parameters
    }

    pub fn component_scopes(&self) -> &[Name] {
        &self.component_scopes
    }

    #[inline]
    pub fn call_context(&self) -> CallContext {
        self.call_context
    }
}

/// Scopes of one request, outermost first.
#[derive(Clone, Debug)]
pub struct DeclarationGraph {
    scopes: Vec<Arc<ScopeNode>>,
    request_scope: ScopeId,
}

impl DeclarationGraph {
    /// Build the graph for `path`.
    ///
    /// Frames that contribute nothing are folded into their parent, so they
    /// do not count towards nesting. An empty path yields a single empty
    /// root scope.
    #[tracing::instrument(level = "debug", skip_all, fields(frames = path.frames().len()))]
    pub fn build(classifiers: &Classifiers, path: &ContextPath) -> Self {
        let mut graph = DeclarationGraph {
            scopes: Vec::new(),
            request_scope: ScopeId(0),
        };

        for frame in path.frames().iter().rev() {
            if frame.is_empty() && !graph.scopes.is_empty() {
                continue;
            }
            let parent = graph.scopes.last().map(|s| s.id);
            graph.request_scope = graph.push_scope(classifiers, parent, frame);
        }
        if graph.scopes.is_empty() {
            let root = ScopeFrame::new(Name::EMPTY, ScopeKind::InternalGlobal);
            graph.request_scope = graph.push_scope(classifiers, None, &root);
        }

        debug!(
            scopes = graph.scopes.len(),
            injectables = graph.scopes.iter().map(|s| s.injectables.len()).sum::<usize>(),
            "built declaration graph"
        );
        graph
    }

    /// Innermost scope of the path the graph was built from.
    #[inline]
    pub fn request_scope(&self) -> ScopeId {
        self.request_scope
    }

    /// `None` for ids that did not come from this graph.
    #[inline]
    pub fn scope(&self, id: ScopeId) -> Option<&ScopeNode> {
        self.scopes.get(id.index()).map(Arc::as_ref)
    }

    /// A scope this graph handed out.
    #[inline]
    pub(crate) fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// `scope` and its ancestors, outermost first.
    pub fn chain(&self, scope: ScopeId) -> Vec<&ScopeNode> {
        let mut chain = Vec::new();
        let mut current = self.scope(scope);
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.map(|parent| self.node(parent));
        }
        chain.reverse();
        chain
    }

    /// Add a scope below `parent`, e.g. for the parameters of a lambda.
    pub(crate) fn add_child_scope(
        &mut self,
        classifiers: &Classifiers,
        parent: ScopeId,
        frame: &ScopeFrame,
    ) -> ScopeId {
        self.push_scope(classifiers, Some(parent), frame)
    }

    fn push_scope(
        &mut self,
        classifiers: &Classifiers,
        parent: Option<ScopeId>,
        frame: &ScopeFrame,
    ) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        let parent_node = parent.map(|p| Arc::clone(&self.scopes[p.index()]));

        let mut static_type_parameters = parent_node
            .as_ref()
            .map(|p| p.static_type_parameters.clone())
            .unwrap_or_default();
        for &parameter in &frame.type_parameters {
            if !static_type_parameters.contains(&parameter) {
                static_type_parameters.push(parameter);
            }
        }

        let mut component_scopes = parent_node
            .as_ref()
            .map(|p| p.component_scopes.clone())
            .unwrap_or_default();
        component_scopes.extend(frame.component_scope);

        let call_context = frame
            .call_context
            .or_else(|| parent_node.as_ref().map(|p| p.call_context))
            .unwrap_or_default();

        let mut add_ons = parent_node
            .as_ref()
            .map(|p| p.add_ons.clone())
            .unwrap_or_default();
        let mut injectables = Vec::new();
        for declaration in &frame.injectables {
            if let Some(parameter) = declaration.add_on_parameter(classifiers) {
                add_ons.push(AddOnRule {
                    declaration: Arc::clone(declaration),
                    constraint: classifiers.default_type(parameter),
                    processed: FxHashSet::default(),
                });
            } else {
                injectables.push(Arc::clone(declaration));
            }
        }

        let mut node = ScopeNode {
            id,
            name: frame.name,
            kind: frame.kind,
            parent,
            nesting: parent_node.as_ref().map_or(0, |p| p.nesting + 1),
            injectables,
            add_ons,
            static_type_parameters,
            component_scopes,
            call_context,
        };

        let mut visible: Vec<Type> = parent
            .map(|p| {
                self.chain(p)
                    .iter()
                    .flat_map(|s| s.injectables.iter().map(|d| d.ty().clone()))
                    .collect()
            })
            .unwrap_or_default();
        visible.extend(node.injectables.iter().map(|d| d.ty().clone()));
        expand_add_ons(classifiers, &mut node, visible);

        self.scopes.push(Arc::new(node));
        id
    }

    /// Injectables visible from `scope` whose produced type can satisfy
    /// `requested`, specialized with the inferred bindings.
    ///
    /// Ancestors come first; each candidate is paired with its distance
    /// from `scope`. `List` requests have no user candidates, they are
    /// always assembled from elements.
    #[tracing::instrument(level = "trace", skip_all, fields(scope = scope.raw()))]
    pub fn candidates_for(
        &self,
        classifiers: &Classifiers,
        scope: ScopeId,
        requested: &Type,
    ) -> Vec<(Candidate, u32)> {
        if requested.classifier() == ClassifierId::LIST {
            return Vec::new();
        }
        let Some(node) = self.scope(scope) else {
            return Vec::new();
        };
        let mut candidates = Vec::new();
        for owner in self.chain(scope) {
            for declaration in &owner.injectables {
                let Some(candidate) =
                    specialize(classifiers, declaration, requested, &node.static_type_parameters, owner.id)
                else {
                    trace!(
                        candidate = %declaration.ty().display(classifiers),
                        "candidate does not match"
                    );
                    continue;
                };
                candidates.push((candidate, node.nesting - owner.nesting));
            }
        }
        candidates
    }

    /// Injectables visible from `scope` that produce `element` or a
    /// `Collection<element>`.
    pub fn list_elements_for(
        &self,
        classifiers: &Classifiers,
        scope: ScopeId,
        element: &Type,
    ) -> Vec<Candidate> {
        let Some(node) = self.scope(scope) else {
            return Vec::new();
        };
        let collection = classifiers.collection_type(element.clone());
        let mut elements = Vec::new();
        for owner in self.chain(scope) {
            for declaration in &owner.injectables {
                let statics = &node.static_type_parameters;
                if let Some(candidate) = specialize(classifiers, declaration, element, statics, owner.id)
                    .or_else(|| specialize(classifiers, declaration, &collection, statics, owner.id))
                {
                    elements.push(candidate);
                }
            }
        }
        elements
    }
}

fn specialize(
    classifiers: &Classifiers,
    declaration: &Arc<Declaration>,
    requested: &Type,
    static_type_parameters: &[ClassifierId],
    owner: ScopeId,
) -> Option<Candidate> {
    let context = run_candidate_inference(
        classifiers,
        declaration.ty(),
        requested,
        static_type_parameters,
        false,
    );
    if !context.is_ok() {
        return None;
    }
    let substitution = context.into_fixed_type_variables();
    let declaration = if substitution.is_empty() {
        Arc::clone(declaration)
    } else {
        Arc::new(declaration.substitute(&substitution))
    };
    Some(Candidate::Declared {
        declaration,
        substitution,
        scope: owner,
    })
}

/// Run every add-on rule of `node` to a fixed point, starting from the
/// `visible` injectable types.
fn expand_add_ons(classifiers: &Classifiers, node: &mut ScopeNode, visible: Vec<Type>) {
    if node.add_ons.is_empty() {
        return;
    }

    // Each type carries the rules it was derived through.
    let mut worklist: Vec<(Type, SmallVec<[usize; 4]>)> =
        visible.into_iter().rev().map(|ty| (ty, SmallVec::new())).collect();

    while let Some((ty, derived_through)) = worklist.pop() {
        for index in 0..node.add_ons.len() {
            if derived_through.contains(&index) {
                continue;
            }
            let rule = &mut node.add_ons[index];
            if !rule.processed.insert(ty.clone()) {
                continue;
            }
            let context = run_add_on_inference(
                classifiers,
                &rule.constraint,
                &ty,
                &node.static_type_parameters,
            );
            if !context.is_ok() {
                continue;
            }

            let derived = Arc::new(rule.declaration.substitute(context.fixed_type_variables()));
            debug!(
                rule = ?derived.id(),
                input = %ty.display(classifiers),
                output = %derived.ty().display(classifiers),
                "add-on rule applied"
            );

            // Child scopes inherit `processed`; never feed a rule its own output.
            rule.processed.insert(derived.ty().clone());
            let mut chain = derived_through.clone();
            chain.push(index);
            worklist.push((derived.ty().clone(), chain));
            node.injectables.push(derived);
        }
    }
}

//! What a plan node constructs its value through.

use std::sync::Arc;

use given_ir::Name;
use given_types::{Substitution, Type};

use crate::{CallContext, Declaration, ScopeId, Via};

/// A way to obtain a value of the requested type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// A collected declaration, specialized for the request.
    Declared {
        declaration: Arc<Declaration>,
        substitution: Substitution,
        /// Scope that owns the declaration.
        scope: ScopeId,
    },
    /// A lambda built by the engine: its parameters are injectables of the
    /// child `scope`, its body is the resolved return type.
    Lambda {
        ty: Type,
        parameters: Vec<Arc<Declaration>>,
        scope: ScopeId,
        /// Scope the lambda was requested from.
        owner: ScopeId,
    },
    /// Every injectable matching `element` (or `Collection<element>`),
    /// collected into a list.
    List {
        ty: Type,
        element: Type,
        elements: Vec<Candidate>,
        owner: ScopeId,
    },
}

impl Candidate {
    /// Type of the value this candidate produces.
    pub fn ty(&self) -> &Type {
        match self {
            Candidate::Declared { declaration, .. } => declaration.ty(),
            Candidate::Lambda { ty, .. } | Candidate::List { ty, .. } => ty,
        }
    }

    /// Scope whose nesting ranks this candidate.
    pub fn owner_scope(&self) -> ScopeId {
        match self {
            Candidate::Declared { scope, .. } => *scope,
            Candidate::Lambda { owner, .. } | Candidate::List { owner, .. } => *owner,
        }
    }

    pub fn declaration(&self) -> Option<&Arc<Declaration>> {
        match self {
            Candidate::Declared { declaration, .. } => Some(declaration),
            Candidate::Lambda { .. } | Candidate::List { .. } => None,
        }
    }

    pub fn substitution(&self) -> Option<&Substitution> {
        match self {
            Candidate::Declared { substitution, .. } => Some(substitution),
            Candidate::Lambda { .. } | Candidate::List { .. } => None,
        }
    }

    /// Declared type before specialization; used to rank specificity.
    pub(crate) fn original_ty(&self) -> Option<&Type> {
        self.declaration().map(|d| d.original_ty())
    }

    pub(crate) fn dispatch_receiver(&self) -> Option<&Type> {
        self.declaration().and_then(|d| d.dispatch_receiver())
    }

    pub fn call_context(&self) -> CallContext {
        self.declaration()
            .map_or(CallContext::Default, |d| d.call_context())
    }

    pub fn target_scope(&self) -> Option<Name> {
        self.declaration().and_then(|d| d.target_scope())
    }

    pub(crate) fn via(&self) -> Via {
        match self {
            Candidate::Declared { declaration, .. } => Via::Declaration {
                id: declaration.id(),
                origin: declaration.origin(),
            },
            Candidate::Lambda { .. } => Via::Lambda,
            Candidate::List { .. } => Via::List,
        }
    }
}

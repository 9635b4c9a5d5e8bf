//! Context paths: the scopes visible from one call site.

use std::sync::Arc;

use given_ir::Name;
use given_types::ClassifierId;

use crate::{CallContext, Declaration};

/// What kind of region a scope frame stands for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScopeKind {
    /// Injectables of dependencies of the compilation unit.
    ExternalGlobal,
    /// Injectables of the compilation unit itself.
    InternalGlobal,
    File,
    Class,
    Companion,
    Function,
    Property,
    Block,
    /// Parameters of a lambda built by the engine.
    Lambda,
}

/// One enclosing scope of a call site.
#[derive(Clone, Debug)]
#[must_use]
pub struct ScopeFrame {
    pub name: Name,
    pub kind: ScopeKind,
    pub injectables: Vec<Arc<Declaration>>,
    /// Type parameters that stay rigid inside this scope.
    pub type_parameters: Vec<ClassifierId>,
    /// Component scope this frame activates.
    pub component_scope: Option<Name>,
    /// Calling convention of code in this frame; inherited when `None`.
    pub call_context: Option<CallContext>,
}

impl ScopeFrame {
    pub fn new(name: Name, kind: ScopeKind) -> Self {
        ScopeFrame {
            name,
            kind,
            injectables: Vec::new(),
            type_parameters: Vec::new(),
            component_scope: None,
            call_context: None,
        }
    }

    pub fn with_injectable(mut self, declaration: Arc<Declaration>) -> Self {
        self.injectables.push(declaration);
        self
    }

    pub fn with_injectables(mut self, declarations: impl IntoIterator<Item = Arc<Declaration>>) -> Self {
        self.injectables.extend(declarations);
        self
    }

    pub fn with_type_parameters(mut self, parameters: impl IntoIterator<Item = ClassifierId>) -> Self {
        self.type_parameters.extend(parameters);
        self
    }

    pub fn with_component_scope(mut self, scope: Name) -> Self {
        self.component_scope = Some(scope);
        self
    }

    pub fn with_call_context(mut self, call_context: CallContext) -> Self {
        self.call_context = Some(call_context);
        self
    }

    /// Whether the frame contributes nothing a graph node would record.
    pub(crate) fn is_empty(&self) -> bool {
        self.injectables.is_empty()
            && self.type_parameters.is_empty()
            && self.component_scope.is_none()
            && self.call_context.is_none()
    }
}

/// Ordered scopes of a call site, innermost first.
#[derive(Clone, Debug, Default)]
pub struct ContextPath {
    frames: Vec<ScopeFrame>,
}

impl ContextPath {
    pub fn from_innermost(frames: Vec<ScopeFrame>) -> Self {
        ContextPath { frames }
    }

    /// Build a path from frames listed outermost first, the order scopes
    /// are usually entered in.
    pub fn from_outermost(mut frames: Vec<ScopeFrame>) -> Self {
        frames.reverse();
        ContextPath { frames }
    }

    /// Frames, innermost first.
    pub fn frames(&self) -> &[ScopeFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

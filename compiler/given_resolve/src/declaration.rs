//! Injectable declarations.
//!
//! A [`Declaration`] is everything the engine needs about one producer: the
//! type it produces, the dependencies it needs, and the constraints on where
//! and from what it may be called. Declarations are built once by the
//! collection collaborator (through [`DeclarationBuilder`]) and shared as
//! `Arc<Declaration>`; the engine never mutates them. Generic candidates are
//! specialized with [`Declaration::substitute`], which returns a new
//! declaration keeping the original id.

use std::sync::Arc;

use given_ir::{DeclId, Name};
use given_types::{ClassifierFlags, ClassifierId, Classifiers, Substitution, Type};

/// Call shape of a declaration.
///
/// The engine treats every kind the same way; emission decides from the
/// kind how to construct the value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeclarationKind {
    /// Top-level or member function.
    Function,
    /// Property read.
    Property,
    /// Primary or secondary constructor of `class`.
    Constructor { class: ClassifierId },
    /// Value parameter of an enclosing function or lambda.
    ValueParameter { index: u32 },
    /// Extension or dispatch receiver of an enclosing function.
    Receiver,
    /// Object instance.
    Object,
}

/// Calling convention a producer requires from its caller.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CallContext {
    #[default]
    Default,
    Suspend,
    Composable,
}

impl CallContext {
    /// Whether code running in `self` may call a producer declared with
    /// `callee`.
    #[inline]
    pub fn can_call(self, callee: CallContext) -> bool {
        callee == CallContext::Default || self == callee
    }
}

/// One parameter a declaration needs resolved.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Dependency {
    pub name: Name,
    pub ty: Type,
    /// The call site declares a default for this parameter, so an
    /// unresolvable type falls back to it.
    pub has_default: bool,
}

impl Dependency {
    pub fn new(name: Name, ty: Type) -> Self {
        Dependency {
            name,
            ty,
            has_default: false,
        }
    }

    pub fn with_default(name: Name, ty: Type) -> Self {
        Dependency {
            name,
            ty,
            has_default: true,
        }
    }

    fn substitute(&self, map: &Substitution) -> Dependency {
        Dependency {
            name: self.name,
            ty: self.ty.substitute(map),
            has_default: self.has_default,
        }
    }
}

/// A producer of a value.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Declaration {
    id: DeclId,
    origin: Name,
    kind: DeclarationKind,
    ty: Type,
    original_ty: Type,
    dependencies: Vec<Dependency>,
    type_parameters: Vec<ClassifierId>,
    target_scope: Option<Name>,
    call_context: CallContext,
    dispatch_receiver: Option<Type>,
    is_add_on: bool,
}

impl Declaration {
    /// Start describing a declaration producing `ty`.
    pub fn builder(id: DeclId, origin: Name, kind: DeclarationKind, ty: Type) -> DeclarationBuilder {
        DeclarationBuilder {
            declaration: Declaration {
                id,
                origin,
                kind,
                original_ty: ty.clone(),
                ty,
                dependencies: Vec::new(),
                type_parameters: Vec::new(),
                target_scope: None,
                call_context: CallContext::Default,
                dispatch_receiver: None,
                is_add_on: false,
            },
        }
    }

    #[inline]
    pub fn id(&self) -> DeclId {
        self.id
    }

    /// Fully qualified name of the source declaration.
    #[inline]
    pub fn origin(&self) -> Name {
        self.origin
    }

    #[inline]
    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// Produced type, after any substitution applied so far.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Produced type as declared, before substitution.
    #[inline]
    pub fn original_ty(&self) -> &Type {
        &self.original_ty
    }

    #[inline]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Type parameters still free in this declaration.
    #[inline]
    pub fn type_parameters(&self) -> &[ClassifierId] {
        &self.type_parameters
    }

    #[inline]
    pub fn target_scope(&self) -> Option<Name> {
        self.target_scope
    }

    #[inline]
    pub fn call_context(&self) -> CallContext {
        self.call_context
    }

    #[inline]
    pub fn dispatch_receiver(&self) -> Option<&Type> {
        self.dispatch_receiver.as_ref()
    }

    /// Whether this is an add-on rule: one of its type parameters carries
    /// [`ClassifierFlags::ADD_ON`].
    #[inline]
    pub fn is_add_on(&self) -> bool {
        self.is_add_on
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// The type parameter marking this declaration as an add-on rule.
    pub fn add_on_parameter(&self, classifiers: &Classifiers) -> Option<ClassifierId> {
        self.type_parameters
            .iter()
            .copied()
            .find(|&p| classifiers.flags(p).contains(ClassifierFlags::ADD_ON))
    }

    /// Specialize with `map`.
    ///
    /// Bound type parameters disappear from [`Declaration::type_parameters`].
    /// The result keeps this declaration's id and original type and is never
    /// an add-on rule.
    pub fn substitute(&self, map: &Substitution) -> Declaration {
        if map.is_empty() {
            return self.clone();
        }
        Declaration {
            id: self.id,
            origin: self.origin,
            kind: self.kind,
            ty: self.ty.substitute(map),
            original_ty: self.original_ty.clone(),
            dependencies: self.dependencies.iter().map(|d| d.substitute(map)).collect(),
            type_parameters: self
                .type_parameters
                .iter()
                .copied()
                .filter(|p| !map.contains_key(p))
                .collect(),
            target_scope: self.target_scope,
            call_context: self.call_context,
            dispatch_receiver: self.dispatch_receiver.as_ref().map(|t| t.substitute(map)),
            is_add_on: false,
        }
    }
}

/// Incremental construction of a [`Declaration`].
#[must_use]
pub struct DeclarationBuilder {
    declaration: Declaration,
}

impl DeclarationBuilder {
    pub fn dependency(mut self, name: Name, ty: Type) -> Self {
        self.declaration.dependencies.push(Dependency::new(name, ty));
        self
    }

    /// A dependency whose parameter declares a default value.
    pub fn default_dependency(mut self, name: Name, ty: Type) -> Self {
        self.declaration
            .dependencies
            .push(Dependency::with_default(name, ty));
        self
    }

    pub fn type_parameters(mut self, parameters: impl IntoIterator<Item = ClassifierId>) -> Self {
        self.declaration.type_parameters.extend(parameters);
        self
    }

    /// Restrict the declaration to chains where component scope `scope` is
    /// active.
    pub fn target_scope(mut self, scope: Name) -> Self {
        self.declaration.target_scope = Some(scope);
        self
    }

    pub fn call_context(mut self, call_context: CallContext) -> Self {
        self.declaration.call_context = call_context;
        self
    }

    /// Owner type of a member declaration.
    pub fn dispatch_receiver(mut self, owner: Type) -> Self {
        self.declaration.dispatch_receiver = Some(owner);
        self
    }

    pub fn finish(mut self, classifiers: &Classifiers) -> Arc<Declaration> {
        self.declaration.is_add_on = self.declaration.add_on_parameter(classifiers).is_some();
        Arc::new(self.declaration)
    }
}

//! Declarations and classifiers shared by the unit tests.

use std::sync::Arc;

use given_ir::{DeclId, Name, StringInterner};
use given_types::{ClassifierFlags, ClassifierId, Classifiers, Type, Variance};

use crate::{Declaration, DeclarationBuilder, DeclarationKind};

pub(crate) struct World {
    pub classifiers: Classifiers,
    pub foo: ClassifierId,
    /// `Bar : Foo`
    pub bar: ClassifierId,
    pub string: ClassifierId,
    /// `Set<T>` (invariant)
    pub set: ClassifierId,
    /// `Box<out T>`
    pub boxed: ClassifierId,
    pub tag_a: ClassifierId,
    pub tag_b: ClassifierId,
    next_decl: u32,
}

impl World {
    pub fn new() -> Self {
        let mut classifiers = Classifiers::new(Arc::new(StringInterner::new()));
        let foo = classifiers.add_class("app.Foo", Vec::new(), ClassifierFlags::empty());
        let bar = classifiers.add_class("app.Bar", Vec::new(), ClassifierFlags::empty());
        classifiers.set_super_types(bar, vec![classifiers.default_type(foo)]);
        let string = classifiers.add_class("std.String", Vec::new(), ClassifierFlags::empty());
        let set_t = classifiers.add_type_parameter("app.Set.T", Variance::Invariant);
        let set = classifiers.add_class("app.Set", vec![set_t], ClassifierFlags::empty());
        let box_t = classifiers.add_type_parameter("app.Box.T", Variance::Out);
        let boxed = classifiers.add_class("app.Box", vec![box_t], ClassifierFlags::empty());
        let tag_a = classifiers.add_tag("app.TagA", Vec::new());
        let tag_b = classifiers.add_tag("app.TagB", Vec::new());

        World {
            classifiers,
            foo,
            bar,
            string,
            set,
            boxed,
            tag_a,
            tag_b,
            next_decl: 0,
        }
    }

    pub fn ty(&self, id: ClassifierId) -> Type {
        self.classifiers.default_type(id)
    }

    pub fn apply(&self, id: ClassifierId, args: Vec<Type>) -> Type {
        self.classifiers
            .apply(id, args)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn tagged(&self, tag: ClassifierId, inner: &Type) -> Type {
        inner
            .wrap(&self.classifiers, &self.ty(tag))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn name(&self, s: &str) -> Name {
        self.classifiers.interner().intern(s)
    }

    pub fn type_parameter(&mut self, key: &str) -> ClassifierId {
        self.classifiers.add_type_parameter(key, Variance::Invariant)
    }

    /// An add-on type parameter bounded by `bound`.
    pub fn add_on_parameter(&mut self, key: &str, bound: Type) -> ClassifierId {
        let parameter = self.classifiers.add_add_on_type_parameter(key);
        self.classifiers.set_super_types(parameter, vec![bound]);
        parameter
    }

    pub fn declaration(&mut self, origin: &str, kind: DeclarationKind, ty: Type) -> DeclarationBuilder {
        let id = DeclId::new(self.next_decl);
        self.next_decl += 1;
        Declaration::builder(id, self.name(origin), kind, ty)
    }

    pub fn function(&mut self, origin: &str, ty: Type) -> DeclarationBuilder {
        self.declaration(origin, DeclarationKind::Function, ty)
    }

    /// A function without dependencies.
    pub fn leaf(&mut self, origin: &str, ty: Type) -> Arc<Declaration> {
        self.function(origin, ty).finish(&self.classifiers)
    }
}

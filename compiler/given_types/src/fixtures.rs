//! Shared classifier universe for unit tests.

use std::sync::Arc;

use given_ir::StringInterner;

use crate::{ClassifierFlags, ClassifierId, Classifiers, Type, Variance};

pub(crate) struct World {
    pub classifiers: Classifiers,
    pub foo: ClassifierId,
    /// `Bar : Foo`
    pub bar: ClassifierId,
    pub string: ClassifierId,
    /// `Box<out T>`
    pub boxed: ClassifierId,
    /// `Set<T>` (invariant)
    pub set: ClassifierId,
    /// `Sink<in T>`
    pub sink: ClassifierId,
    pub tag_a: ClassifierId,
    pub tag_b: ClassifierId,
}

impl World {
    pub fn new() -> Self {
        let mut classifiers = Classifiers::new(Arc::new(StringInterner::new()));
        let foo = classifiers.add_class("pkg.Foo", Vec::new(), ClassifierFlags::empty());
        let bar = classifiers.add_class("pkg.Bar", Vec::new(), ClassifierFlags::empty());
        classifiers.set_super_types(bar, vec![classifiers.default_type(foo)]);
        let string = classifiers.add_class("std.String", Vec::new(), ClassifierFlags::empty());

        let box_t = classifiers.add_type_parameter("pkg.Box.T", Variance::Out);
        let boxed = classifiers.add_class("pkg.Box", vec![box_t], ClassifierFlags::empty());
        let set_t = classifiers.add_type_parameter("pkg.Set.T", Variance::Invariant);
        let set = classifiers.add_class("pkg.Set", vec![set_t], ClassifierFlags::empty());
        let sink_t = classifiers.add_type_parameter("pkg.Sink.T", Variance::In);
        let sink = classifiers.add_class("pkg.Sink", vec![sink_t], ClassifierFlags::empty());

        let tag_a = classifiers.add_tag("pkg.TagA", Vec::new());
        let tag_b = classifiers.add_tag("pkg.TagB", Vec::new());

        World {
            classifiers,
            foo,
            bar,
            string,
            boxed,
            set,
            sink,
            tag_a,
            tag_b,
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

    pub fn type_parameter(&mut self, key: &str) -> ClassifierId {
        self.classifiers.add_type_parameter(key, Variance::Invariant)
    }
}

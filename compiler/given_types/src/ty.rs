//! Type values.
//!
//! A [`Type`] is an immutable value: a classifier, nullability, type
//! arguments, use-site variance and a star-projection flag. Arguments are
//! shared (`Arc<[Type]>`), so cloning a type is cheap and substitution only
//! allocates along the rewritten path.
//!
//! # Tags
//!
//! A tag is an ordinary classifier flagged [`ClassifierFlags::TAG`] whose
//! last type argument is the wrapped type. `@A @B Foo` is `A<B<Foo>>`, so tag
//! identity takes part in equality and subtyping for free.
//!
//! [`ClassifierFlags::TAG`]: crate::ClassifierFlags::TAG

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ClassifierId, Classifiers, Variance};

/// Mapping from type-parameter classifier to its replacement.
pub type Substitution = FxHashMap<ClassifierId, Type>;

/// Error constructing a type.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TypeError {
    /// Argument count differs from the classifier's arity.
    #[error("wrong number of type arguments for {classifier:?}: expected {expected}, found {found}")]
    Arity {
        classifier: ClassifierId,
        expected: usize,
        found: usize,
    },
    /// `wrap` was given something that is not a tag.
    #[error("{classifier:?} is not a tag")]
    NotATag { classifier: ClassifierId },
}

/// An immutable type value.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Type {
    classifier: ClassifierId,
    nullable: bool,
    args: Arc<[Type]>,
    variance: Variance,
    star: bool,
}

impl Type {
    /// Internal constructor; callers are responsible for the arity.
    pub(crate) fn from_parts(classifier: ClassifierId, nullable: bool, args: Vec<Type>) -> Self {
        Type {
            classifier,
            nullable,
            args: args.into(),
            variance: Variance::Invariant,
            star: false,
        }
    }

    /// `Any`.
    pub fn any() -> Self {
        Self::from_parts(ClassifierId::ANY, false, Vec::new())
    }

    /// `Any?`.
    pub fn nullable_any() -> Self {
        Self::from_parts(ClassifierId::ANY, true, Vec::new())
    }

    /// `Nothing`.
    pub fn nothing() -> Self {
        Self::from_parts(ClassifierId::NOTHING, false, Vec::new())
    }

    /// The star projection `*`.
    pub fn star() -> Self {
        Type {
            classifier: ClassifierId::ANY,
            nullable: true,
            args: Arc::from(Vec::new()),
            variance: Variance::Invariant,
            star: true,
        }
    }

    #[inline]
    pub fn classifier(&self) -> ClassifierId {
        self.classifier
    }

    #[inline]
    pub fn is_marked_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn arguments(&self) -> &[Type] {
        &self.args
    }

    #[inline]
    pub fn variance(&self) -> Variance {
        self.variance
    }

    #[inline]
    pub fn is_star_projection(&self) -> bool {
        self.star
    }

    /// Same classifier with new arguments.
    pub fn with_arguments(
        &self,
        classifiers: &Classifiers,
        args: Vec<Type>,
    ) -> Result<Type, TypeError> {
        let expected = classifiers.get(self.classifier).arity();
        if args.len() != expected {
            return Err(TypeError::Arity {
                classifier: self.classifier,
                expected,
                found: args.len(),
            });
        }
        Ok(self.replace_arguments(args))
    }

    fn replace_arguments(&self, args: Vec<Type>) -> Type {
        if *self.args == *args {
            return self.clone();
        }
        Type {
            args: args.into(),
            ..self.clone()
        }
    }

    pub fn nullable(&self) -> Type {
        self.with_nullability(true)
    }

    pub fn non_null(&self) -> Type {
        self.with_nullability(false)
    }

    pub fn with_nullability(&self, nullable: bool) -> Type {
        if self.nullable == nullable {
            return self.clone();
        }
        Type {
            nullable,
            ..self.clone()
        }
    }

    pub fn with_variance(&self, variance: Variance) -> Type {
        if self.variance == variance {
            return self.clone();
        }
        Type {
            variance,
            ..self.clone()
        }
    }

    /// Replace type parameters found in `map`.
    ///
    /// A replaced parameter keeps its own nullability (`T?` with `T := Foo`
    /// yields `Foo?`) and its use-site variance unless the replacement carries
    /// one.
    pub fn substitute(&self, map: &Substitution) -> Type {
        if map.is_empty() || self.star {
            return self.clone();
        }

        if let Some(replacement) = map.get(&self.classifier) {
            let nullable = self.nullable || replacement.nullable;
            let variance = if replacement.variance == Variance::Invariant {
                self.variance
            } else {
                replacement.variance
            };
            return replacement.with_nullability(nullable).with_variance(variance);
        }

        if self.args.is_empty() {
            return self.clone();
        }

        let args: Vec<Type> = self.args.iter().map(|arg| arg.substitute(map)).collect();
        self.replace_arguments(args)
    }

    /// Wrap `self` in `tag`.
    ///
    /// `tag` may carry its wrapped slot or omit it; either way the slot ends
    /// up holding `self`.
    pub fn wrap(&self, classifiers: &Classifiers, tag: &Type) -> Result<Type, TypeError> {
        let data = classifiers.get(tag.classifier);
        if !data.is_tag() {
            return Err(TypeError::NotATag {
                classifier: tag.classifier,
            });
        }
        let mut args = tag.args.to_vec();
        if args.len() >= data.arity() {
            args.pop();
        }
        args.push(self.clone());
        tag.with_arguments(classifiers, args)
    }

    /// Peel one tag layer.
    ///
    /// Returns the tag (with its wrapped slot replaced by `*`) and the
    /// wrapped type, or `None` and `self` if this is not a tagged type.
    pub fn unwrap(&self, classifiers: &Classifiers) -> (Option<Type>, Type) {
        if !classifiers.is_tag(self.classifier) {
            return (None, self.clone());
        }
        let Some((inner, rest)) = self.args.split_last() else {
            return (None, self.clone());
        };
        let mut args = rest.to_vec();
        args.push(Type::star());
        (Some(self.replace_arguments(args)), inner.clone())
    }

    /// The innermost untagged type.
    pub fn unwrap_tags(&self, classifiers: &Classifiers) -> &Type {
        let mut current = self;
        while classifiers.is_tag(current.classifier) {
            match current.args.last() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// Tag layers, outermost first.
    pub fn tags(&self, classifiers: &Classifiers) -> Vec<ClassifierId> {
        let mut tags = Vec::new();
        let mut current = self;
        while classifiers.is_tag(current.classifier) {
            tags.push(current.classifier);
            match current.args.last() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        tags
    }

    /// Declared super types with the classifier's parameters replaced by
    /// this type's arguments.
    ///
    /// Nullability follows `self`, except that a type parameter's nullable
    /// bound stays nullable.
    pub fn super_types(&self, classifiers: &Classifiers) -> Vec<Type> {
        let data = classifiers.get(self.classifier);
        if self.star {
            return Vec::new();
        }
        let keep_nullable_bound = data.is_type_parameter();
        let map: Substitution = data
            .type_parameters
            .iter()
            .copied()
            .zip(self.args.iter().cloned())
            .collect();
        data.super_types
            .iter()
            .map(|super_type| {
                let nullable = self.nullable || (keep_nullable_bound && super_type.nullable);
                super_type.substitute(&map).with_nullability(nullable)
            })
            .collect()
    }

    /// `self`, its arguments and its super types, transitively.
    pub fn all_types(&self, classifiers: &Classifiers) -> Vec<Type> {
        fn collect(ty: &Type, classifiers: &Classifiers, seen: &mut FxHashSet<Type>, out: &mut Vec<Type>) {
            if !seen.insert(ty.clone()) {
                return;
            }
            out.push(ty.clone());
            for arg in ty.args.iter() {
                collect(arg, classifiers, seen, out);
            }
            for super_type in ty.super_types(classifiers) {
                collect(&super_type, classifiers, seen, out);
            }
        }

        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        collect(self, classifiers, &mut seen, &mut out);
        out
    }

    /// Nesting depth of the argument tree; a type without arguments has
    /// depth 1.
    pub fn type_depth(&self) -> usize {
        self.args.iter().map(Type::type_depth).max().unwrap_or(0) + 1
    }

    /// Number of nodes in the argument tree, tags included.
    pub fn type_size(&self) -> usize {
        self.args.iter().map(Type::type_size).sum::<usize>() + 1
    }

    /// Every classifier mentioned by this type or its arguments.
    pub fn covering_set(&self) -> FxHashSet<ClassifierId> {
        fn collect(ty: &Type, out: &mut FxHashSet<ClassifierId>) {
            out.insert(ty.classifier);
            for arg in ty.args.iter() {
                collect(arg, out);
            }
        }

        let mut out = FxHashSet::default();
        collect(self, &mut out);
        out
    }

    /// Whether `pred` holds for `self` or any nested argument.
    pub fn any_type(&self, pred: &mut impl FnMut(&Type) -> bool) -> bool {
        pred(self) || self.args.iter().any(|arg| arg.any_type(pred))
    }

    /// Whether `pred` holds for `self` or any transitive super type.
    pub fn any_super_type(
        &self,
        classifiers: &Classifiers,
        pred: &mut impl FnMut(&Type) -> bool,
    ) -> bool {
        fn walk(
            ty: &Type,
            classifiers: &Classifiers,
            seen: &mut FxHashSet<ClassifierId>,
            pred: &mut impl FnMut(&Type) -> bool,
        ) -> bool {
            if pred(ty) {
                return true;
            }
            if !seen.insert(ty.classifier) {
                return false;
            }
            ty.super_types(classifiers)
                .iter()
                .any(|super_type| walk(super_type, classifiers, seen, pred))
        }
        walk(self, classifiers, &mut FxHashSet::default(), pred)
    }

    /// Whether values of this type may be null: marked nullable, or some
    /// super type (bound) is.
    pub fn is_nullable_type(&self, classifiers: &Classifiers) -> bool {
        self.any_super_type(classifiers, &mut |ty| ty.nullable)
    }

    /// This type seen as an instance of `target`, found through the super
    /// type chain.
    ///
    /// The walk remembers every `(classifier, target)` pair it expanded, so
    /// self-referential bounds terminate.
    pub fn subtype_view(&self, classifiers: &Classifiers, target: ClassifierId) -> Option<Type> {
        fn walk(
            ty: &Type,
            classifiers: &Classifiers,
            target: ClassifierId,
            visited: &mut FxHashSet<(ClassifierId, ClassifierId)>,
        ) -> Option<Type> {
            if ty.classifier == target {
                return Some(ty.clone());
            }
            if !visited.insert((ty.classifier, target)) {
                return None;
            }
            ty.super_types(classifiers)
                .iter()
                .find_map(|super_type| walk(super_type, classifiers, target, visited))
        }
        if self.star {
            return None;
        }
        walk(self, classifiers, target, &mut FxHashSet::default())
    }

    /// Canonical string key, e.g. `pkg.Box<pkg.Foo>?`.
    pub fn key(&self, classifiers: &Classifiers) -> String {
        self.display(classifiers).to_string()
    }

    /// Adapter implementing `Display`.
    pub fn display<'a>(&'a self, classifiers: &'a Classifiers) -> TypeDisplay<'a> {
        TypeDisplay {
            ty: self,
            classifiers,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.star {
            return write!(f, "*");
        }
        match self.variance {
            Variance::In => write!(f, "in ")?,
            Variance::Out => write!(f, "out ")?,
            Variance::Invariant => {}
        }
        write!(f, "#{}", self.classifier.raw())?;
        if !self.args.is_empty() {
            f.debug_list().entries(self.args.iter()).finish()?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Renders a type with classifier keys.
pub struct TypeDisplay<'a> {
    ty: &'a Type,
    classifiers: &'a Classifiers,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.ty;
        if ty.star {
            return write!(f, "*");
        }
        f.write_str(self.classifiers.key(ty.classifier))?;
        if !ty.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in ty.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match arg.variance {
                    Variance::In => f.write_str("in ")?,
                    Variance::Out => f.write_str("out ")?,
                    Variance::Invariant => {}
                }
                write!(f, "{}", arg.display(self.classifiers))?;
            }
            f.write_str(">")?;
        }
        if ty.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

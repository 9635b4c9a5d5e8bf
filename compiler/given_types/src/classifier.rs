//! Classifier table.
//!
//! A classifier is anything a type can be built from: a class, an object,
//! a type parameter, a tag, a function arity. Classifiers are allocated once
//! during declaration collection and addressed by [`ClassifierId`].
//!
//! # Well-known classifiers
//!
//! The first slots of every table are fixed:
//!
//! | Id | Classifier |
//! |----|------------|
//! | 0 | `Any` (top) |
//! | 1 | `Nothing` (bottom) |
//! | 2 | `Collection<out E>` |
//! | 3 | `List<out E> : Collection<E>` |
//!
//! Function classifiers (`Function0`, `Function1`, ...) are created on demand
//! by [`Classifiers::function`].
//!
//! # Late-bound super types
//!
//! Super types (upper bounds for type parameters) are attached with
//! [`Classifiers::set_super_types`] after allocation. A bound may therefore
//! mention the parameter it bounds (`T : Comparable<T>`).

use std::fmt;

use bitflags::bitflags;
use given_ir::{Name, SharedInterner};
use rustc_hash::FxHashMap;

use crate::{Type, TypeError};

/// Handle to a classifier in a [`Classifiers`] table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ClassifierId(u32);

impl ClassifierId {
    /// The top type.
    pub const ANY: ClassifierId = ClassifierId(0);
    /// The bottom type.
    pub const NOTHING: ClassifierId = ClassifierId(1);
    /// `Collection<out E>`.
    pub const COLLECTION: ClassifierId = ClassifierId(2);
    /// `List<out E>`.
    pub const LIST: ClassifierId = ClassifierId(3);

    /// Number of pre-registered classifiers, including the element
    /// parameters of `Collection` and `List`.
    pub(crate) const PREDEFINED: u32 = 6;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ClassifierId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ANY => write!(f, "ClassifierId(Any)"),
            Self::NOTHING => write!(f, "ClassifierId(Nothing)"),
            Self::COLLECTION => write!(f, "ClassifierId(Collection)"),
            Self::LIST => write!(f, "ClassifierId(List)"),
            _ => write!(f, "ClassifierId({})", self.0),
        }
    }
}

bitflags! {
    /// What kind of classifier this is.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ClassifierFlags: u8 {
        /// A declared type parameter of a class or callable.
        const TYPE_PARAMETER = 1 << 0;
        /// A tag: a generic wrapper whose last type parameter is the
        /// wrapped type.
        const TAG = 1 << 1;
        /// A type parameter marking its declaration as an add-on rule.
        const ADD_ON = 1 << 2;
        /// A singleton object.
        const OBJECT = 1 << 3;
        /// A `FunctionN` classifier.
        const FUNCTION = 1 << 4;
    }
}

/// Declaration-site or use-site variance.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Variance {
    In,
    Out,
    #[default]
    Invariant,
}

impl Variance {
    /// Variance that actually applies to one argument position.
    ///
    /// Declared variance wins, then use-site variance, then the variance
    /// of the classifier's own parameter.
    #[inline]
    pub fn effective(declared: Variance, use_site: Variance, original: Variance) -> Variance {
        if declared != Variance::Invariant {
            return declared;
        }
        if use_site != Variance::Invariant {
            return use_site;
        }
        original
    }
}

/// Everything known about one classifier.
#[derive(Clone, Debug)]
pub struct ClassifierData {
    /// Globally unique key, e.g. `pkg.Foo` or `pkg.Foo.T`.
    pub key: Name,
    /// Ordered type parameters (themselves classifiers).
    pub type_parameters: Vec<ClassifierId>,
    /// Declared super types; upper bounds for type parameters.
    pub super_types: Vec<Type>,
    /// Declared variance (meaningful for type parameters).
    pub variance: Variance,
    pub flags: ClassifierFlags,
}

impl ClassifierData {
    #[inline]
    pub fn is_type_parameter(&self) -> bool {
        self.flags.contains(ClassifierFlags::TYPE_PARAMETER)
    }

    #[inline]
    pub fn is_tag(&self) -> bool {
        self.flags.contains(ClassifierFlags::TAG)
    }

    #[inline]
    pub fn is_add_on(&self) -> bool {
        self.flags.contains(ClassifierFlags::ADD_ON)
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.type_parameters.len()
    }
}

/// Table of all classifiers known to one compilation unit.
pub struct Classifiers {
    interner: SharedInterner,
    data: Vec<ClassifierData>,
    by_key: FxHashMap<Name, ClassifierId>,
    functions: FxHashMap<usize, ClassifierId>,
}

impl Classifiers {
    /// Create a table with the well-known classifiers registered.
    pub fn new(interner: SharedInterner) -> Self {
        let mut classifiers = Classifiers {
            interner,
            data: Vec::new(),
            by_key: FxHashMap::default(),
            functions: FxHashMap::default(),
        };

        let any = classifiers.push("Any", Vec::new(), Variance::Invariant, ClassifierFlags::empty());
        let nothing =
            classifiers.push("Nothing", Vec::new(), Variance::Invariant, ClassifierFlags::empty());
        let collection =
            classifiers.push("Collection", Vec::new(), Variance::Invariant, ClassifierFlags::empty());
        let list = classifiers.push("List", Vec::new(), Variance::Invariant, ClassifierFlags::empty());
        debug_assert_eq!(any, ClassifierId::ANY);
        debug_assert_eq!(nothing, ClassifierId::NOTHING);
        debug_assert_eq!(collection, ClassifierId::COLLECTION);
        debug_assert_eq!(list, ClassifierId::LIST);

        let collection_e = classifiers.add_type_parameter("Collection.E", Variance::Out);
        let list_e = classifiers.add_type_parameter("List.E", Variance::Out);
        classifiers.data[collection.index()].type_parameters = vec![collection_e];
        classifiers.data[list.index()].type_parameters = vec![list_e];

        let any_type = Type::any();
        classifiers.data[collection.index()].super_types = vec![any_type];
        classifiers.data[list.index()].super_types = vec![Type::from_parts(
            collection,
            false,
            vec![Type::from_parts(list_e, false, Vec::new())],
        )];
        debug_assert_eq!(classifiers.data.len(), ClassifierId::PREDEFINED as usize);

        classifiers
    }

    /// The interner backing classifier keys.
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    fn push(
        &mut self,
        key: &str,
        type_parameters: Vec<ClassifierId>,
        variance: Variance,
        flags: ClassifierFlags,
    ) -> ClassifierId {
        let key = self.interner.intern(key);
        let id = ClassifierId(u32::try_from(self.data.len()).unwrap_or(u32::MAX));
        self.data.push(ClassifierData {
            key,
            type_parameters,
            super_types: Vec::new(),
            variance,
            flags,
        });
        self.by_key.insert(key, id);
        id
    }

    /// Register a class, interface or object.
    ///
    /// Classes without explicit super types get `Any` as their only super
    /// type.
    pub fn add_class(
        &mut self,
        key: &str,
        type_parameters: Vec<ClassifierId>,
        flags: ClassifierFlags,
    ) -> ClassifierId {
        let id = self.push(key, type_parameters, Variance::Invariant, flags);
        self.data[id.index()].super_types = vec![Type::any()];
        id
    }

    /// Register a type parameter. Its bound defaults to `Any?`.
    pub fn add_type_parameter(&mut self, key: &str, variance: Variance) -> ClassifierId {
        self.add_type_parameter_with_flags(key, variance, ClassifierFlags::empty())
    }

    /// Register a type parameter that marks its declaration as an add-on rule.
    pub fn add_add_on_type_parameter(&mut self, key: &str) -> ClassifierId {
        self.add_type_parameter_with_flags(key, Variance::Invariant, ClassifierFlags::ADD_ON)
    }

    fn add_type_parameter_with_flags(
        &mut self,
        key: &str,
        variance: Variance,
        flags: ClassifierFlags,
    ) -> ClassifierId {
        let id = self.push(
            key,
            Vec::new(),
            variance,
            flags | ClassifierFlags::TYPE_PARAMETER,
        );
        self.data[id.index()].super_types = vec![Type::nullable_any()];
        id
    }

    /// Register a tag.
    ///
    /// A synthetic `out` parameter is appended after `type_parameters`; it is
    /// the slot holding the wrapped type.
    pub fn add_tag(&mut self, key: &str, mut type_parameters: Vec<ClassifierId>) -> ClassifierId {
        let wrapped = self.add_type_parameter(&format!("{key}.$TT"), Variance::Out);
        type_parameters.push(wrapped);
        let id = self.push(key, type_parameters, Variance::Invariant, ClassifierFlags::TAG);
        self.data[id.index()].super_types = vec![Type::any()];
        id
    }

    /// Get or create the classifier for functions of `arity` parameters.
    ///
    /// `FunctionN<in P1, ..., in PN, out R>`.
    pub fn function(&mut self, arity: usize) -> ClassifierId {
        if let Some(&id) = self.functions.get(&arity) {
            return id;
        }
        let mut type_parameters: Vec<ClassifierId> = (1..=arity)
            .map(|i| self.add_type_parameter(&format!("Function{arity}.P{i}"), Variance::In))
            .collect();
        type_parameters.push(self.add_type_parameter(&format!("Function{arity}.R"), Variance::Out));
        let id = self.add_class(&format!("Function{arity}"), type_parameters, ClassifierFlags::FUNCTION);
        self.functions.insert(arity, id);
        id
    }

    /// Replace the declared super types (or bounds) of a classifier.
    pub fn set_super_types(&mut self, id: ClassifierId, super_types: Vec<Type>) {
        self.data[id.index()].super_types = super_types;
    }

    /// Get a classifier's data.
    ///
    /// # Panics
    /// Panics if `id` did not come from this table.
    #[inline]
    pub fn get(&self, id: ClassifierId) -> &ClassifierData {
        &self.data[id.index()]
    }

    /// Find a classifier by its key.
    pub fn lookup(&self, key: &str) -> Option<ClassifierId> {
        let name = self.interner.get(key)?;
        self.by_key.get(&name).copied()
    }

    /// The classifier's key as a string.
    pub fn key(&self, id: ClassifierId) -> &'static str {
        self.interner.lookup(self.get(id).key)
    }

    #[inline]
    pub fn flags(&self, id: ClassifierId) -> ClassifierFlags {
        self.get(id).flags
    }

    #[inline]
    pub fn is_type_parameter(&self, id: ClassifierId) -> bool {
        self.get(id).is_type_parameter()
    }

    #[inline]
    pub fn is_tag(&self, id: ClassifierId) -> bool {
        self.get(id).is_tag()
    }

    /// Number of parameters if `id` is a `FunctionN` classifier.
    pub fn function_arity(&self, id: ClassifierId) -> Option<usize> {
        let data = self.get(id);
        data.flags
            .contains(ClassifierFlags::FUNCTION)
            .then(|| data.arity().saturating_sub(1))
    }

    /// Number of classifiers in the table.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The classifier applied to its own type parameters, with its declared
    /// variance. For a type parameter this is the parameter itself.
    pub fn default_type(&self, id: ClassifierId) -> Type {
        let data = self.get(id);
        let args = data
            .type_parameters
            .iter()
            .map(|&p| self.default_type(p))
            .collect::<Vec<_>>();
        Type::from_parts(id, false, args).with_variance(data.variance)
    }

    /// Apply a classifier to explicit type arguments.
    pub fn apply(&self, id: ClassifierId, args: Vec<Type>) -> Result<Type, TypeError> {
        let expected = self.get(id).arity();
        if args.len() != expected {
            return Err(TypeError::Arity {
                classifier: id,
                expected,
                found: args.len(),
            });
        }
        Ok(Type::from_parts(id, false, args))
    }

    /// Build the function type `(params) -> ret`.
    pub fn function_type(&mut self, params: Vec<Type>, ret: Type) -> Type {
        let id = self.function(params.len());
        let mut args = params;
        args.push(ret);
        Type::from_parts(id, false, args)
    }

    /// Build `List<element>`.
    pub fn list_type(&self, element: Type) -> Type {
        Type::from_parts(ClassifierId::LIST, false, vec![element])
    }

    /// Build `Collection<element>`.
    pub fn collection_type(&self, element: Type) -> Type {
        Type::from_parts(ClassifierId::COLLECTION, false, vec![element])
    }
}

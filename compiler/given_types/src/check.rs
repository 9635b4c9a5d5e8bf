//! Subtyping and assignability.
//!
//! The relation is written once against [`TypeCheckerContext`]. A plain
//! [`StaticContext`] answers "is A a subtype of B"; the inference context
//! plugs into the same code through
//! [`TypeCheckerContext::add_sub_type_constraint`] and records constraints on
//! type variables instead of failing on them.
//!
//! # Rules, in order
//!
//! 1. Equal types are related.
//! 2. The context may decide (type variables during inference).
//! 3. `Nothing` is below everything; `Nothing?` only below nullable types.
//! 4. `Any?` is above everything; `Any` above every non-nullable type.
//! 5. Otherwise `a` is viewed as an instance of `b`'s classifier through its
//!    super type chain and the arguments are compared per variance.
//!
//! Tags are classifiers, so a tagged type is never a subtype of its untagged
//! form and differently tagged types are unrelated.

use tracing::trace;

use crate::infer::run_candidate_inference;
use crate::{ClassifierId, Classifiers, Substitution, Type, Variance};

/// Hooks the subtype relation exposes to its caller.
pub trait TypeCheckerContext {
    fn classifiers(&self) -> &Classifiers;

    /// Whether `ty` is a fully known type (not an inference variable).
    fn is_denotable(&self, _ty: &Type) -> bool {
        true
    }

    /// Give the context a chance to decide `sub <: sup` itself.
    ///
    /// `None` means "no opinion, keep checking".
    fn add_sub_type_constraint(&mut self, _sub: &Type, _sup: &Type) -> Option<bool> {
        None
    }
}

/// Context for checks without inference variables.
pub struct StaticContext<'a> {
    classifiers: &'a Classifiers,
}

impl<'a> StaticContext<'a> {
    pub fn new(classifiers: &'a Classifiers) -> Self {
        StaticContext { classifiers }
    }
}

impl TypeCheckerContext for StaticContext<'_> {
    fn classifiers(&self) -> &Classifiers {
        self.classifiers
    }
}

/// Whether `sub` is a subtype of `sup`.
pub fn is_subtype_of<C: TypeCheckerContext + ?Sized>(cx: &mut C, sub: &Type, sup: &Type) -> bool {
    if sub == sup {
        return true;
    }

    if let Some(answer) = cx.add_sub_type_constraint(sub, sup) {
        return answer;
    }

    if sub.is_star_projection() || sup.is_star_projection() {
        return false;
    }

    let classifiers = cx.classifiers();

    if sub.classifier() == ClassifierId::NOTHING
        && (!sub.is_marked_nullable() || sup.is_nullable_type(classifiers))
    {
        return true;
    }

    if sup.classifier() == ClassifierId::ANY
        && (sup.is_marked_nullable() || !sub.is_nullable_type(classifiers))
    {
        return true;
    }

    match sub.subtype_view(classifiers, sup.classifier()) {
        Some(view) => is_subtype_of_same_classifier(cx, &view, sup),
        None => false,
    }
}

fn is_subtype_of_same_classifier<C: TypeCheckerContext + ?Sized>(
    cx: &mut C,
    sub: &Type,
    sup: &Type,
) -> bool {
    if !sup.is_marked_nullable() && sub.is_marked_nullable() {
        return false;
    }

    for (i, (argument, parameter)) in sub.arguments().iter().zip(sup.arguments()).enumerate() {
        if parameter.is_star_projection() {
            continue;
        }
        if argument.is_star_projection() {
            return false;
        }
        let original = declared_variance(cx.classifiers(), sup.classifier(), i);
        let ok = match Variance::effective(parameter.variance(), argument.variance(), original) {
            Variance::In => is_subtype_of(cx, parameter, argument),
            Variance::Out => is_subtype_of(cx, argument, parameter),
            Variance::Invariant => is_equal_to(cx, argument, parameter),
        };
        if !ok {
            return false;
        }
    }

    true
}

fn declared_variance(classifiers: &Classifiers, classifier: ClassifierId, index: usize) -> Variance {
    classifiers
        .get(classifier)
        .type_parameters
        .get(index)
        .map_or(Variance::Invariant, |&p| classifiers.get(p).variance)
}

/// Whether `a` and `b` denote the same type.
pub fn is_equal_to<C: TypeCheckerContext + ?Sized>(cx: &mut C, a: &Type, b: &Type) -> bool {
    if a == b {
        return true;
    }

    if cx.is_denotable(a) && cx.is_denotable(b) {
        if a.classifier() != b.classifier()
            || a.is_marked_nullable() != b.is_marked_nullable()
            || a.is_star_projection() != b.is_star_projection()
        {
            return false;
        }

        for (x, y) in a.arguments().iter().zip(b.arguments()) {
            if x.is_star_projection() && y.is_star_projection() {
                continue;
            }
            if Variance::effective(x.variance(), y.variance(), Variance::Invariant)
                != Variance::effective(y.variance(), x.variance(), Variance::Invariant)
            {
                return false;
            }
            if !is_equal_to(cx, x, y) {
                return false;
            }
        }

        return true;
    }

    is_subtype_of(cx, a, b) && is_subtype_of(cx, b, a)
}

/// Result of [`is_assignable_to`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assignability {
    /// Assignable, with the bindings inferred for free type parameters.
    Assignable { bindings: Substitution },
    NotAssignable,
}

impl Assignability {
    #[inline]
    pub fn is_assignable(&self) -> bool {
        matches!(self, Assignability::Assignable { .. })
    }
}

/// Whether a value of type `sub` can be used where `sup` is expected.
///
/// Type parameters on either side are inference variables unless listed in
/// `static_type_parameters`, which stay rigid.
pub fn is_assignable_to(
    classifiers: &Classifiers,
    sub: &Type,
    sup: &Type,
    static_type_parameters: &[ClassifierId],
) -> Assignability {
    let context = run_candidate_inference(classifiers, sub, sup, static_type_parameters, true);
    if context.is_ok() {
        Assignability::Assignable {
            bindings: context.into_fixed_type_variables(),
        }
    } else {
        trace!(
            sub = %sub.display(classifiers),
            sup = %sup.display(classifiers),
            "not assignable"
        );
        Assignability::NotAssignable
    }
}

/// [`is_subtype_of`] without inference variables.
pub fn is_subtype(classifiers: &Classifiers, sub: &Type, sup: &Type) -> bool {
    is_subtype_of(&mut StaticContext::new(classifiers), sub, sup)
}

/// [`is_equal_to`] without inference variables.
pub fn is_equal(classifiers: &Classifiers, a: &Type, b: &Type) -> bool {
    is_equal_to(&mut StaticContext::new(classifiers), a, b)
}

//! Least upper bounds and intersections of type lists.
//!
//! Used when fixing a type variable from several lower bounds (common super
//! type) or several upper bounds (intersection). There is no intersection
//! type in the model, so an intersection of unrelated types degrades to
//! `Any` / `Any?`.

use crate::check::{is_equal_to, is_subtype_of, TypeCheckerContext};
use crate::{ClassifierId, Classifiers, Type, Variance};

/// Common super type of `types`, which must be non-empty.
pub fn common_super_type<C: TypeCheckerContext + ?Sized>(cx: &mut C, types: &[Type]) -> Type {
    let max_depth = types.iter().map(Type::type_depth).max().unwrap_or(0);
    common_super_type_at(cx, types, -depth_as_i32(max_depth))
}

fn depth_as_i32(depth: usize) -> i32 {
    i32::try_from(depth).unwrap_or(i32::MAX)
}

fn common_super_type_at<C: TypeCheckerContext + ?Sized>(cx: &mut C, types: &[Type], depth: i32) -> Type {
    if let [single] = types {
        return single.clone();
    }
    let any_nullable = types.iter().any(|t| t.is_nullable_type(cx.classifiers()));
    let not_null: Vec<Type> = if any_nullable {
        types.iter().map(Type::non_null).collect()
    } else {
        types.to_vec()
    };

    let common = common_super_type_for_not_null_types(cx, &not_null, depth);
    if !any_nullable || cx.classifiers().is_type_parameter(common.classifier()) {
        common
    } else {
        common.nullable()
    }
}

fn uniquify<C: TypeCheckerContext + ?Sized>(cx: &mut C, types: &[Type]) -> Vec<Type> {
    let mut unique: Vec<Type> = Vec::new();
    for ty in types {
        if !unique.iter().any(|u| is_equal_to(cx, u, ty)) {
            unique.push(ty.clone());
        }
    }
    unique
}

fn common_super_type_for_not_null_types<C: TypeCheckerContext + ?Sized>(
    cx: &mut C,
    types: &[Type],
    depth: i32,
) -> Type {
    if let [single] = types {
        return single.clone();
    }
    let unique = uniquify(cx, types);
    if let [single] = unique.as_slice() {
        return single.clone();
    }

    // Keep only types that are not below another one.
    let explicit_super_types = filter_types(&unique, |upper, lower| is_subtype_of(cx, lower, upper));
    if let [single] = explicit_super_types.as_slice() {
        return single.clone();
    }

    let classifiers: Vec<ClassifierId> = all_common_super_type_classifiers(cx.classifiers(), &explicit_super_types);
    let candidates: Vec<Type> = classifiers
        .into_iter()
        .map(|classifier| super_type_with_classifier(cx, &explicit_super_types, classifier, depth))
        .collect();
    intersect_types(cx, &candidates)
}

/// Drop every type for which some *other* type satisfies `pred(other, it)`.
fn filter_types(types: &[Type], mut pred: impl FnMut(&Type, &Type) -> bool) -> Vec<Type> {
    let mut keep = Vec::with_capacity(types.len());
    for (i, upper) in types.iter().enumerate() {
        let dominated = types
            .iter()
            .enumerate()
            .any(|(j, lower)| i != j && pred(lower, upper));
        if !dominated {
            keep.push(upper.clone());
        }
    }
    keep
}

fn collect_all_super_type_classifiers(classifiers: &Classifiers, ty: &Type) -> Vec<ClassifierId> {
    let mut out = Vec::new();
    ty.any_super_type(classifiers, &mut |t| {
        if !out.contains(&t.classifier()) {
            out.push(t.classifier());
        }
        false
    });
    out
}

/// Classifiers that are super classifiers of every type, minus those that
/// have a more precise sub classifier in the result.
fn all_common_super_type_classifiers(classifiers: &Classifiers, types: &[Type]) -> Vec<ClassifierId> {
    let Some((first, rest)) = types.split_first() else {
        return Vec::new();
    };
    let mut result = collect_all_super_type_classifiers(classifiers, first);
    for ty in rest {
        let supers = collect_all_super_type_classifiers(classifiers, ty);
        result.retain(|c| supers.contains(c));
    }
    result
        .iter()
        .copied()
        .filter(|&target| {
            !result.iter().any(|&other| {
                other != target
                    && classifiers
                        .get(other)
                        .super_types
                        .iter()
                        .any(|s| s.classifier() == target)
            })
        })
        .collect()
}

fn super_type_with_classifier<C: TypeCheckerContext + ?Sized>(
    cx: &mut C,
    types: &[Type],
    classifier: ClassifierId,
    depth: i32,
) -> Type {
    let parameters = cx.classifiers().get(classifier).type_parameters.clone();
    if parameters.is_empty() {
        return cx.classifiers().default_type(classifier);
    }

    let views: Vec<Option<Type>> = types
        .iter()
        .map(|t| t.subtype_view(cx.classifiers(), classifier))
        .collect();

    let mut arguments = Vec::with_capacity(parameters.len());
    for (index, &parameter) in parameters.iter().enumerate() {
        let mut there_is_star = false;
        let mut type_arguments = Vec::new();
        for view in views.iter().flatten() {
            let Some(argument) = view.arguments().get(index) else {
                continue;
            };
            if argument.is_star_projection() {
                there_is_star = true;
            } else {
                type_arguments.push(argument.clone());
            }
        }

        let argument = if there_is_star || type_arguments.is_empty() {
            Type::star()
        } else {
            let argument = calculate_argument(cx, parameter, &type_arguments, depth);
            // Collapse `C<out C<...>>` recursion.
            if !argument.is_star_projection()
                && argument.variance() == Variance::Out
                && argument.classifier() == classifier
            {
                Type::star()
            } else {
                argument
            }
        };
        arguments.push(argument);
    }

    let base = cx.classifiers().default_type(classifier);
    Type::from_parts(base.classifier(), false, arguments).with_variance(base.variance())
}

fn calculate_argument<C: TypeCheckerContext + ?Sized>(
    cx: &mut C,
    parameter: ClassifierId,
    arguments: &[Type],
    depth: i32,
) -> Type {
    if depth > 0 {
        return Type::star();
    }
    let parameter_variance = cx.classifiers().get(parameter).variance;

    if parameter_variance == Variance::Invariant
        && arguments.iter().all(|a| a.variance() == Variance::Invariant)
    {
        if let Some(first) = arguments.first() {
            if arguments.iter().all(|a| a == first) {
                return first.clone();
            }
        }
    }

    let as_out = if parameter_variance == Variance::Invariant {
        let there_is_out = arguments.iter().any(|a| a.variance() == Variance::Out);
        let there_is_in = arguments.iter().any(|a| a.variance() == Variance::In);
        if there_is_out && there_is_in {
            return Type::star();
        }
        there_is_out || !there_is_in
    } else {
        parameter_variance == Variance::Out
    };

    if as_out {
        if parameter_variance != Variance::Invariant {
            return common_super_type_at(cx, arguments, depth + 1);
        }

        let mut equal_to_each_other = None;
        for candidate in arguments {
            if arguments.iter().all(|other| is_equal_to(cx, other, candidate)) {
                equal_to_each_other = Some(candidate.clone());
                break;
            }
        }

        match equal_to_each_other {
            None => common_super_type_at(cx, arguments, depth + 1).with_variance(Variance::Out),
            Some(ty) => {
                let there_is_not_invariant = arguments.iter().any(|a| a.variance() != Variance::Invariant);
                ty.with_variance(if there_is_not_invariant {
                    Variance::Out
                } else {
                    Variance::Invariant
                })
            }
        }
    } else {
        let ty = intersect_types(cx, arguments);
        if parameter_variance == Variance::Invariant {
            ty.with_variance(Variance::In)
        } else {
            ty
        }
    }
}

/// Intersection of `types`, which must be non-empty.
///
/// The result is nullable if any input is.
pub fn intersect_types<C: TypeCheckerContext + ?Sized>(cx: &mut C, types: &[Type]) -> Type {
    if let [single] = types {
        return single.clone();
    }

    let nullable = types.iter().any(|t| t.is_nullable_type(cx.classifiers()));
    let mut normalized: Vec<Type> = Vec::with_capacity(types.len());
    for ty in types {
        let ty = ty.with_nullability(nullable);
        if !normalized.contains(&ty) {
            normalized.push(ty);
        }
    }
    if let [single] = normalized.as_slice() {
        return single.clone();
    }

    let without_strict_super_types = filter_types(&normalized, |lower, upper| {
        is_subtype_of(cx, lower, upper) && !is_subtype_of(cx, upper, lower)
    });
    let without_equal = filter_types(&without_strict_super_types, |lower, upper| is_equal_to(cx, lower, upper));

    match without_equal.as_slice() {
        [single] => single.clone(),
        // Mutually equal types filtered each other out.
        [] => without_strict_super_types
            .first()
            .cloned()
            .unwrap_or_else(Type::nullable_any),
        rest => {
            if rest.iter().all(|t| !t.is_nullable_type(cx.classifiers())) {
                Type::any()
            } else {
                Type::nullable_any()
            }
        }
    }
}

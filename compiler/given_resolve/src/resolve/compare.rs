//! Candidate ranking.
//!
//! `Ordering::Less` means "the left side is the better candidate". The
//! comparisons are not guaranteed to be a total order (specificity of
//! unrelated types falls back to their super types), so callers sort with
//! [`sort_candidates`], which never assumes transitivity.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use given_types::infer::common_super_type;
use given_types::{is_subtype, Classifiers, StaticContext, Type};

use crate::Candidate;

/// Rank two candidates: closer scope first, then the more derived dispatch
/// receiver, then the more specific declared type.
pub(crate) fn compare_candidates(
    classifiers: &Classifiers,
    (a, a_distance): (&Candidate, u32),
    (b, b_distance): (&Candidate, u32),
) -> Ordering {
    if a_distance != b_distance {
        return a_distance.cmp(&b_distance);
    }

    if let (Some(a_receiver), Some(b_receiver)) = (a.dispatch_receiver(), b.dispatch_receiver()) {
        if a_receiver != b_receiver {
            if is_subtype(classifiers, a_receiver, b_receiver) {
                return Ordering::Less;
            }
            if is_subtype(classifiers, b_receiver, a_receiver) {
                return Ordering::Greater;
            }
        }
    }

    match (a.original_ty(), b.original_ty()) {
        (Some(a_ty), Some(b_ty)) => compare_type(classifiers, a_ty, b_ty),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Specificity of two declared types.
pub(crate) fn compare_type(classifiers: &Classifiers, a: &Type, b: &Type) -> Ordering {
    compare_type_guarded(classifiers, a, b, &mut FxHashSet::default())
}

fn compare_type_guarded(
    classifiers: &Classifiers,
    a: &Type,
    b: &Type,
    compared: &mut FxHashSet<(Type, Type)>,
) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    match (a.is_star_projection(), b.is_star_projection()) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    match (a.is_marked_nullable(), b.is_marked_nullable()) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    match (
        classifiers.is_type_parameter(a.classifier()),
        classifiers.is_type_parameter(b.classifier()),
    ) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    // Recursive bounds can bring the same pair back around.
    if !compared.insert((a.clone(), b.clone())) {
        return Ordering::Equal;
    }

    if a.classifier() != b.classifier() {
        if is_subtype(classifiers, a, b) {
            return Ordering::Less;
        }
        if is_subtype(classifiers, b, a) {
            return Ordering::Greater;
        }

        let a_supers = a.super_types(classifiers);
        let b_supers = b.super_types(classifiers);
        if a_supers.is_empty() || b_supers.is_empty() {
            return Ordering::Equal;
        }
        let mut cx = StaticContext::new(classifiers);
        let a_common = common_super_type(&mut cx, &a_supers);
        let b_common = common_super_type(&mut cx, &b_supers);
        return compare_type_guarded(classifiers, &a_common, &b_common, compared);
    }

    let diff: i32 = a
        .arguments()
        .iter()
        .zip(b.arguments())
        .map(|(a_arg, b_arg)| match compare_type_guarded(classifiers, a_arg, b_arg, compared) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        })
        .sum();
    diff.cmp(&0)
}

/// Stable insertion sort by [`compare_candidates`].
///
/// Only adjacent pairs are compared, so an inconsistent comparison can
/// leave the order partly unsorted but never panics or loops.
pub(crate) fn sort_candidates(classifiers: &Classifiers, candidates: &mut [(Candidate, u32)]) {
    for i in 1..candidates.len() {
        let mut j = i;
        while j > 0 {
            let (left, right) = (&candidates[j - 1], &candidates[j]);
            if compare_candidates(classifiers, (&right.0, right.1), (&left.0, left.1)) != Ordering::Less {
                break;
            }
            candidates.swap(j - 1, j);
            j -= 1;
        }
    }
}

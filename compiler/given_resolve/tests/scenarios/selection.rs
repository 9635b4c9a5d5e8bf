//! Choosing between candidates.

use given_resolve::{ContextPath, ResolutionFailure, ScopeKind};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn end_to_end_dependency() {
    let mut f = Fixture::new();
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let bar = f.provider("app.bar", f.ty(f.bar), f.ty(f.foo));
    let path = f.global(vec![bar, foo]);

    let plan = f.resolve(&f.ty(f.bar), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.foo", "app.bar"]);
}

#[test]
fn equal_producers_are_ambiguous() {
    let mut f = Fixture::new();
    let first = f.leaf("app.first", f.ty(f.string));
    let second = f.leaf("app.second", f.ty(f.string));
    let path = f.global(vec![first, second]);

    let failure = f.resolve(&f.ty(f.string), &path).unwrap_err();
    let ResolutionFailure::AmbiguousCandidates { candidates, .. } = &failure else {
        panic!("expected ambiguity, got {failure:?}");
    };
    let origins: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c.declaration())
        .map(|d| f.origin(d))
        .collect();
    assert_eq!(origins, vec!["app.first", "app.second"]);
}

#[test]
fn concrete_type_beats_generic() {
    let mut f = Fixture::new();
    let t = f.type_parameter("setOf.T");
    let generic = f
        .function("app.setOf", f.apply(f.set, vec![f.ty(t)]))
        .type_parameters([t])
        .finish(&f.classifiers);
    let strings = f.leaf("app.strings", f.apply(f.set, vec![f.ty(f.string)]));
    let path = f.global(vec![generic, strings]);

    let plan = f.resolve(&f.apply(f.set, vec![f.ty(f.string)]), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.strings"]);

    // Only the generic one fits other element types.
    let plan = f.resolve(&f.apply(f.set, vec![f.ty(f.foo)]), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.setOf"]);
    assert_eq!(plan.substitution().get(&t), Some(&f.ty(f.foo)));
}

#[test]
fn subtype_producer_beats_super_type_producer() {
    let mut f = Fixture::new();
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let sub = f.leaf("app.sub", f.ty(f.sub));
    let path = f.global(vec![foo, sub]);

    let plan = f.resolve(&f.ty(f.foo), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.sub"]);
}

#[test]
fn inner_scope_wins() {
    let mut f = Fixture::new();
    let outer = f.leaf("app.a", f.ty(f.string));
    let inner = f.leaf("main.b", f.ty(f.string));
    let path = ContextPath::from_outermost(vec![
        f.frame("app", ScopeKind::InternalGlobal).with_injectable(outer),
        f.frame("main", ScopeKind::Function).with_injectable(inner),
    ]);

    let plan = f.resolve(&f.ty(f.string), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["main.b"]);
}

#[test]
fn closer_generic_beats_farther_concrete() {
    let mut f = Fixture::new();
    let t = f.type_parameter("any.T");
    let outer = f.leaf("app.name", f.ty(f.string));
    let inner = f
        .function("main.any", f.ty(t))
        .type_parameters([t])
        .finish(&f.classifiers);
    let path = ContextPath::from_outermost(vec![
        f.frame("app", ScopeKind::InternalGlobal).with_injectable(outer),
        f.frame("main", ScopeKind::Function).with_injectable(inner),
    ]);

    let plan = f.resolve(&f.ty(f.string), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["main.any"]);
}

#[test]
fn closer_failure_falls_back_to_farther_success() {
    let mut f = Fixture::new();
    let outer = f.leaf("app.a", f.ty(f.string));
    let inner = f.provider("main.b", f.ty(f.string), f.ty(f.foo));
    let path = ContextPath::from_outermost(vec![
        f.frame("app", ScopeKind::InternalGlobal).with_injectable(outer),
        f.frame("main", ScopeKind::Function).with_injectable(inner),
    ]);

    let plan = f.resolve(&f.ty(f.string), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.a"]);
}

#[test]
fn equally_ranked_failures_keep_the_first_tried() {
    let mut f = Fixture::new();
    // One candidate is missing a dependency, the other is ambiguous below.
    let missing = f.provider("app.missing", f.ty(f.bar), f.ty(f.foo));
    let ambiguous = f.provider("app.ambiguous", f.ty(f.bar), f.ty(f.string));
    let first = f.leaf("app.first", f.ty(f.string));
    let second = f.leaf("app.second", f.ty(f.string));
    let path = f.global(vec![missing, ambiguous, first, second]);

    let failure = f.resolve(&f.ty(f.bar), &path).unwrap_err();
    assert!(matches!(failure, ResolutionFailure::NoCandidate { .. }), "{failure:?}");
}

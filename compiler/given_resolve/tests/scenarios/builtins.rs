//! Synthesized lambdas and list multi-binding.

use given_resolve::{Candidate, DeclarationKind, ResolutionFailure};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn provider_lambda_for_function_type() {
    let mut f = Fixture::new();
    let provider = f.classifiers.function_type(Vec::new(), f.ty(f.foo));
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let path = f.global(vec![foo]);

    let plan = f.resolve(&provider, &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.foo", "<lambda>"]);
}

#[test]
fn lambda_parameters_are_injectable_in_the_body() {
    let mut f = Fixture::new();
    let factory = f.classifiers.function_type(vec![f.ty(f.foo)], f.ty(f.bar));
    let bar = f.provider("app.bar", f.ty(f.bar), f.ty(f.foo));
    let path = f.global(vec![bar]);

    let plan = f.resolve(&factory, &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["it0", "app.bar", "<lambda>"]);

    let Candidate::Lambda { parameters, .. } = plan.candidate() else {
        panic!("expected a lambda, got {:?}", plan.candidate());
    };
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0].kind(), DeclarationKind::ValueParameter { index: 0 });
    assert_eq!(parameters[0].ty(), &f.ty(f.foo));
}

#[test]
fn declared_function_beats_lambda() {
    let mut f = Fixture::new();
    let provider = f.classifiers.function_type(Vec::new(), f.ty(f.foo));
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let factory = f.leaf("app.fooFactory", provider.clone());
    let path = f.global(vec![foo, factory]);

    let plan = f.resolve(&provider, &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.fooFactory"]);
}

#[test]
fn list_collects_every_element() {
    let mut f = Fixture::new();
    let one = f.leaf("app.one", f.ty(f.foo));
    let sub = f.leaf("app.sub", f.ty(f.sub));
    let many = f.leaf("app.many", f.classifiers.collection_type(f.ty(f.foo)));
    let other = f.leaf("app.name", f.ty(f.string));
    let path = f.global(vec![one, sub, many, other]);

    let plan = f.resolve(&f.classifiers.list_type(f.ty(f.foo)), &path).unwrap();
    assert_eq!(
        f.origins(&plan),
        vec!["app.one", "app.sub", "app.many", "<list>"]
    );
    let Candidate::List { element, .. } = plan.candidate() else {
        panic!("expected a list, got {:?}", plan.candidate());
    };
    assert_eq!(element, &f.ty(f.foo));
}

#[test]
fn list_spans_scopes() {
    let mut f = Fixture::new();
    let outer = f.leaf("app.outer", f.ty(f.foo));
    let inner = f.leaf("main.inner", f.ty(f.foo));
    let path = given_resolve::ContextPath::from_outermost(vec![
        f.frame("app", given_resolve::ScopeKind::InternalGlobal).with_injectable(outer),
        f.frame("main", given_resolve::ScopeKind::Function).with_injectable(inner),
    ]);

    let plan = f.resolve(&f.classifiers.list_type(f.ty(f.foo)), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.outer", "main.inner", "<list>"]);
}

#[test]
fn empty_list_has_no_candidate() {
    let mut f = Fixture::new();
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let path = f.global(vec![foo]);

    let failure = f.resolve(&f.classifiers.list_type(f.ty(f.string)), &path).unwrap_err();
    assert!(failure.is_no_candidate(), "{failure:?}");
}

#[test]
fn failing_element_fails_the_list() {
    let mut f = Fixture::new();
    let one = f.leaf("app.one", f.ty(f.foo));
    let broken = f.provider("app.broken", f.ty(f.foo), f.ty(f.bar));
    let path = f.global(vec![one, broken]);

    let failure = f.resolve(&f.classifiers.list_type(f.ty(f.foo)), &path).unwrap_err();
    let ResolutionFailure::NoCandidate { requested, .. } = &failure else {
        panic!("expected the element's failure, got {failure:?}");
    };
    assert_eq!(requested, &f.ty(f.bar));
}

//! Dependency cycles.

use given_resolve::{
    Candidate, Dependency, ResolutionFailure, ResolutionOptions, ResolvedDependency, Resolver, Via,
};
use given_types::Type;
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn mutual_dependency_diverges() {
    let mut f = Fixture::new();
    let a = f.provider("app.a", f.ty(f.a), f.ty(f.b));
    let b = f.provider("app.b", f.ty(f.b), f.ty(f.a));
    let path = f.global(vec![a, b]);

    let failure = f.resolve(&f.ty(f.a), &path).unwrap_err();
    let ResolutionFailure::DivergingDependency { candidate, trace } = &failure else {
        panic!("expected divergence, got {failure:?}");
    };
    assert_eq!(candidate.declaration().map(|d| f.origin(d)), Some("app.a"));

    let requested: Vec<&Type> = trace.iter().map(|frame| &frame.requested).collect();
    assert_eq!(requested, vec![&f.ty(f.a), &f.ty(f.b), &f.ty(f.a)]);
    assert!(matches!(trace[0].via, Some(Via::Declaration { .. })));
    assert_eq!(trace[2].via, trace[0].via);
}

#[test]
fn self_dependency_diverges() {
    let mut f = Fixture::new();
    let looping = f.provider("app.loop", f.ty(f.a), f.ty(f.a));
    let path = f.global(vec![looping]);

    let failure = f.resolve(&f.ty(f.a), &path).unwrap_err();
    assert!(matches!(failure, ResolutionFailure::DivergingDependency { .. }));
}

#[test]
fn growing_generic_request_diverges() {
    let mut f = Fixture::new();
    // fun <T> nest(x: Set<Set<T>>): Set<T>
    let t = f.type_parameter("nest.T");
    let nested = f.apply(f.set, vec![f.apply(f.set, vec![f.ty(t)])]);
    let x = f.name("x");
    let nest = f
        .function("app.nest", f.apply(f.set, vec![f.ty(t)]))
        .type_parameters([t])
        .dependency(x, nested)
        .finish(&f.classifiers);
    let path = f.global(vec![nest]);

    let failure = f.resolve(&f.apply(f.set, vec![f.ty(f.foo)]), &path).unwrap_err();
    assert!(matches!(failure, ResolutionFailure::DivergingDependency { .. }));
}

#[test]
fn lambda_breaks_cycle_with_back_reference() {
    let mut f = Fixture::new();
    let provider = f.classifiers.function_type(Vec::new(), f.ty(f.a));
    let a = f.provider("app.a", f.ty(f.a), f.ty(f.b));
    let b = f.provider("app.b", f.ty(f.b), provider);
    let path = f.global(vec![a, b]);

    let plan = f.resolve(&f.ty(f.a), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["^app.a", "<lambda>", "app.b", "app.a"]);
    assert!(plan.contains_back_reference());

    let ResolvedDependency::Plan(b_plan) = &plan.dependencies()[0] else {
        panic!("`b` should be resolved");
    };
    let ResolvedDependency::Plan(lambda) = &b_plan.dependencies()[0] else {
        panic!("the lambda should be resolved");
    };
    assert!(matches!(lambda.candidate(), Candidate::Lambda { .. }));
}

#[test]
fn lambda_does_not_hide_a_real_cycle() {
    let mut f = Fixture::new();
    // a needs () -> B, b needs B: the lambda body still loops on itself.
    let provider = f.classifiers.function_type(Vec::new(), f.ty(f.b));
    let a = f.provider("app.a", f.ty(f.a), provider);
    let b = f.provider("app.b", f.ty(f.b), f.ty(f.b));
    let path = f.global(vec![a, b]);

    let failure = f.resolve(&f.ty(f.a), &path).unwrap_err();
    assert!(matches!(failure, ResolutionFailure::DivergingDependency { .. }));
}

#[test]
fn generic_reused_at_other_arguments_is_not_a_cycle() {
    let mut f = Fixture::new();
    // fun <T> wrap(x: T): Set<T>; foo(w: Set<Bar>): Foo; bar(): Bar
    let t = f.type_parameter("wrap.T");
    let x = f.name("x");
    let wrap = f
        .function("app.wrap", f.apply(f.set, vec![f.ty(t)]))
        .type_parameters([t])
        .dependency(x, f.ty(t))
        .finish(&f.classifiers);
    let foo = f.provider("app.foo", f.ty(f.foo), f.apply(f.set, vec![f.ty(f.bar)]));
    let bar = f.leaf("app.bar", f.ty(f.bar));
    let path = f.global(vec![wrap, foo, bar]);

    let plan = f.resolve(&f.apply(f.set, vec![f.ty(f.foo)]), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.bar", "app.wrap", "app.foo", "app.wrap"]);
}

#[test]
fn nested_wrappers_resolve_in_any_parameter_order() {
    let mut f = Fixture::new();
    let set_foo = f.apply(f.set, vec![f.ty(f.foo)]);
    let set_set_foo = f.apply(f.set, vec![set_foo.clone()]);
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let wrap_foo = f.provider("app.wrapFoo", set_foo.clone(), f.ty(f.foo));
    let wrap_twice = f.provider("app.wrapTwice", set_set_foo.clone(), set_foo.clone());
    let path = f.global(vec![foo, wrap_foo, wrap_twice]);

    let plan = f.resolve(&set_set_foo, &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.foo", "app.wrapFoo", "app.wrapTwice"]);

    let (a, b) = (f.name("a"), f.name("b"));
    let forward = [
        Dependency::new(a, set_foo.clone()),
        Dependency::new(b, set_set_foo.clone()),
    ];
    let backward = [Dependency::new(b, set_set_foo), Dependency::new(a, set_foo)];
    let main = f.name("app.main");

    for memoize in [true, false] {
        let options = ResolutionOptions {
            memoize,
            ..ResolutionOptions::default()
        };
        for parameters in [&forward, &backward] {
            let mut resolver = Resolver::for_path(&f.classifiers, &path, options);
            let call = resolver.resolve_call(main, parameters).unwrap();
            assert_eq!(call.arguments.len(), 2);
        }
    }
}


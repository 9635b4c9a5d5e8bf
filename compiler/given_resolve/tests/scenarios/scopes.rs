//! Component scopes, call contexts and default values.

use given_resolve::{CallContext, ContextPath, ResolutionFailure, ResolvedDependency, ScopeKind};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn sole_scoped_candidate_reports_mismatch() {
    let mut f = Fixture::new();
    let session = f.name("Session");
    let app = f.name("App");
    let user = f
        .function("app.user", f.ty(f.foo))
        .target_scope(session)
        .finish(&f.classifiers);
    let path = ContextPath::from_innermost(vec![f
        .frame("app", ScopeKind::InternalGlobal)
        .with_component_scope(app)
        .with_injectable(user)]);

    let failure = f.resolve(&f.ty(f.foo), &path).unwrap_err();
    let ResolutionFailure::ScopeMismatch {
        declaration,
        required,
        actual,
        ..
    } = &failure
    else {
        panic!("expected a scope mismatch, got {failure:?}");
    };
    assert_eq!(f.origin(declaration), "app.user");
    assert_eq!(*required, session);
    assert_eq!(actual, &vec![app]);
}

#[test]
fn scoped_candidate_is_skipped_when_another_fits() {
    let mut f = Fixture::new();
    let session = f.name("Session");
    let user = f
        .function("app.user", f.ty(f.foo))
        .target_scope(session)
        .finish(&f.classifiers);
    let guest = f.leaf("app.guest", f.ty(f.foo));
    let path = f.global(vec![user, guest]);

    let plan = f.resolve(&f.ty(f.foo), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.guest"]);
}

#[test]
fn active_scope_admits_candidate() {
    let mut f = Fixture::new();
    let session = f.name("Session");
    let user = f
        .function("app.user", f.ty(f.foo))
        .target_scope(session)
        .finish(&f.classifiers);
    let path = ContextPath::from_outermost(vec![
        f.frame("app", ScopeKind::InternalGlobal).with_injectable(user),
        f.frame("SessionComponent", ScopeKind::Class).with_component_scope(session),
    ]);

    let plan = f.resolve(&f.ty(f.foo), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.user"]);
}

#[test]
fn suspend_producer_needs_suspend_caller() {
    let mut f = Fixture::new();
    let load = f
        .function("app.load", f.ty(f.foo))
        .call_context(CallContext::Suspend)
        .finish(&f.classifiers);

    let path = f.global(vec![load.clone()]);
    let failure = f.resolve(&f.ty(f.foo), &path).unwrap_err();
    assert!(
        matches!(
            failure,
            ResolutionFailure::CallContextMismatch {
                required: CallContext::Suspend,
                actual: CallContext::Default,
                ..
            }
        ),
        "{failure:?}"
    );

    let path = ContextPath::from_outermost(vec![
        f.frame("app", ScopeKind::InternalGlobal).with_injectable(load),
        f.frame("main", ScopeKind::Function).with_call_context(CallContext::Suspend),
    ]);
    let plan = f.resolve(&f.ty(f.foo), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.load"]);
}

#[test]
fn suspend_caller_may_use_default_producers() {
    let mut f = Fixture::new();
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let path = ContextPath::from_outermost(vec![
        f.frame("app", ScopeKind::InternalGlobal).with_injectable(foo),
        f.frame("main", ScopeKind::Function).with_call_context(CallContext::Suspend),
    ]);

    assert!(f.resolve(&f.ty(f.foo), &path).is_ok());
}

#[test]
fn missing_dependency_with_default_uses_it() {
    let mut f = Fixture::new();
    let (label, foo_name) = (f.name("label"), f.name("foo"));
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let bar = f
        .function("app.bar", f.ty(f.bar))
        .dependency(foo_name, f.ty(f.foo))
        .default_dependency(label, f.ty(f.string))
        .finish(&f.classifiers);
    let path = f.global(vec![foo, bar]);

    let plan = f.resolve(&f.ty(f.bar), &path).unwrap();
    assert_eq!(f.origins(&plan), vec!["app.foo", "<default>", "app.bar"]);
    assert_eq!(plan.dependencies()[1], ResolvedDependency::DefaultValue);
}

#[test]
fn default_does_not_hide_other_failures() {
    let mut f = Fixture::new();
    let b_name = f.name("b");
    let a = f
        .function("app.a", f.ty(f.a))
        .default_dependency(b_name, f.ty(f.b))
        .finish(&f.classifiers);
    let b = f.provider("app.b", f.ty(f.b), f.ty(f.a));
    let path = f.global(vec![a, b]);

    let failure = f.resolve(&f.ty(f.a), &path).unwrap_err();
    assert!(matches!(failure, ResolutionFailure::DivergingDependency { .. }));
}

#[test]
fn first_failing_dependency_stops_the_candidate() {
    let mut f = Fixture::new();
    let (x, y) = (f.name("x"), f.name("y"));
    let bar = f
        .function("app.bar", f.ty(f.bar))
        .dependency(x, f.ty(f.foo))
        .dependency(y, f.ty(f.a))
        .finish(&f.classifiers);
    let path = f.global(vec![bar]);

    let failure = f.resolve(&f.ty(f.bar), &path).unwrap_err();
    let ResolutionFailure::NoCandidate { requested, trace } = &failure else {
        panic!("expected a missing dependency, got {failure:?}");
    };
    assert_eq!(requested, &f.ty(f.foo));
    assert_eq!(trace.len(), 2);
}

//! Parallel resolution and failure reports.

use given_resolve::{resolve_batch, ResolutionFailure, ResolutionOptions, ResolutionRequest};
use pretty_assertions::assert_eq;

use crate::common::Fixture;

#[test]
fn batch_keeps_request_order() {
    let mut f = Fixture::new();
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let bar = f.provider("app.bar", f.ty(f.bar), f.ty(f.foo));
    let path = f.global(vec![foo, bar]);

    let requests: Vec<ResolutionRequest> = [f.ty(f.bar), f.ty(f.string), f.ty(f.foo)]
        .into_iter()
        .map(|requested| ResolutionRequest::new(requested, path.clone()))
        .collect();
    let results = resolve_batch(&f.classifiers, &requests);

    assert_eq!(results.len(), 3);
    assert_eq!(f.origins(results[0].as_ref().unwrap()), vec!["app.foo", "app.bar"]);
    assert!(results[1].as_ref().unwrap_err().is_no_candidate());
    assert_eq!(f.origins(results[2].as_ref().unwrap()), vec!["app.foo"]);
}

#[test]
fn batch_matches_sequential_resolution() {
    let mut f = Fixture::new();
    let a = f.provider("app.a", f.ty(f.a), f.ty(f.b));
    let b = f.provider("app.b", f.ty(f.b), f.ty(f.a));
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let path = f.global(vec![a, b, foo]);

    let requests: Vec<ResolutionRequest> = (0..32)
        .map(|i| {
            let requested = if i % 2 == 0 { f.ty(f.a) } else { f.ty(f.foo) };
            ResolutionRequest::new(requested, path.clone())
        })
        .collect();
    let parallel = resolve_batch(&f.classifiers, &requests);
    let sequential: Vec<_> = requests
        .iter()
        .map(|request| f.resolve(&request.requested, &request.path))
        .collect();

    assert_eq!(parallel, sequential);
}

#[test]
fn options_travel_with_the_request() {
    let mut f = Fixture::new();
    let foo = f.leaf("app.foo", f.ty(f.foo));
    let path = f.global(vec![foo]);
    let list = f.classifiers.list_type(f.ty(f.foo));

    let without_lists = ResolutionOptions {
        builtin_lists: false,
        ..ResolutionOptions::default()
    };
    let requests = vec![
        ResolutionRequest::new(list.clone(), path.clone()),
        ResolutionRequest::new(list, path).with_options(without_lists),
    ];
    let results = resolve_batch(&f.classifiers, &requests);

    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn failure_report_shows_the_chain() {
    let mut f = Fixture::new();
    let bar = f.provider("app.bar", f.ty(f.bar), f.ty(f.foo));
    let a = f.provider("app.a", f.ty(f.a), f.ty(f.bar));
    let path = f.global(vec![bar, a]);

    let failure = f.resolve(&f.ty(f.a), &path).unwrap_err();
    assert!(matches!(failure, ResolutionFailure::NoCandidate { .. }));
    assert_eq!(
        failure.render(&f.classifiers),
        "no injectable found for `app.Foo`\n  `app.A` via `app.a`\n  `app.Bar` via `app.bar`\n  `app.Foo`"
    );
    assert_eq!(failure.to_string(), "no injectable candidate for the requested type");
}

/// Per-request knobs of the resolver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ResolutionOptions {
    /// Deepest dependency chain tried before reporting divergence.
    pub max_depth: usize,
    /// Reuse successful sub-plans per (scope, requested type).
    pub memoize: bool,
    /// Synthesize lambdas for function-typed requests with no candidate.
    pub builtin_lambdas: bool,
    /// Collect `List<T>` requests from every matching injectable.
    pub builtin_lists: bool,
}

impl ResolutionOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 128;
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        ResolutionOptions {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            memoize: true,
            builtin_lambdas: true,
            builtin_lists: true,
        }
    }
}

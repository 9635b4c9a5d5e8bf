//! Stack growth for the recursive resolver.
//!
//! Resolution recurses once per dependency edge, so a long chain of
//! injectables (or a generous `max_depth`) can run deeper than the default
//! thread stack, especially on rayon workers. Recursive entry points run
//! inside [`ensure_sufficient_stack`], which grows the stack on native
//! targets and is a passthrough on wasm.

/// Grow when less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

//! Host stack safety for deep Lox recursion.
//!
//! Every Lox call nests several evaluator frames on the host stack, so a
//! recursive program can exhaust a small thread stack long before the call
//! depth guard fires.  Calls run through [`ensure_sufficient_stack`], which
//! grows the stack on demand; the depth guard is then the only limit.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_SEGMENT: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

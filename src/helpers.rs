//! Closure-based wrappers over the raw entry points.
//!
//! The raw [`par_for`] traffics in context and closure pointers because
//! the compiled pipelines driving it do. Code written directly against
//! this crate can borrow an ordinary closure for the duration of the
//! call instead: `par_for` does not return while any iteration is
//! outstanding, so the closure may freely reference the caller's stack.

use std::ffi::c_void;
use std::ptr;

use crate::hooks::par_for;

/// Run `f` once for every index in `min .. min + size`, potentially from
/// several threads at once. Returns once every iteration has completed.
pub fn for_each_index<F>(min: i32, size: i32, f: F)
where
    F: Fn(i32) + Sync,
{
    try_for_each_index(min, size, |idx| {
        f(idx);
        0
    });
}

/// Like [`for_each_index`] for fallible iterations: `f` returns a status
/// code, zero meaning success. Returns zero when every iteration
/// succeeded, otherwise the status of one of the failing iterations.
pub fn try_for_each_index<F>(min: i32, size: i32, f: F) -> i32
where
    F: Fn(i32) -> i32 + Sync,
{
    fn trampoline<F>(_user_context: *mut c_void, idx: i32, closure: *mut u8) -> i32
    where
        F: Fn(i32) -> i32 + Sync,
    {
        // `closure` is the `&F` smuggled through `par_for` below; it
        // outlives the call because `par_for` does not return while any
        // iteration is outstanding.
        let f = unsafe { &*(closure as *const F) };
        f(idx)
    }

    par_for(
        ptr::null_mut(),
        trampoline::<F>,
        min,
        size,
        &f as *const F as *mut u8,
    )
}

//! Process-wide customization hooks.
//!
//! A host can replace per-iteration dispatch (`do_task`) or the whole
//! parallel-for implementation (`do_par_for`), for example to route
//! tasks through its own tracing layer or to substitute a different
//! scheduler entirely. The slots are atomically replaceable function
//! pointers; the scheduler takes no lock around them, and swapping while
//! a parallel-for is in flight is on the caller to avoid.

use std::ffi::c_void;
use std::mem;
use std::ptr;

use crate::core::job::Task;
use crate::core::sync::{AtomicPtr, Ordering};

/// Per-iteration dispatch hook: called for every claimed iteration with
/// the task callable and its arguments.
pub type DoTask = fn(user_context: *mut c_void, f: Task, idx: i32, closure: *mut u8) -> i32;

/// Whole-submission hook: called in place of the built-in parallel-for.
pub type DoParFor =
    fn(user_context: *mut c_void, f: Task, min: i32, size: i32, closure: *mut u8) -> i32;

// Null means the default is installed. The slots only ever hold values
// produced from `DoTask` / `DoParFor` function pointers.
static CUSTOM_DO_TASK: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());
static CUSTOM_DO_PAR_FOR: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// The default per-iteration dispatch: invoke the task callable.
pub fn default_do_task(user_context: *mut c_void, f: Task, idx: i32, closure: *mut u8) -> i32 {
    f(user_context, idx, closure)
}

/// The default parallel-for implementation: the scheduler in this crate.
pub fn default_do_par_for(
    user_context: *mut c_void,
    f: Task,
    min: i32,
    size: i32,
    closure: *mut u8,
) -> i32 {
    crate::core::default_do_par_for(user_context, f, min, size, closure)
}

/// Install a replacement for per-iteration dispatch. Pass
/// [`default_do_task`] to restore the built-in behavior.
pub fn set_custom_do_task(hook: DoTask) {
    CUSTOM_DO_TASK.store(hook as *mut (), Ordering::Release);
}

/// Install a replacement for the whole parallel-for entry point. Pass
/// [`default_do_par_for`] to restore the built-in scheduler.
pub fn set_custom_do_par_for(hook: DoParFor) {
    CUSTOM_DO_PAR_FOR.store(hook as *mut (), Ordering::Release);
}

/// Run one iteration through the installed `do_task` hook.
pub fn do_task(user_context: *mut c_void, f: Task, idx: i32, closure: *mut u8) -> i32 {
    let hook = CUSTOM_DO_TASK.load(Ordering::Acquire);
    if hook.is_null() {
        default_do_task(user_context, f, idx, closure)
    } else {
        let hook: DoTask = unsafe { mem::transmute(hook) };
        hook(user_context, f, idx, closure)
    }
}

/// Submit a parallel-for: run `f` once for every index in
/// `min .. min + size`, potentially from several threads at once, and
/// block until every iteration has completed.
///
/// Returns zero when every iteration succeeded, otherwise the status of
/// one of the failing iterations. A `size` of zero (or less) returns
/// zero without invoking `f`.
///
/// The pool is initialized lazily on the first submission. Iterations of
/// one job are claimed in ascending index order but may complete in any
/// order; jobs submitted from inside a task are serviced before the
/// enclosing job's remaining iterations. `user_context` and `closure`
/// are passed through to `f` untouched and must stay valid until the
/// call returns.
pub fn par_for(user_context: *mut c_void, f: Task, min: i32, size: i32, closure: *mut u8) -> i32 {
    let hook = CUSTOM_DO_PAR_FOR.load(Ordering::Acquire);
    if hook.is_null() {
        default_do_par_for(user_context, f, min, size, closure)
    } else {
        let hook: DoParFor = unsafe { mem::transmute(hook) };
        hook(user_context, f, min, size, closure)
    }
}

#[test]
fn default_dispatch_invokes_the_callable() {
    fn double(_user_context: *mut c_void, idx: i32, closure: *mut u8) -> i32 {
        let out = closure as *mut i32;
        unsafe {
            *out = idx * 2;
        }
        0
    }

    let mut out = 0i32;
    let status = do_task(ptr::null_mut(), double, 21, &mut out as *mut i32 as *mut u8);
    assert_eq!(status, 0);
    assert_eq!(out, 42);
}

//! Customization hooks.
//!
//! Own binary: the hook slots are process-wide, so these tests must not
//! share a process with submissions that expect the defaults.

use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

use brigade::{
    default_do_par_for, default_do_task, do_task, for_each_index, set_custom_do_par_for,
    set_custom_do_task, try_for_each_index, Task,
};

static TASKS_DISPATCHED: AtomicUsize = AtomicUsize::new(0);

fn counting_do_task(user_context: *mut c_void, f: Task, idx: i32, closure: *mut u8) -> i32 {
    TASKS_DISPATCHED.fetch_add(1, Ordering::Relaxed);
    default_do_task(user_context, f, idx, closure)
}

static SERIAL_CALLS: AtomicUsize = AtomicUsize::new(0);

fn serial_do_par_for(
    user_context: *mut c_void,
    f: Task,
    min: i32,
    size: i32,
    closure: *mut u8,
) -> i32 {
    SERIAL_CALLS.fetch_add(1, Ordering::Relaxed);
    let mut exit_status = 0;
    for idx in min..min + size {
        let status = do_task(user_context, f, idx, closure);
        if status != 0 {
            exit_status = status;
        }
    }
    exit_status
}

#[test]
fn hooks_replace_dispatch_and_par_for() {
    // A custom do_task observes every iteration of a submission.
    set_custom_do_task(counting_do_task);

    let ran = AtomicUsize::new(0);
    for_each_index(0, 123, |_| {
        ran.fetch_add(1, Ordering::Relaxed);
    });

    assert_eq!(ran.load(Ordering::Relaxed), 123);
    assert_eq!(TASKS_DISPATCHED.load(Ordering::Relaxed), 123);

    set_custom_do_task(default_do_task);

    // Replacing do_par_for bypasses the pool entirely: everything runs
    // serially on the submitting thread.
    set_custom_do_par_for(serial_do_par_for);

    let submitter = std::thread::current().id();
    let status = try_for_each_index(0, 10, |idx| {
        assert_eq!(std::thread::current().id(), submitter);
        if idx == 3 {
            9
        } else {
            0
        }
    });

    assert_eq!(status, 9);
    assert_eq!(SERIAL_CALLS.load(Ordering::Relaxed), 1);

    set_custom_do_par_for(default_do_par_for);

    // Back on the built-in scheduler.
    let ran = AtomicUsize::new(0);
    for_each_index(0, 50, |_| {
        ran.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(ran.load(Ordering::Relaxed), 50);
}

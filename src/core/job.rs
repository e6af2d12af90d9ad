use std::ffi::c_void;

/// The per-iteration callable of a parallel-for.
///
/// Invoked exactly once for each index of the submitted range, with the
/// user context and closure pointers that were handed to [`par_for`].
/// A non-zero return marks the iteration as failed; the scheduler keeps
/// running the remaining iterations regardless.
///
/// [`par_for`]: crate::par_for
pub type Task = fn(user_context: *mut c_void, idx: i32, closure: *mut u8) -> i32;

/// One outstanding parallel-for.
///
/// The record lives on the submitter's stack for the whole call and is
/// shared with the pool as a raw pointer linked into the queue's job
/// stack. The caller asserts that the record remains valid for as long as
/// `running()` holds, and every dereference happens with the queue mutex
/// held.
pub(crate) struct Job {
    /// Called once per claimed index.
    pub task: Task,
    /// Opaque pointer passed back to the task.
    pub user_context: *mut c_void,
    /// Opaque closure bytes passed back to the task.
    pub closure: *mut u8,
    /// The next unclaimed index.
    pub next: i32,
    /// One past the last index.
    pub max: i32,
    /// Threads currently executing a claimed iteration of this job.
    pub active_workers: i32,
    /// Zero until an iteration fails, then the status of the most recent
    /// failure.
    pub exit_status: i32,
    /// The job beneath this one on the stack, or null.
    pub next_job: *mut Job,
}

impl Job {
    /// A job is running while it has unclaimed iterations or a thread is
    /// still executing a claimed one. The submitter must not return, and
    /// the record must not move, until this is false.
    pub fn running(&self) -> bool {
        self.next < self.max || self.active_workers > 0
    }
}

pub(crate) struct AbortIfPanic;

impl Drop for AbortIfPanic {
    fn drop(&mut self) {
        eprintln!("task panicked; aborting");
        std::process::abort();
    }
}

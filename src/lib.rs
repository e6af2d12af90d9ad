//! A parallel-for work scheduler backing a data-parallel compute runtime.
//!
//! Client code submits bounded index ranges ("jobs") whose iterations are
//! independent; the scheduler runs them across a fixed-size pool of
//! worker threads. The design in brief:
//!
//! - One process-wide work queue: a single mutex, three condition
//!   variables, and a LIFO stack of in-flight jobs.
//! - Workers are split into an "A team" that looks for work and a "B
//!   team" parked on its own condition variable, so that small
//!   submissions don't keep every thread waking up for nothing.
//! - Submitters help: the thread that calls [`par_for`] runs the worker
//!   loop on its own job, which is what keeps nested submissions from
//!   deadlocking the pool.
//! - Jobs are serviced LIFO, so nested jobs drain before their parent's
//!   remaining iterations. There is no work stealing across jobs, only
//!   iteration claiming within one.
//!
//! The pool is initialized lazily on the first submission. Its size
//! comes from [`set_num_threads`], the `HL_NUM_THREADS` environment
//! variable (legacy alias `HL_NUMTHREADS`), or the host CPU count,
//! clamped to [`MAX_THREADS`].

mod core;
pub mod helpers;
mod hooks;

pub use crate::core::job::Task;
pub use crate::core::shutdown::shutdown_thread_pool;
pub use crate::core::{pool_status, set_num_threads, PoolStatus, MAX_THREADS};
pub use crate::helpers::{for_each_index, try_for_each_index};
pub use crate::hooks::{
    default_do_par_for, default_do_task, do_task, par_for, set_custom_do_par_for,
    set_custom_do_task, DoParFor, DoTask,
};

pub mod job;
pub mod shutdown;
/// basic std::sync types reexported here so that the rest of the crate
/// goes through a single module.
pub mod sync;

use std::ffi::c_void;
use std::ptr;

use crossbeam_utils::CachePadded;

use self::job::{AbortIfPanic, Job, Task};
use self::sync::{thread, Condvar, Mutex};

/// Upper bound on the pool size. Environment overrides and explicit
/// requests are clamped to `[1, MAX_THREADS]`.
pub const MAX_THREADS: i32 = 64;

/// Everything the scheduler mutates, guarded by the one queue mutex.
pub(crate) struct QueueState {
    /// Head of the singly linked LIFO job stack, or null. The records
    /// live on their submitters' stack frames; the pointers are only
    /// dereferenced with the mutex held.
    jobs: *mut Job,

    /// Worker threads are divided into an A team and a B team. The B
    /// team sleeps on the `wakeup_b_team` condition. A thread that wakes
    /// up and finds `a_team_size > target_a_team_size` moves to the B
    /// team; one that wakes up on the B-team condition moves back. The
    /// target is adjusted on every submission.
    a_team_size: i32,
    target_a_team_size: i32,

    /// Join handles for the spawned workers, taken by shutdown.
    threads: Vec<thread::JoinHandle<()>>,

    /// When set, workers without an owned job must exit.
    shutdown: bool,

    /// One-shot lazy-init latch. Cleared again by shutdown so a later
    /// submission re-initializes the pool.
    initialized: bool,

    /// Pool size. Zero until resolved, either explicitly through
    /// `set_num_threads` or from the environment / host CPU count during
    /// lazy init. Fixed for as long as the pool is live.
    num_threads: i32,

    /// Size requested through `set_num_threads` while a pool was live,
    /// or zero. Consumed by the next lazy init.
    requested_num_threads: i32,
}

// The raw job pointers are only dereferenced with the mutex held, and
// point into submitter stack frames that outlive their job's `running`
// predicate.
unsafe impl Send for QueueState {}

pub(crate) struct WorkQueue {
    state: CachePadded<Mutex<QueueState>>,

    /// Broadcast whenever a job stops running.
    wakeup_owners: Condvar,
    /// Broadcast whenever jobs are pushed onto the stack.
    wakeup_a_team: Condvar,
    /// Also broadcast on push when the submission needs more workers
    /// than the current A team supplies.
    wakeup_b_team: Condvar,
}

/// The work queue is a process-wide singleton: one pool is shared by
/// every submitter in the program. All primitives are const-constructed,
/// so the first `lock()` is safe before lazy init has run.
pub(crate) static WORK_QUEUE: WorkQueue = WorkQueue {
    state: CachePadded::new(Mutex::new(QueueState {
        jobs: ptr::null_mut(),
        a_team_size: 0,
        target_a_team_size: 0,
        threads: Vec::new(),
        shutdown: false,
        initialized: false,
        num_threads: 0,
        requested_num_threads: 0,
    })),
    wakeup_owners: Condvar::new(),
    wakeup_a_team: Condvar::new(),
    wakeup_b_team: Condvar::new(),
};

/// The loop run by every pool thread, and by submitters for the duration
/// of their own job.
///
/// `owned_job` is null for pool threads, which stay here until shutdown.
/// A submitter passes its own job and leaves as soon as that job stops
/// running. Both claim iterations from whatever job is on top of the
/// stack, so a submitter drains nested jobs before its own.
pub(crate) fn worker_thread(owned_job: *mut Job) {
    let mut state = WORK_QUEUE.state.lock().unwrap();

    loop {
        let keep_going = if owned_job.is_null() {
            !state.shutdown
        } else {
            unsafe { (*owned_job).running() }
        };
        if !keep_going {
            break;
        }

        if state.jobs.is_null() {
            if !owned_job.is_null() {
                // Nothing left to claim; wait for the last worker on our
                // job to signal completion.
                state = WORK_QUEUE.wakeup_owners.wait(state).unwrap();
            } else if state.a_team_size <= state.target_a_team_size {
                state = WORK_QUEUE.wakeup_a_team.wait(state).unwrap();
            } else {
                // The A team is over-sized for the current load. Park on
                // the B-team condition until a submission recalls us.
                state.a_team_size -= 1;
                state = WORK_QUEUE.wakeup_b_team.wait(state).unwrap();
                state.a_team_size += 1;
            }
        } else {
            // Claim one iteration from the job on top of the stack.
            let job = state.jobs;
            let (task, user_context, closure, idx) = unsafe {
                let j = &mut *job;
                let idx = j.next;
                j.next += 1;

                // Nothing left to claim: unlink the job. It stays alive
                // until its active workers are done with it.
                if j.next == j.max {
                    state.jobs = j.next_job;
                }

                j.active_workers += 1;

                (j.task, j.user_context, j.closure, idx)
            };

            drop(state);

            // A panic escaping the task would leave `active_workers`
            // elevated forever; abort rather than deadlock the owner.
            let abort = AbortIfPanic;
            let status = {
                profiling::scope!("task");
                crate::hooks::do_task(user_context, task, idx, closure)
            };
            std::mem::forget(abort);

            state = WORK_QUEUE.state.lock().unwrap();

            unsafe {
                let j = &mut *job;
                if status != 0 {
                    j.exit_status = status;
                }

                j.active_workers -= 1;

                if !j.running() && job != owned_job {
                    WORK_QUEUE.wakeup_owners.notify_all();
                }
            }
        }
    }
}

/// Pool-size override from the environment. `HL_NUM_THREADS` wins, with
/// `HL_NUMTHREADS` recognized as a legacy alias.
fn env_num_threads() -> Option<i32> {
    let value = std::env::var("HL_NUM_THREADS")
        .or_else(|_| std::env::var("HL_NUMTHREADS"))
        .ok()?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("ignoring unparsable thread count override {:?}", value);
            None
        }
    }
}

/// One-shot pool initialization, performed under the mutex on the first
/// submission (and again on the first submission after a shutdown).
fn lazy_init(state: &mut QueueState) {
    state.shutdown = false;
    state.jobs = ptr::null_mut();

    if state.requested_num_threads != 0 {
        state.num_threads = state.requested_num_threads;
        state.requested_num_threads = 0;
    }
    if state.num_threads == 0 {
        state.num_threads = match env_num_threads() {
            Some(n) => n,
            None => num_cpus::get() as i32,
        };
    }
    state.num_threads = state.num_threads.clamp(1, MAX_THREADS);

    log::debug!("initializing the thread pool with {} threads", state.num_threads);

    for i in 0..state.num_threads - 1 {
        let handle = thread::Builder::new()
            .name(format!("Worker#{}", i))
            .spawn(|| {
                profiling::register_thread!("Worker");

                worker_thread(ptr::null_mut());
            })
            .unwrap();
        state.threads.push(handle);
    }

    // Everyone starts on the A team.
    state.a_team_size = state.num_threads;

    state.initialized = true;
}

/// The default parallel-for implementation: push a job, wake the team,
/// and help with it until it stops running.
pub(crate) fn default_do_par_for(
    user_context: *mut c_void,
    f: Task,
    min: i32,
    size: i32,
    closure: *mut u8,
) -> i32 {
    profiling::scope!("par_for");

    let mut state = WORK_QUEUE.state.lock().unwrap();

    if !state.initialized {
        lazy_init(&mut state);
    }

    // An empty range has nothing to claim. Linking it would leave a node
    // on the stack that the `next == max` unlink test never removes.
    if size <= 0 {
        return 0;
    }

    let mut job = Job {
        task: f,
        user_context,
        closure,
        next: min,
        max: min + size,
        active_workers: 0,
        exit_status: 0,
        next_job: state.jobs,
    };
    let job_ptr: *mut Job = &mut job;

    if state.jobs.is_null() && size < state.num_threads {
        // No nested parallelism in flight and fewer iterations than
        // threads: shrink the A team so the surplus parks until a larger
        // job arrives.
        state.target_a_team_size = size;
    } else {
        state.target_a_team_size = state.num_threads;
    }

    // More iterations than awake workers: the B team is needed too.
    let wake_b_team = size > state.a_team_size;

    // Push the job onto the stack.
    state.jobs = job_ptr;

    drop(state);

    WORK_QUEUE.wakeup_a_team.notify_all();
    if wake_b_team {
        WORK_QUEUE.wakeup_b_team.notify_all();
    }

    // Help with our own submission. A submitter that merely blocked here
    // could deadlock nested parallel-for calls once every worker is
    // stuck waiting on an outer job.
    worker_thread(job_ptr);

    // `worker_thread` only returns for an owner once the job has stopped
    // running, at which point no other thread touches the record.
    job.exit_status
}

/// Explicitly size the pool, clamped to `[1, MAX_THREADS]`.
///
/// A live pool is not resized: its size stays fixed until
/// [`shutdown_thread_pool`] has been called, and the requested value
/// takes effect at the next lazy initialization.
///
/// [`shutdown_thread_pool`]: crate::shutdown_thread_pool
pub fn set_num_threads(num_threads: i32) {
    let mut state = WORK_QUEUE.state.lock().unwrap();
    let num_threads = num_threads.clamp(1, MAX_THREADS);
    if state.initialized {
        state.requested_num_threads = num_threads;
    } else {
        state.num_threads = num_threads;
    }
}

/// A snapshot of the pool's sizing state.
///
/// Intended for debugging and tests; none of it is stable from the
/// moment the mutex is released.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PoolStatus {
    pub initialized: bool,
    pub num_threads: i32,
    pub a_team_size: i32,
    pub target_a_team_size: i32,
}

pub fn pool_status() -> PoolStatus {
    let state = WORK_QUEUE.state.lock().unwrap();
    PoolStatus {
        initialized: state.initialized,
        num_threads: state.num_threads,
        a_team_size: state.a_team_size,
        target_a_team_size: state.target_a_team_size,
    }
}

#[test]
fn env_override_parsing() {
    std::env::set_var("HL_NUM_THREADS", "7");
    std::env::set_var("HL_NUMTHREADS", "3");
    assert_eq!(env_num_threads(), Some(7));

    std::env::remove_var("HL_NUM_THREADS");
    assert_eq!(env_num_threads(), Some(3));

    std::env::set_var("HL_NUM_THREADS", "not a number");
    assert_eq!(env_num_threads(), None);

    std::env::remove_var("HL_NUM_THREADS");
    std::env::remove_var("HL_NUMTHREADS");
    assert_eq!(env_num_threads(), None);
}

//! Pool sizing from the environment.
//!
//! Lives in its own test binary: the override is read exactly once, at
//! the first submission in the process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;

use brigade::{for_each_index, pool_status};

#[test]
fn single_thread_override_runs_on_the_submitter() {
    std::env::set_var("HL_NUM_THREADS", "1");

    let submitter = std::thread::current().id();
    let ran = AtomicUsize::new(0);
    let foreign: Mutex<Option<ThreadId>> = Mutex::new(None);

    for_each_index(0, 1000, |_| {
        ran.fetch_add(1, Ordering::Relaxed);
        let here = std::thread::current().id();
        if here != submitter {
            *foreign.lock().unwrap() = Some(here);
        }
    });

    assert_eq!(ran.load(Ordering::Relaxed), 1000);
    assert_eq!(*foreign.lock().unwrap(), None);
    assert_eq!(pool_status().num_threads, 1);
}

/// Shutdown
///
/// Workers without an owned job leave the worker loop once the shutdown
/// flag is set; broadcasting all three condition variables flushes every
/// parked thread through that check. The spawned threads are then joined
/// and the init latch cleared, so a later submission re-initializes the
/// pool from scratch.
use crate::core::WORK_QUEUE;

/// Tear the thread pool down.
///
/// No job may be outstanding: every `par_for` call must have returned
/// before this is invoked. A no-op when the pool was never initialized
/// or has already been shut down.
pub fn shutdown_thread_pool() {
    let mut state = WORK_QUEUE.state.lock().unwrap();
    if !state.initialized {
        return;
    }

    state.shutdown = true;
    let threads = std::mem::take(&mut state.threads);

    WORK_QUEUE.wakeup_owners.notify_all();
    WORK_QUEUE.wakeup_a_team.notify_all();
    WORK_QUEUE.wakeup_b_team.notify_all();

    drop(state);

    for handle in threads {
        let _ = handle.join();
    }

    log::debug!("thread pool shut down");

    WORK_QUEUE.state.lock().unwrap().initialized = false;
}

#[test]
fn init_shutdown_cycles() {
    use crate::core::{pool_status, set_num_threads};
    use crate::helpers::for_each_index;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Pin the size so this test doesn't depend on the host or the
    // environment.
    set_num_threads(4);

    // Shutting down a pool that was never started is a no-op.
    shutdown_thread_pool();
    assert!(!pool_status().initialized);

    for _ in 0..10 {
        let count = AtomicUsize::new(0);
        for_each_index(0, 100, |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 100);
        assert!(pool_status().initialized);
        assert_eq!(pool_status().num_threads, 4);

        shutdown_thread_pool();
        assert!(!pool_status().initialized);
    }
}

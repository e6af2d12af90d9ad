//! The legacy spelling of the pool-size override. Own binary, same
//! reason as `env_threads.rs`.

use std::sync::atomic::{AtomicUsize, Ordering};

use brigade::{for_each_index, pool_status};

#[test]
fn legacy_alias_sizes_the_pool() {
    std::env::set_var("HL_NUMTHREADS", "2");

    let ran = AtomicUsize::new(0);
    for_each_index(0, 100, |_| {
        ran.fetch_add(1, Ordering::Relaxed);
    });

    assert_eq!(ran.load(Ordering::Relaxed), 100);
    assert_eq!(pool_status().num_threads, 2);
}

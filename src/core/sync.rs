pub use std::sync::atomic::{AtomicPtr, Ordering};
pub use std::sync::{Condvar, Mutex};
pub use std::thread;

//! Per-thread identity, computed once per thread and reused by every record.

use std::io::Write;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
use std::sync::atomic::{AtomicI64, Ordering};

const TID_TEXT_CAP: usize = 32;

struct ThreadIdentity {
    tid: i64,
    text: [u8; TID_TEXT_CAP],
    len: usize,
}

impl ThreadIdentity {
    fn current() -> Self {
        let tid = os_tid();
        let mut text = [0u8; TID_TEXT_CAP];
        let len = {
            let mut rest: &mut [u8] = &mut text;
            let _ = write!(rest, "{:5} ", tid);
            TID_TEXT_CAP - rest.len()
        };
        Self { tid, text, len }
    }
}

thread_local! {
    static IDENTITY: ThreadIdentity = ThreadIdentity::current();
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn os_tid() -> i64 {
    i64::from(nix::unistd::gettid().as_raw())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn os_tid() -> i64 {
    static NEXT_TID: AtomicI64 = AtomicI64::new(1);
    NEXT_TID.fetch_add(1, Ordering::Relaxed)
}

/// Numeric id of the calling thread (the kernel tid on Linux).
pub fn tid() -> i64 {
    IDENTITY.with(|identity| identity.tid)
}

/// Runs `f` with the cached record prefix for this thread: the id right
/// aligned to five columns followed by a space.
pub fn with_tid_str<R>(f: impl FnOnce(&[u8]) -> R) -> R {
    IDENTITY.with(|identity| f(&identity.text[..identity.len]))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn is_main_thread() -> bool {
    tid() == i64::from(nix::unistd::getpid().as_raw())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn is_main_thread() -> bool {
    std::thread::current().name() == Some("main")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tid_is_stable_per_thread() {
        assert_eq!(tid(), tid());
    }

    #[test]
    fn test_threads_get_distinct_ids() {
        let here = tid();
        let there = thread::spawn(tid).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn test_tid_text_is_padded() {
        let expected = format!("{:5} ", tid());
        with_tid_str(|text| assert_eq!(text, expected.as_bytes()));
    }

    #[test]
    fn test_spawned_thread_is_not_main() {
        assert!(!thread::spawn(is_main_thread).join().unwrap());
    }
}

//! Per-connection cap on concurrently running handlers.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Counting semaphore bounding handler fan-out.
#[derive(Debug)]
pub(crate) struct HandlerLimiter {
    available: Mutex<usize>,
    released: Condvar,
}

impl HandlerLimiter {
    pub(crate) fn new(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            available: Mutex::new(permits.max(1)),
            released: Condvar::new(),
        })
    }

    /// Blocks until a permit is free and takes it.
    pub(crate) fn acquire(self: &Arc<Self>) -> HandlerPermit {
        let mut available = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *available == 0 {
            available = self
                .released
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
        HandlerPermit {
            limiter: Arc::clone(self),
        }
    }

    /// Takes a permit if one is free.
    #[cfg(test)]
    pub(crate) fn try_acquire(self: &Arc<Self>) -> Option<HandlerPermit> {
        let mut available = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(HandlerPermit {
            limiter: Arc::clone(self),
        })
    }

    fn release(&self) {
        let mut available = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *available += 1;
        self.released.notify_one();
    }
}

/// Permit held by a running handler; released on drop.
#[derive(Debug)]
pub(crate) struct HandlerPermit {
    limiter: Arc<HandlerLimiter>,
}

impl Drop for HandlerPermit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn permits_are_bounded() {
        let limiter = HandlerLimiter::new(2);
        let first = limiter.try_acquire().expect("first permit");
        let _second = limiter.try_acquire().expect("second permit");
        assert!(limiter.try_acquire().is_none());
        drop(first);
        assert!(limiter.try_acquire().is_some());
    }

    #[test]
    fn zero_permits_is_treated_as_one() {
        let limiter = HandlerLimiter::new(0);
        assert!(limiter.try_acquire().is_some());
    }

    #[test]
    fn acquire_waits_for_a_release() {
        let limiter = HandlerLimiter::new(1);
        let held = limiter.acquire();
        let (tx, rx) = mpsc::channel();
        let waiter = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || {
                let _permit = limiter.acquire();
                tx.send(()).expect("send acquired");
            })
        };
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        drop(held);
        rx.recv_timeout(Duration::from_secs(2))
            .expect("waiter should acquire after release");
        waiter.join().expect("join waiter");
    }
}

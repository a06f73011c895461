//! Counting semaphore
//!
//! A blocking counting semaphore built from a `parking_lot` mutex and condition
//! variable. Waiters sleep on the condition variable; nothing spins.

use parking_lot::{Condvar, Mutex};

/// Counting semaphore with blocking `acquire`
#[derive(Debug, Default)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `permits` permits
    pub fn new(permits: usize) -> Self {
        Semaphore {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking while none are available
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Return one permit and wake a single waiter
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }

    /// Permits currently available
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_consumes_permits() {
        let semaphore = Semaphore::new(2);
        semaphore.acquire();
        semaphore.acquire();
        assert_eq!(semaphore.available(), 0);
    }

    #[test]
    fn test_release_adds_permit() {
        let semaphore = Semaphore::new(0);
        semaphore.release();
        assert_eq!(semaphore.available(), 1);
        semaphore.acquire();
        assert_eq!(semaphore.available(), 0);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let semaphore = Arc::new(Semaphore::new(0));
        let (tx, rx) = mpsc::channel();

        let waiter = {
            let semaphore = Arc::clone(&semaphore);
            thread::spawn(move || {
                semaphore.acquire();
                tx.send(()).unwrap();
            })
        };

        // Still blocked with no permits
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        semaphore.release();
        rx.recv_timeout(Duration::from_secs(5))
            .expect("waiter was not woken");
        waiter.join().unwrap();
        assert_eq!(semaphore.available(), 0);
    }
}

//! Bounded per-worker work queue
//!
//! This module provides the `WorkQueue`, a fixed-capacity circular buffer of
//! [`TransferRequest`]s with blocking push/pop and a one-shot exit signal.
//!
//! # Design
//!
//! Two counting semaphores track free slots (`spaces`) and readable slots
//! (`items`). The buffer itself sits behind a mutex that is held only for the
//! O(1) slot copy and index update.
//!
//! ```text
//! push:  spaces.acquire -> lock { slots[in] = r; in += 1 } -> items.release
//! pop:   items.acquire  -> lock { r = slots[out]; out += 1 } -> spaces.release
//! exit:  lock { should_exit = true } -> items.release   (first call only)
//! ```
//!
//! # Termination
//!
//! `request_exit` adds one `items` permit with no slot behind it. Each `pop`
//! consumes exactly one permit, so a worker first drains every real request
//! and then receives the extra permit while the buffer is empty. That pop
//! returns the termination sentinel ([`TransferRequest::sentinel`]).
//! Requests pushed before `request_exit` are therefore never lost.

use super::semaphore::Semaphore;
use crate::types::{EftError, TransferRequest, WorkerId};
use parking_lot::Mutex;

/// Default number of slots in each worker queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Circular buffer state guarded by the queue mutex
#[derive(Debug)]
struct RingBuffer {
    slots: Box<[TransferRequest]>,
    /// Next slot to write
    write_index: usize,
    /// Next slot to read
    read_index: usize,
    /// Requests written but not yet read
    len: usize,
    should_exit: bool,
}

/// Bounded blocking queue owned by one worker
///
/// Logically single-producer (the dispatcher) and single-consumer (the
/// worker), but safe for any number of either.
#[derive(Debug)]
pub struct WorkQueue {
    worker_id: WorkerId,
    capacity: usize,
    spaces: Semaphore,
    items: Semaphore,
    buffer: Mutex<RingBuffer>,
}

impl WorkQueue {
    /// Create an empty queue with `capacity` slots for worker `worker_id`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `capacity` is zero.
    pub fn new(worker_id: WorkerId, capacity: usize) -> Result<Self, EftError> {
        if capacity == 0 {
            return Err(EftError::config_error(
                "work queue capacity must be at least 1",
            ));
        }

        let slots = vec![TransferRequest::sentinel(worker_id); capacity].into_boxed_slice();

        Ok(WorkQueue {
            worker_id,
            capacity,
            spaces: Semaphore::new(capacity),
            items: Semaphore::new(0),
            buffer: Mutex::new(RingBuffer {
                slots,
                write_index: 0,
                read_index: 0,
                len: 0,
                should_exit: false,
            }),
        })
    }

    /// The worker this queue feeds
    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Requests currently buffered
    pub fn len(&self) -> usize {
        self.buffer.lock().len
    }

    /// Returns true if no request is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once `request_exit` has been called
    pub fn exit_requested(&self) -> bool {
        self.buffer.lock().should_exit
    }

    /// Append a request, blocking while the queue is full
    pub fn push(&self, request: TransferRequest) {
        self.spaces.acquire();
        {
            let mut buffer = self.buffer.lock();
            let slot = buffer.write_index;
            buffer.slots[slot] = request;
            buffer.write_index = (slot + 1) % self.capacity;
            buffer.len += 1;
        }
        self.items.release();
    }

    /// Remove the oldest request, blocking while the queue is empty
    ///
    /// Returns the termination sentinel once exit was requested and every
    /// previously pushed request has been popped.
    pub fn pop(&self) -> TransferRequest {
        self.items.acquire();

        let request = {
            let mut buffer = self.buffer.lock();
            if buffer.len == 0 {
                // Only the exit permit can wake us with nothing buffered
                debug_assert!(buffer.should_exit);
                return TransferRequest::sentinel(self.worker_id);
            }
            let slot = buffer.read_index;
            let request = buffer.slots[slot];
            buffer.read_index = (slot + 1) % self.capacity;
            buffer.len -= 1;
            request
        };

        self.spaces.release();
        request
    }

    /// Ask the consuming worker to stop once the queue drains
    ///
    /// Idempotent. Returns true only for the call that set the flag.
    pub fn request_exit(&self) -> bool {
        let mut buffer = self.buffer.lock();
        if buffer.should_exit {
            return false;
        }
        buffer.should_exit = true;
        self.items.release();
        true
    }
}

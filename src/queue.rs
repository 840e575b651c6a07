use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{Result, RingError};
use crate::ring::RingBuffer;

/// Cursor state guarded by the queue lock. `used` is the single source of
/// truth for how much is readable; `head` lives inside the ring.
#[derive(Debug)]
struct Shared {
    ring: RingBuffer,
    /// Offset of the next byte to be read. Always below capacity.
    tail: usize,
    /// Bytes written but not yet consumed. Never exceeds capacity.
    used: usize,
}

/// A bounded, blocking, FIFO byte queue over a [`RingBuffer`].
///
/// Monitor pattern: one mutex guards the ring and both cursors; two wait
/// conditions ("not full", "not empty") park producers and consumers
/// instead of busy-waiting. All mutation is linearized through the lock,
/// so bytes come out in exactly the order they went in, no matter how many
/// threads are pushing or pulling.
///
/// Dropping the queue while threads are still parked inside [`put`] or
/// [`get`] is a caller contract violation; the queue does not detect it.
///
/// [`put`]: BoundedQueue::put
/// [`get`]: BoundedQueue::get
pub struct BoundedQueue {
    shared: CachePadded<Mutex<Shared>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl BoundedQueue {
    /// Create a queue over a fresh ring of `capacity` bytes.
    ///
    /// # Arguments
    /// * `capacity` - Ring size in bytes; a positive multiple of the system
    ///   page size.
    ///
    /// # Returns
    /// * `Err(RingError)` if ring construction fails; see [`RingBuffer::new`]
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::with_ring(RingBuffer::new(capacity)?))
    }

    /// Wrap an existing ring. The queue takes over all cursor accounting;
    /// the ring's head must not have moved yet.
    pub fn with_ring(ring: RingBuffer) -> Self {
        let capacity = ring.capacity();
        Self {
            shared: CachePadded::new(Mutex::new(Shared {
                ring,
                tail: 0,
                used: 0,
            })),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue `bytes`, blocking while the queue lacks the free space.
    ///
    /// Concurrent producers are serialized by the lock; bytes of one call
    /// are never interleaved with another's.
    ///
    /// # Returns
    /// * `Err(RingError::OversizedRequest)` if `bytes.len()` exceeds the
    ///   capacity; rejected immediately, waiting could never satisfy it
    pub fn put(&self, bytes: &[u8]) -> Result<()> {
        self.put_inner(bytes, None)
    }

    /// Like [`put`](Self::put), but gives up after `timeout`.
    ///
    /// # Returns
    /// * `Err(RingError::Timeout)` on expiry, with the queue untouched
    pub fn put_timeout(&self, bytes: &[u8], timeout: Duration) -> Result<()> {
        self.put_inner(bytes, Some(Instant::now() + timeout))
    }

    fn put_inner(&self, bytes: &[u8], deadline: Option<Instant>) -> Result<()> {
        if bytes.len() > self.capacity {
            return Err(RingError::OversizedRequest {
                requested: bytes.len(),
                capacity: self.capacity,
            });
        }

        let mut shared = self.shared.lock();
        while shared.used + bytes.len() > self.capacity {
            self.block(&self.not_full, &mut shared, deadline)?;
        }

        shared.ring.put(bytes)?;
        shared.used += bytes.len();
        // Sizes are heterogeneous: the first parked consumer is not
        // necessarily one whose request now fits.
        self.not_empty.notify_all();
        Ok(())
    }

    /// Dequeue exactly `len` bytes, blocking while fewer are available.
    ///
    /// The result is an owned copy taken while holding the lock; the mapped
    /// bytes may be overwritten the moment a producer reacquires it.
    ///
    /// # Returns
    /// * `Err(RingError::OversizedRequest)` if `len` exceeds the capacity
    pub fn get(&self, len: usize) -> Result<Vec<u8>> {
        self.get_inner(len, None)
    }

    /// Like [`get`](Self::get), but gives up after `timeout`.
    ///
    /// # Returns
    /// * `Err(RingError::Timeout)` on expiry, with the queue untouched
    pub fn get_timeout(&self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        self.get_inner(len, Some(Instant::now() + timeout))
    }

    fn get_inner(&self, len: usize, deadline: Option<Instant>) -> Result<Vec<u8>> {
        if len > self.capacity {
            return Err(RingError::OversizedRequest {
                requested: len,
                capacity: self.capacity,
            });
        }

        let mut shared = self.shared.lock();
        while shared.used < len {
            self.block(&self.not_empty, &mut shared, deadline)?;
        }

        let bytes = shared.ring.view(shared.tail, len)?.into_owned();
        shared.tail = (shared.tail + len) % self.capacity;
        shared.used -= len;
        self.not_full.notify_all();
        Ok(bytes)
    }

    /// Park on `condvar`, releasing the lock for the duration of the wait
    /// and reacquiring it before returning.
    fn block(
        &self,
        condvar: &Condvar,
        shared: &mut MutexGuard<'_, Shared>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        match deadline {
            Some(deadline) => {
                if condvar.wait_until(shared, deadline).timed_out() {
                    return Err(RingError::Timeout);
                }
            }
            None => condvar.wait(shared),
        }
        Ok(())
    }

    /// Bytes currently buffered. A snapshot; stale as soon as it returns.
    pub fn len(&self) -> usize {
        self.shared.lock().used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the underlying ring in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

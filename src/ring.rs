use std::borrow::Cow;

use crate::error::{Result, RingError};
use crate::region::{map_region, page_size, WraparoundRegion};

/// A byte ring over a wraparound memory region.
///
/// The ring tracks only the write cursor (`head`). It does no freshness or
/// occupancy tracking of its own: a view handed out by [`RingBuffer::view`]
/// is stale the instant a later [`RingBuffer::put`] overwrites those bytes.
/// Synchronizing readers against writers is the caller's job; see
/// [`BoundedQueue`](crate::BoundedQueue) for the locked layer that does it.
#[derive(Debug)]
pub struct RingBuffer {
    region: Box<dyn WraparoundRegion>,
    capacity: usize,
    head: usize,
}

impl RingBuffer {
    /// Create a ring of `capacity` bytes.
    ///
    /// # Arguments
    /// * `capacity` - Size in bytes; must be a positive multiple of the
    ///   system page size (the double mapping works in whole pages).
    ///
    /// # Returns
    /// * `Err(RingError::InvalidCapacity)` for a zero or misaligned size,
    ///   rejected before any OS resource is acquired
    /// * `Err(RingError::MappingFailed | RingError::ResourceExhausted)` when
    ///   an OS mapping step fails; partial resources are already released
    pub fn new(capacity: usize) -> Result<Self> {
        let page_size = page_size();
        if capacity == 0 || capacity % page_size != 0 {
            return Err(RingError::InvalidCapacity {
                requested: capacity,
                page_size,
            });
        }

        let region = map_region(capacity)?;
        Ok(Self {
            region,
            capacity,
            head: 0,
        })
    }

    /// Copy `bytes` into the ring at the current head and advance the head.
    ///
    /// The copy is a single linear operation regardless of whether it
    /// crosses the physical end of the backing storage; the region hides
    /// the wraparound. Returns the number of bytes written.
    ///
    /// # Returns
    /// * `Err(RingError::OversizedRequest)` if `bytes.len()` exceeds the
    ///   capacity; the ring is left untouched
    pub fn put(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.len() > self.capacity {
            return Err(RingError::OversizedRequest {
                requested: bytes.len(),
                capacity: self.capacity,
            });
        }

        self.region.write_at(self.head, bytes);
        self.head = (self.head + bytes.len()) % self.capacity;
        Ok(bytes.len())
    }

    /// A read-only view of `len` bytes starting at `offset`, valid even when
    /// the range straddles the physical end of the backing storage.
    ///
    /// `offset` must be below the capacity; it is a cursor the caller owns
    /// (the queue's tail, or the ring's own head), so a violation is a bug,
    /// not an input error.
    ///
    /// # Returns
    /// * `Err(RingError::OversizedRequest)` if `len` exceeds the capacity
    pub fn view(&self, offset: usize, len: usize) -> Result<Cow<'_, [u8]>> {
        if len > self.capacity {
            return Err(RingError::OversizedRequest {
                requested: len,
                capacity: self.capacity,
            });
        }
        assert!(offset < self.capacity, "view offset {} out of range (capacity {})", offset, self.capacity);
        Ok(self.region.read_at(offset, len))
    }

    /// The whole buffer, as `capacity` bytes starting at the current head:
    /// oldest possible byte first, newest last. Zero-copy on the mirrored
    /// backend. This is the out-of-band snapshot a host-side reader consumes.
    pub fn window(&self) -> Cow<'_, [u8]> {
        self.region.read_at(self.head, self.capacity)
    }

    /// Offset of the next byte to be written.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Size of the ring in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

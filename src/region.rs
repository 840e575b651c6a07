// Wraparound memory backends.
// On Linux the region is a memfd-backed double mapping: the same physical
// capacity appears twice at adjacent virtual addresses, so any access of up
// to `capacity` bytes starting anywhere in [0, capacity) is one linear
// operation with no split branch.

use std::borrow::Cow;
use std::fmt::Debug;
#[cfg(target_os = "linux")]
use std::io;
#[cfg(target_os = "linux")]
use std::ptr::{self, NonNull};

#[cfg(target_os = "linux")]
use crate::error::RingError;
use crate::error::Result;

/// Size of a virtual memory page on this system.
pub fn page_size() -> usize {
    #[cfg(unix)]
    unsafe {
        libc::sysconf(libc::_SC_PAGESIZE) as usize
    }
    #[cfg(not(unix))]
    {
        4096
    }
}

/// A fixed-size byte region addressable as if it wrapped around at `capacity`.
///
/// Offsets passed to `write_at`/`read_at` must be below `capacity` and
/// lengths at most `capacity`; within those bounds every access is valid
/// even when it crosses the logical end of the region.
pub trait WraparoundRegion: Send + Debug {
    /// Size of the logical region in bytes.
    fn capacity(&self) -> usize;

    /// Copy `data` into the region starting at `offset`, wrapping at
    /// `capacity` if the copy runs past the end.
    fn write_at(&mut self, offset: usize, data: &[u8]);

    /// A read-only view of `len` bytes starting at `offset`. Borrowed when
    /// the backend can hand out one contiguous slice, owned when it has to
    /// stitch the two ends together.
    fn read_at(&self, offset: usize, len: usize) -> Cow<'_, [u8]>;
}

/// Map a new wraparound region of `capacity` bytes.
///
/// On Linux this is the mirrored double mapping; elsewhere a heap-backed
/// [`SplitRegion`] with the same contract but explicit wraparound copies.
/// `capacity` must already be validated (positive, page-aligned).
pub fn map_region(capacity: usize) -> Result<Box<dyn WraparoundRegion>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(MirroredRegion::map(capacity)?))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Ok(Box::new(SplitRegion::alloc(capacity)))
    }
}

/// The mirrored mapping: one anonymous memory object of `capacity` bytes,
/// mapped twice back to back into a reserved span of `2 * capacity`.
#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct MirroredRegion {
    base: NonNull<u8>,
    capacity: usize,
    fd: libc::c_int,
}

// The region is exclusively owned; the raw pointer never aliases another
// owner's mapping.
#[cfg(target_os = "linux")]
unsafe impl Send for MirroredRegion {}

#[cfg(target_os = "linux")]
impl MirroredRegion {
    /// Build the double mapping. Each step releases everything acquired by
    /// the previous steps on failure, so a failed construction leaks nothing.
    pub fn map(capacity: usize) -> Result<Self> {
        // Anonymous file backed by memory
        let fd = unsafe { libc::memfd_create(b"mirrorq_region\0".as_ptr().cast(), 0) };
        if fd < 0 {
            return Err(RingError::from_os(io::Error::last_os_error()));
        }

        // Size the backing object
        if unsafe { libc::ftruncate(fd, capacity as libc::off_t) } != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(RingError::from_os(err));
        }

        // Reserve twice the capacity of address space; let mmap pick where
        let span = 2 * capacity;
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                span,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(RingError::from_os(err));
        }
        let base = base as *mut u8;

        // Map the backing object over both halves of the reservation
        for half in 0..2 {
            let addr = unsafe { base.add(half * capacity) };
            let mapped = unsafe {
                libc::mmap(
                    addr as *mut libc::c_void,
                    capacity,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED | libc::MAP_FIXED,
                    fd,
                    0,
                )
            };
            if mapped == libc::MAP_FAILED {
                let err = io::Error::last_os_error();
                unsafe {
                    libc::munmap(base as *mut libc::c_void, span);
                    libc::close(fd);
                }
                return Err(RingError::from_os(err));
            }
        }

        Ok(Self {
            base: NonNull::new(base).unwrap(),
            capacity,
            fd,
        })
    }
}

#[cfg(target_os = "linux")]
impl Drop for MirroredRegion {
    fn drop(&mut self) {
        unsafe {
            // One munmap covers the reservation and both fixed mappings.
            libc::munmap(self.base.as_ptr() as *mut libc::c_void, 2 * self.capacity);
            libc::close(self.fd);
        }
    }
}

#[cfg(target_os = "linux")]
impl WraparoundRegion for MirroredRegion {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) {
        debug_assert!(offset < self.capacity);
        debug_assert!(data.len() <= self.capacity);
        // The second mapping continues the first, so one copy suffices even
        // when offset + data.len() crosses `capacity`.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), self.base.as_ptr().add(offset), data.len());
        }
    }

    fn read_at(&self, offset: usize, len: usize) -> Cow<'_, [u8]> {
        debug_assert!(offset < self.capacity);
        debug_assert!(len <= self.capacity);
        // Safety: [offset, offset + len) lies inside the 2 * capacity span.
        Cow::Borrowed(unsafe { std::slice::from_raw_parts(self.base.as_ptr().add(offset), len) })
    }
}

/// Portable fallback: plain heap storage with an explicit two-part copy on
/// wraparound. Same contract as the mirrored mapping, minus zero-copy reads
/// across the seam.
#[derive(Debug)]
pub struct SplitRegion {
    buf: Box<[u8]>,
}

impl SplitRegion {
    pub fn alloc(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
        }
    }
}

impl WraparoundRegion for SplitRegion {
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) {
        let cap = self.buf.len();
        debug_assert!(offset < cap);
        debug_assert!(data.len() <= cap);
        let first = data.len().min(cap - offset);
        self.buf[offset..offset + first].copy_from_slice(&data[..first]);
        self.buf[..data.len() - first].copy_from_slice(&data[first..]);
    }

    fn read_at(&self, offset: usize, len: usize) -> Cow<'_, [u8]> {
        let cap = self.buf.len();
        debug_assert!(offset < cap);
        debug_assert!(len <= cap);
        if offset + len <= cap {
            Cow::Borrowed(&self.buf[offset..offset + len])
        } else {
            let mut stitched = Vec::with_capacity(len);
            stitched.extend_from_slice(&self.buf[offset..]);
            stitched.extend_from_slice(&self.buf[..len - (cap - offset)]);
            Cow::Owned(stitched)
        }
    }
}

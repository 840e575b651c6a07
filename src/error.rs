use std::io;

use thiserror::Error;

/// Errors produced by ring construction and queue operations.
#[derive(Debug, Error)]
pub enum RingError {
    /// The requested capacity is not a positive multiple of the page size.
    /// Raised before any OS resource is acquired.
    #[error("requested capacity ({requested}) is not a positive multiple of the page size ({page_size})")]
    InvalidCapacity { requested: usize, page_size: usize },

    /// An OS-level mapping step failed during construction. Every resource
    /// acquired before the failing step has already been released.
    #[error("could not map ring memory: {0}")]
    MappingFailed(#[source] io::Error),

    /// Construction ran out of memory, address space, or descriptors.
    #[error("out of memory or descriptors while mapping ring memory: {0}")]
    ResourceExhausted(#[source] io::Error),

    /// A put or get asked for more bytes than the ring can ever hold.
    /// Rejected immediately; waiting would never help.
    #[error("request of {requested} bytes exceeds ring capacity ({capacity})")]
    OversizedRequest { requested: usize, capacity: usize },

    /// A blocking call exceeded its deadline. Queue state is untouched and
    /// the caller may retry.
    #[error("timed out waiting on the queue")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, RingError>;

impl RingError {
    /// Classify an OS error from a failed mmap/memfd step.
    #[cfg(target_os = "linux")]
    pub(crate) fn from_os(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOMEM) | Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOSPC) => {
                RingError::ResourceExhausted(err)
            }
            _ => RingError::MappingFailed(err),
        }
    }
}

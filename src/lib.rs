//! mirrorq: a virtual-memory mirrored ring buffer with a bounded blocking
//! byte queue layered on top.
//!
//! The ring maps one anonymous memory object at two adjacent virtual
//! addresses ("magic ring buffer"), so writes and reads that span the
//! logical end of the buffer are single linear operations and consumers get
//! genuinely zero-copy views. [`BoundedQueue`] adds a monitor (one lock,
//! two wait conditions) giving blocking, backpressured `put`/`get` across
//! any number of producer and consumer threads, with global FIFO ordering.
//!
//! In-process only: the backing object is descriptor-based but the design
//! targets a single address space. Payloads are raw byte blobs; framing and
//! serialization belong to the caller.

mod error;
mod queue;
pub mod region;
mod ring;

pub use error::{Result, RingError};
pub use queue::BoundedQueue;
pub use region::{map_region, page_size, WraparoundRegion};
pub use ring::RingBuffer;

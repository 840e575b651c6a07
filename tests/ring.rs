// Ring buffer construction and wraparound tests.
// Run with: cargo test --test ring

use std::borrow::Cow;

use mirrorq::region::SplitRegion;
use mirrorq::{page_size, RingBuffer, RingError, WraparoundRegion};

#[test]
fn rejects_non_page_multiple_capacity() {
    let err = RingBuffer::new(100).unwrap_err();
    match err {
        RingError::InvalidCapacity {
            requested,
            page_size: reported,
        } => {
            assert_eq!(requested, 100);
            assert_eq!(reported, page_size());
        }
        other => panic!("expected InvalidCapacity, got {other:?}"),
    }
}

#[test]
fn rejects_zero_capacity() {
    assert!(matches!(
        RingBuffer::new(0),
        Err(RingError::InvalidCapacity { requested: 0, .. })
    ));
}

#[test]
fn accepts_page_multiples() {
    let page = page_size();
    for pages in [1, 2, 16] {
        let ring = RingBuffer::new(pages * page).unwrap();
        assert_eq!(ring.capacity(), pages * page);
        assert_eq!(ring.head(), 0);
    }
}

#[test]
fn put_advances_head_modulo_capacity() {
    let page = page_size();
    let mut ring = RingBuffer::new(page).unwrap();

    let written = ring.put(&vec![7u8; page / 2]).unwrap();
    assert_eq!(written, page / 2);
    assert_eq!(ring.head(), page / 2);

    // Crosses the end: head wraps
    ring.put(&vec![8u8; (page / 2) + 100]).unwrap();
    assert_eq!(ring.head(), 100);
}

#[test]
fn oversized_put_leaves_ring_untouched() {
    let page = page_size();
    let mut ring = RingBuffer::new(page).unwrap();

    let err = ring.put(&vec![0u8; page + 1]).unwrap_err();
    assert!(matches!(err, RingError::OversizedRequest { .. }));
    assert_eq!(ring.head(), 0);
}

#[test]
fn wraparound_write_reads_back_contiguously() {
    // Write a 3/4 capacity pattern, then a 1/2 capacity pattern that
    // straddles the physical end of the backing storage.
    let cap = page_size();
    let (a_len, b_len) = (cap * 3 / 4, cap / 2);
    let a = vec![0xA5u8; a_len];
    let b: Vec<u8> = (0..b_len).map(|i| (i % 251) as u8).collect();

    let mut ring = RingBuffer::new(cap).unwrap();
    ring.put(&a).unwrap();
    ring.put(&b).unwrap();
    assert_eq!(ring.head(), (a_len + b_len) % cap);

    // The straddling range comes back as one contiguous run of B
    let view = ring.view(a_len, b_len).unwrap();
    assert_eq!(&view[..], &b[..]);

    // And the surviving prefix of A is still intact
    let head = ring.head();
    let view = ring.view(head, a_len - head).unwrap();
    assert_eq!(&view[..], &a[head..]);
}

#[cfg(target_os = "linux")]
#[test]
fn mirrored_view_is_borrowed_across_the_seam() {
    let cap = page_size();
    let mut ring = RingBuffer::new(cap).unwrap();
    ring.put(&vec![1u8; cap]).unwrap();

    // A range crossing the physical end still borrows straight from the
    // mapping: that is the zero-copy property the double mapping buys.
    let view = ring.view(cap - 16, 32).unwrap();
    assert!(matches!(view, Cow::Borrowed(_)));
    assert_eq!(view.len(), 32);
}

#[test]
fn view_rejects_oversized_length() {
    let cap = page_size();
    let ring = RingBuffer::new(cap).unwrap();
    assert!(matches!(
        ring.view(0, cap + 1),
        Err(RingError::OversizedRequest { .. })
    ));
}

#[test]
fn window_ends_with_latest_bytes() {
    let cap = page_size();
    let mut ring = RingBuffer::new(cap).unwrap();

    let pattern: Vec<u8> = (0..100u32).map(|i| i as u8).collect();
    ring.put(&pattern).unwrap();

    // The window starts at the head, so the bytes just written sit at its end
    let window = ring.window();
    assert_eq!(window.len(), cap);
    assert_eq!(&window[cap - 100..], &pattern[..]);
}

#[test]
fn empty_put_is_a_noop() {
    let cap = page_size();
    let mut ring = RingBuffer::new(cap).unwrap();
    assert_eq!(ring.put(&[]).unwrap(), 0);
    assert_eq!(ring.head(), 0);
}

// The portable fallback has to honor the same wraparound contract as the
// mirrored mapping, with an explicit two-part copy instead.
#[test]
fn split_region_stitches_across_the_seam() {
    let mut region = SplitRegion::alloc(64);

    region.write_at(48, &[0xEEu8; 32]);

    // Straight range: borrowed
    let inside = region.read_at(48, 16);
    assert!(matches!(inside, Cow::Borrowed(_)));
    assert_eq!(&inside[..], &[0xEEu8; 16]);

    // Straddling range: stitched into an owned copy
    let across = region.read_at(48, 32);
    assert!(matches!(across, Cow::Owned(_)));
    assert_eq!(&across[..], &[0xEEu8; 32]);

    // The tail of the write landed at the front of the buffer
    let front = region.read_at(0, 16);
    assert_eq!(&front[..], &[0xEEu8; 16]);
}

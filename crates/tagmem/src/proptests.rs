use proptest::prelude::*;

use crate::layout::{Span, BLOCK_SIZE};
use crate::{MemTransport, TagDevice};

proptest! {
    #[test]
    fn covering_count_matches_ceil(offset in 0usize..10_000, len in 1usize..4096) {
        let span = Span::new(0, offset, len).unwrap();
        prop_assert_eq!(span.blocks, (offset % BLOCK_SIZE + len).div_ceil(BLOCK_SIZE));
        prop_assert_eq!(span.offset, offset % BLOCK_SIZE);
        prop_assert_eq!(usize::from(span.start), offset / BLOCK_SIZE);
    }

    #[test]
    fn random_spans_round_trip(
        address in 0u16..64,
        offset in 0usize..48,
        data in proptest::collection::vec(any::<u8>(), 1..96),
    ) {
        let mut dev = TagDevice::new(MemTransport::new());
        let mut model = vec![0u8; MemTransport::BLOCKS * BLOCK_SIZE];

        dev.write_bytes(address, offset, &data).unwrap();
        let at = usize::from(address) * BLOCK_SIZE + offset;
        model[at..at + data.len()].copy_from_slice(&data);
        // The merge-on-write must not disturb anything outside the span.
        prop_assert_eq!(dev.transport().memory(), &model[..]);

        let mut out = vec![0u8; data.len()];
        dev.read_bytes(address, offset, &mut out).unwrap();
        prop_assert_eq!(out, data);
    }

    #[test]
    fn erase_is_idempotent(
        address in 0u16..64,
        offset in 0usize..48,
        len in 1usize..96,
        fill in 1u8..,
    ) {
        let mut dev = TagDevice::new(MemTransport::new());
        dev.write_bytes(0, 0, &vec![fill; 80 * BLOCK_SIZE]).unwrap();

        dev.erase_bytes(address, offset, len).unwrap();
        let once = dev.transport().memory().to_vec();

        dev.erase_bytes(address, offset, len).unwrap();
        prop_assert_eq!(dev.transport().memory(), &once[..]);

        let mut out = vec![fill; len];
        dev.read_bytes(address, offset, &mut out).unwrap();
        prop_assert!(out.iter().all(|&b| b == 0));
    }
}

// Property tests over the public API.

use delta16::{DecodeError, EncodeOptions, decode, encode_with_options};
use proptest::prelude::*;

fn encode_block(src: &[u8], dst: &[u8], block_size: usize) -> Vec<u8> {
    encode_with_options(
        src,
        0,
        dst,
        &EncodeOptions {
            block_size,
            ..Default::default()
        },
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_roundtrip_arbitrary(
        src in proptest::collection::vec(any::<u8>(), 0..512),
        dst in proptest::collection::vec(any::<u8>(), 0..512),
        block in 2usize..64,
    ) {
        let delta = encode_block(&src, &dst, block);
        prop_assert_eq!(decode(&src, 0, &delta).unwrap(), dst);
    }

    #[test]
    fn prop_roundtrip_rearranged(
        src in proptest::collection::vec(any::<u8>(), 64..1024),
        pivot_permille in 0usize..1000,
        flips in proptest::collection::vec((any::<prop::sample::Index>(), 1u8..=255), 0..8),
    ) {
        // Rotate the source and sprinkle a few byte edits; this is the
        // shape of input the fragment search is built for.
        let pivot = pivot_permille * src.len() / 1000;
        let mut dst = src[pivot..].to_vec();
        dst.extend_from_slice(&src[..pivot]);
        for (idx, mask) in &flips {
            let i = idx.index(dst.len());
            dst[i] ^= mask;
        }
        let delta = encode_block(&src, &dst, 16);
        prop_assert_eq!(decode(&src, 0, &delta).unwrap(), dst);
    }

    #[test]
    fn prop_identity_delta_is_small(
        src in proptest::collection::vec(any::<u8>(), 16..512),
    ) {
        let delta = encode_block(&src, &src, 16);
        // Header, one copy instruction, END, trailer.
        prop_assert!(delta.len() <= 16, "identity delta was {} bytes", delta.len());
    }

    #[test]
    fn prop_source_bit_flip_is_detected(
        src in proptest::collection::vec(any::<u8>(), 1..256),
        dst in proptest::collection::vec(any::<u8>(), 0..256),
        bit in any::<prop::sample::Index>(),
    ) {
        let delta = encode_block(&src, &dst, 8);
        let mut tampered = src.clone();
        let b = bit.index(tampered.len() * 8);
        tampered[b / 8] ^= 1 << (b % 8);
        let result = decode(&tampered, 0, &delta);
        let is_source_checksum_err = matches!(result, Err(DecodeError::SourceChecksum { .. }));
        prop_assert!(is_source_checksum_err);
    }

    #[test]
    fn prop_trailer_bit_flip_is_detected(
        src in proptest::collection::vec(any::<u8>(), 0..256),
        dst in proptest::collection::vec(any::<u8>(), 0..256),
        bit in 0usize..16,
    ) {
        let delta = encode_block(&src, &dst, 8);
        let mut tampered = delta.clone();
        let pos = tampered.len() - 2 + bit / 8;
        tampered[pos] ^= 1 << (bit % 8);
        let result = decode(&src, 0, &tampered);
        let is_dest_checksum_err = matches!(result, Err(DecodeError::DestinationChecksum { .. }));
        prop_assert!(is_dest_checksum_err);
    }
}

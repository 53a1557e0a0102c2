//! Property tests for shard partitioning.

use ggml_multipart::{
    partition, reassemble, split_ranges, BlockLayouts, Encoding, SplitAxis, TensorFrame,
};
use proptest::prelude::*;

fn raw_for(frame: &TensorFrame, layouts: &BlockLayouts, seed: u8) -> Vec<u8> {
    let len = frame.data_len(layouts).unwrap();
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn dense_encoding() -> impl Strategy<Value = Encoding> {
    prop_oneof![Just(Encoding::F32), Just(Encoding::F16)]
}

fn quant_encoding() -> impl Strategy<Value = Encoding> {
    prop_oneof![Just(Encoding::Q4_0), Just(Encoding::Q4_1)]
}

proptest! {
    /// Ranges cover the whole extent in order and differ in length by at most one.
    #[test]
    fn prop_ranges_conserve_extent(total in 1_usize..500, parts in 1_usize..16) {
        let ranges = split_ranges(total, parts);
        prop_assert_eq!(ranges.len(), parts);
        prop_assert_eq!(ranges.first().unwrap().start, 0);
        prop_assert_eq!(ranges.last().unwrap().end, total);
        for w in ranges.windows(2) {
            prop_assert_eq!(w[0].end, w[1].start);
            prop_assert!(w[0].len() >= w[1].len());
        }
        let max = ranges.iter().map(|r| r.len()).max().unwrap();
        let min = ranges.iter().map(|r| r.len()).min().unwrap();
        prop_assert!(max - min <= 1);
    }

    /// Dense row and column splits rebuild the original data.
    #[test]
    fn prop_dense_split_reassembles(
        enc in dense_encoding(),
        rows in 1_usize..24,
        cols in 1_usize..24,
        parts in 1_usize..6,
        column in any::<bool>(),
        seed in any::<u8>(),
    ) {
        let layouts = BlockLayouts::default();
        let axis = if column { SplitAxis::Column } else { SplitAxis::Row };
        let extent = if column { cols } else { rows };
        prop_assume!(parts <= extent);

        let frame = TensorFrame::new("layers.0.attention.wq.weight", enc, vec![rows, cols]);
        let raw = raw_for(&frame, &layouts, seed);
        let shards = partition(&frame, &raw, axis, &layouts, parts).unwrap();

        prop_assert_eq!(shards.len(), parts);
        let split_dim = if column { 1 } else { 0 };
        let total: usize = shards.iter().map(|s| s.extents[split_dim]).sum();
        prop_assert_eq!(total, extent);
        for s in &shards {
            prop_assert_eq!(s.extents[1 - split_dim], if column { rows } else { cols });
            prop_assert_eq!(s.data.len(), s.frame(&frame).data_len(&layouts).unwrap());
        }
        prop_assert_eq!(reassemble(&shards, axis), raw);
    }

    /// Quantized column splits on block boundaries rebuild the original data.
    #[test]
    fn prop_quantized_column_split_reassembles(
        enc in quant_encoding(),
        rows in 1_usize..8,
        blocks_per_part in 1_usize..4,
        parts in 1_usize..5,
        seed in any::<u8>(),
    ) {
        let layouts = BlockLayouts::default();
        let block = layouts.layout(enc).elements;
        let cols = blocks_per_part * parts * block;
        let frame = TensorFrame::new("output.weight", enc, vec![rows, cols]);
        let raw = raw_for(&frame, &layouts, seed);
        let shards = partition(&frame, &raw, SplitAxis::Column, &layouts, parts).unwrap();
        for s in &shards {
            prop_assert_eq!(s.extents.clone(), vec![rows, blocks_per_part * block]);
        }
        prop_assert_eq!(reassemble(&shards, SplitAxis::Column), raw);
    }

    /// Quantized row splits only need whole rows.
    #[test]
    fn prop_quantized_row_split_reassembles(
        enc in quant_encoding(),
        rows in 1_usize..16,
        blocks in 1_usize..4,
        parts in 1_usize..6,
        seed in any::<u8>(),
    ) {
        prop_assume!(parts <= rows);
        let layouts = BlockLayouts::default();
        let cols = blocks * layouts.layout(enc).elements;
        let frame = TensorFrame::new("tok_embeddings.weight", enc, vec![rows, cols]);
        let raw = raw_for(&frame, &layouts, seed);
        let shards = partition(&frame, &raw, SplitAxis::Row, &layouts, parts).unwrap();
        prop_assert_eq!(reassemble(&shards, SplitAxis::Row), raw);
    }
}

//! Property tests for fused batch padding and gradient accumulation

mod common;

use common::{task_registry, ByteTokenizer};
use loramux::batch::{FusedBatch, SegmentConfig, PAD_MULTIPLE};
use loramux::config::TrainConfig;
use loramux::train::TrainState;
use loramux::Tensor;
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn weights() -> BTreeMap<String, Tensor> {
    let mut weights = BTreeMap::new();
    weights.insert("q_proj.lora_A.weight".to_string(), Tensor::from_shape_vec(1, 2, vec![0.0; 2], true));
    weights.insert("q_proj.lora_B.weight".to_string(), Tensor::from_shape_vec(2, 1, vec![0.0; 2], true));
    weights
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_padded_len_bounds(longest in 0usize..5000, max_seq_len in 1usize..4096) {
        let padded = FusedBatch::padded_len(longest, max_seq_len);
        prop_assert!(padded <= max_seq_len);
        if longest < max_seq_len {
            prop_assert!(padded >= longest);
            prop_assert!(padded % PAD_MULTIPLE == 0 || padded == max_seq_len);
        } else {
            prop_assert_eq!(padded, max_seq_len);
        }
    }

    #[test]
    fn prop_fused_rows_share_length(lens in vec(1usize..40, 1..12)) {
        let tokens: Vec<Vec<u32>> = lens.iter().map(|&len| vec![7; len]).collect();
        let rows = tokens.len();
        let segments = vec![SegmentConfig::new("a", 0, rows)];
        let batch = FusedBatch::from_segments(segments, tokens, &ByteTokenizer, 64, false).unwrap();

        let seq_len = batch.seq_len().unwrap();
        prop_assert_eq!(seq_len % PAD_MULTIPLE, 0);
        for (mask, &len) in batch.attention_masks.iter().zip(&lens) {
            prop_assert_eq!(mask.len(), seq_len);
            prop_assert_eq!(mask.iter().filter(|m| **m).count(), len);
        }
    }

    #[test]
    fn prop_update_every_target_micro_batches(
        accumulation in 1usize..8,
        micro_batch_size in 1usize..8,
        micro_batches in 0u64..64,
    ) {
        let config = TrainConfig::new(accumulation * micro_batch_size, 0.01)
            .with_micro_batch_size(micro_batch_size)
            .with_optim("sgd")
            .with_task("sst2");
        let mut state = TrainState::from_registry("a", config, &task_registry()).unwrap();
        state.prepare(&weights()).unwrap();
        state.prepare_schedule(1, 128).unwrap();

        let mut updates = 0;
        for _ in 0..micro_batches {
            if state.step().unwrap() {
                updates += 1;
            }
        }
        prop_assert_eq!(updates, micro_batches / accumulation as u64);
        prop_assert_eq!(state.optimizer_steps(), updates);
        prop_assert_eq!(state.accumulation_count(), micro_batches);
        prop_assert_eq!(state.accumulation_target().unwrap(), accumulation);
    }
}

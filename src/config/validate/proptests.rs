//! Property-based tests for manifest validation

use super::error::SpecError;
use super::validator::validate_spec;
use crate::config::schema::*;
use crate::config::TrainConfig;
use crate::lora::LoraConfig;
use proptest::prelude::*;
use std::path::PathBuf;

fn spec_with(batch_size: usize, micro_batch_size: usize, lr: f32, ratio: f32) -> RunSpec {
    RunSpec {
        base_model: "stub/base".to_string(),
        save_dir: PathBuf::from("out"),
        save_step: 10,
        max_seq_len: 256,
        adapters: vec![AdapterSpec {
            lora: LoraConfig::new("a", 8, 16.0),
            train: TrainConfig::new(batch_size, lr)
                .with_micro_batch_size(micro_batch_size)
                .with_lr_ratio(ratio)
                .with_task("arc-c"),
            validation: None,
        }],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_divisible_batches_pass(
        micro in 1usize..32,
        steps in 1usize..16,
        lr in 1e-6f32..1.0,
        ratio in 1.0f32..32.0,
    ) {
        prop_assert!(validate_spec(&spec_with(micro * steps, micro, lr, ratio)).is_ok());
    }

    #[test]
    fn prop_indivisible_batches_fail(micro in 2usize..32, steps in 1usize..16, offset in 1usize..32) {
        let offset = offset % micro;
        prop_assume!(offset != 0);
        let batch_size = micro * steps + offset;
        let is_batch_error = matches!(
            validate_spec(&spec_with(batch_size, micro, 1e-3, 1.0)),
            Err(SpecError::InvalidBatchSize { .. })
        );
        prop_assert!(is_batch_error);
    }

    #[test]
    fn prop_ratio_below_one_fails(ratio in 0.0f32..0.999) {
        let is_ratio_error = matches!(
            validate_spec(&spec_with(8, 4, 1e-3, ratio)),
            Err(SpecError::InvalidLrRatio { .. })
        );
        prop_assert!(is_ratio_error);
    }
}

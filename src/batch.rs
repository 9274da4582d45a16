//! Fused multi-adapter batches
//!
//! A [`FusedBatch`] stacks the examples of several adapters into one padded token
//! matrix. Each adapter owns a contiguous row range described by a
//! [`SegmentConfig`].

use crate::error::{Error, Result};
use crate::task::{TokenId, Tokenizer};

/// Sequences are padded to a multiple of this many tokens
pub const PAD_MULTIPLE: usize = 8;

/// Row range of one adapter inside a fused batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentConfig {
    pub adapter_name: String,
    pub batch_start: usize,
    pub batch_end: usize,
}

impl SegmentConfig {
    pub fn new(adapter_name: impl Into<String>, batch_start: usize, batch_end: usize) -> Self {
        Self { adapter_name: adapter_name.into(), batch_start, batch_end }
    }

    /// Number of rows in the segment
    pub fn len(&self) -> usize {
        self.batch_end - self.batch_start
    }

    pub fn is_empty(&self) -> bool {
        self.batch_end == self.batch_start
    }
}

/// One forward pass worth of data for several adapters
#[derive(Debug, Clone, PartialEq)]
pub struct FusedBatch {
    pub segments: Vec<SegmentConfig>,
    pub tokens: Vec<Vec<TokenId>>,
    pub attention_masks: Vec<Vec<bool>>,
    pub inference_mode: bool,
}

impl FusedBatch {
    /// Padded length for a slice whose longest sequence has `max_tokens_len` tokens
    ///
    /// Rounds up to a multiple of [`PAD_MULTIPLE`], never exceeding `max_seq_len`.
    pub fn padded_len(max_tokens_len: usize, max_seq_len: usize) -> usize {
        if max_tokens_len >= max_seq_len {
            return max_seq_len;
        }
        max_tokens_len.div_ceil(PAD_MULTIPLE).saturating_mul(PAD_MULTIPLE).min(max_seq_len)
    }

    /// Pad every sequence to a shared length and derive attention masks
    ///
    /// Sequences must already be truncated to `max_seq_len`.
    pub fn from_segments(
        segments: Vec<SegmentConfig>,
        mut tokens: Vec<Vec<TokenId>>,
        tokenizer: &dyn Tokenizer,
        max_seq_len: usize,
        inference_mode: bool,
    ) -> Result<Self> {
        let max_tokens_len = tokens.iter().map(Vec::len).max().unwrap_or(0);
        let padded_len = Self::padded_len(max_tokens_len, max_seq_len);
        let pad_id = tokenizer.pad_id();

        let attention_masks = tokens
            .iter_mut()
            .map(|seq| {
                seq.resize(padded_len, pad_id);
                tokenizer.mask_from(seq)
            })
            .collect();

        let batch = Self { segments, tokens, attention_masks, inference_mode };
        batch.validate()?;
        Ok(batch)
    }

    /// Number of rows (sequences) in the batch
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Shared sequence length, if the batch has rows
    pub fn seq_len(&self) -> Option<usize> {
        self.tokens.first().map(Vec::len)
    }

    /// Segment belonging to an adapter
    pub fn segment(&self, adapter_name: &str) -> Option<&SegmentConfig> {
        self.segments.iter().find(|s| s.adapter_name == adapter_name)
    }

    /// Check the segment partition and the shared padded length
    pub fn validate(&self) -> Result<()> {
        let mut cursor = 0;
        for segment in &self.segments {
            if segment.batch_start != cursor || segment.batch_end < segment.batch_start {
                return Err(Error::InvalidBatch(format!(
                    "segment {} covers {}..{}, expected to start at {cursor}",
                    segment.adapter_name, segment.batch_start, segment.batch_end
                )));
            }
            cursor = segment.batch_end;
        }
        if cursor != self.tokens.len() {
            return Err(Error::InvalidBatch(format!(
                "segments cover {cursor} rows but the batch has {}",
                self.tokens.len()
            )));
        }
        if self.attention_masks.len() != self.tokens.len() {
            return Err(Error::InvalidBatch("one attention mask per row required".to_string()));
        }
        if let Some(len) = self.seq_len() {
            let uneven = self
                .tokens
                .iter()
                .zip(&self.attention_masks)
                .any(|(seq, mask)| seq.len() != len || mask.len() != len);
            if uneven {
                return Err(Error::InvalidBatch("rows differ in padded length".to_string()));
            }
        }
        Ok(())
    }
}

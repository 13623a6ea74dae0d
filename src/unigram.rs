//! Quantized sampling table for negative-sample draws.

/// Slots in the table built for a real training run. More slots means less
/// quantization error for rare tokens; the cost is one `u32` per slot.
const TABLE_SIZE: usize = 10_000_000;

const POWER: f64 = 0.75;

/// Flat map from table slot to vocabulary index, laid out so that a uniform
/// slot draw approximates sampling from the smoothed (`count^0.75`) unigram
/// distribution in O(1).
pub(crate) struct UnigramTable {
    slots: Vec<u32>,
}

impl UnigramTable {
    /// `counts` are taken in vocabulary order (descending frequency).
    pub(crate) fn new(counts: &[u64]) -> Self {
        Self::with_len(counts, TABLE_SIZE)
    }

    pub(crate) fn with_len(counts: &[u64], len: usize) -> Self {
        let total: f64 = counts.iter().map(|&c| (c as f64).powf(POWER)).sum();

        let mut slots = Vec::with_capacity(len);
        let mut i = 0usize;
        let mut d1 = (counts[0] as f64).powf(POWER) / total;
        for a in 0..len {
            slots.push(i as u32);
            if a as f64 / len as f64 > d1 {
                // Clamp before reading: rounding can ask for one entry past
                // the end of the vocabulary.
                i = (i + 1).min(counts.len() - 1);
                d1 += (counts[i] as f64).powf(POWER) / total;
            }
        }
        UnigramTable { slots }
    }

    /// Map a raw generator value to a vocabulary index.
    pub(crate) fn sample(&self, r: u64) -> usize {
        self.slots[(r >> 16) as usize % self.slots.len()] as usize
    }
}

//! The shared neural-network weight state.
//!
//! All three matrices are written concurrently by worker threads without
//! locks. Individual updates are tiny, almost always hit disjoint rows, and
//! are averaged out over enormous numbers of iterations, so lost updates do
//! not hurt convergence. Do not add synchronization around element access:
//! the relaxed-atomic cell below is exactly as strong as this design needs.

use std::sync::atomic::{AtomicU32, Ordering};

use aligned_box::AlignedBox;

use crate::real;
use crate::rng::Rng;

/// An `f32` cell that tolerates unsynchronized concurrent reads and writes.
#[derive(Default)]
#[repr(transparent)]
pub(crate) struct Real {
    bits: AtomicU32,
}

impl Real {
    pub(crate) fn get(&self) -> real {
        real::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, value: real) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn add(&self, x: real) {
        let a = self.get();
        self.set(a + x);
    }
}

/// The three weight matrices, each `vocab_size` rows of `layer_size`.
pub(crate) struct SharedWeights {
    layer_size: usize,
    /// Input vectors, one row per token. This matrix is the trained output.
    embeddings: AlignedBox<[Real]>,
    /// Hierarchical-softmax internal-node vectors.
    node_weights: AlignedBox<[Real]>,
    /// Negative-sampling output vectors.
    noise_weights: AlignedBox<[Real]>,
}

impl SharedWeights {
    pub(crate) fn new(vocab_size: usize, layer_size: usize) -> Self {
        let alloc = || {
            AlignedBox::slice_from_default(128, vocab_size * layer_size)
                .expect("memory allocation failed")
        };
        let weights = SharedWeights {
            layer_size,
            embeddings: alloc(),
            node_weights: alloc(),
            noise_weights: alloc(),
        };
        weights.init_embeddings(vocab_size);
        weights
    }

    /// Fill the embedding rows with small offsets from the fixed generator
    /// stream; the other two matrices stay at zero.
    fn init_embeddings(&self, vocab_size: usize) {
        let mut rng = Rng(1);
        for a in 0..vocab_size {
            rng.rand_u64(); // burn one draw per row
            for b in 0..self.layer_size {
                self.embeddings[a * self.layer_size + b]
                    .set((rng.rand_real() - 0.5) / self.layer_size as real);
            }
        }
    }

    pub(crate) fn embedding_row(&self, idx: usize) -> &[Real] {
        &self.embeddings[idx * self.layer_size..][..self.layer_size]
    }

    pub(crate) fn node_row(&self, idx: usize) -> &[Real] {
        &self.node_weights[idx * self.layer_size..][..self.layer_size]
    }

    pub(crate) fn noise_row(&self, idx: usize) -> &[Real] {
        &self.noise_weights[idx * self.layer_size..][..self.layer_size]
    }

    /// Snapshot the embedding matrix as plain floats, row-major.
    pub(crate) fn export_embeddings(&self) -> Vec<real> {
        self.embeddings.iter().map(Real::get).collect()
    }
}

//! The training scheduler and the worker loop shared by both architectures.

use std::any::Any;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rayon::ThreadPoolBuilder;

use crate::cbow;
use crate::config::{Architecture, Config};
use crate::error::{Error, Result};
use crate::huffman::{self, HuffmanNode};
use crate::model::Model;
use crate::net::{Real, SharedWeights};
use crate::progress::{ProgressListener, Stage};
use crate::real;
use crate::rng::Rng;
use crate::sigmoid::{sigmoid_table, MAX_EXP};
use crate::skipgram;
use crate::unigram::UnigramTable;
use crate::vocab::Vocabulary;

/// Sentences longer than this train as multiple chunks.
const MAX_SENTENCE_LENGTH: usize = 1000;

/// Sentences handed to one worker task.
const BATCH_SIZE: usize = 1024;

/// A worker folds its token count into the shared total (and refreshes the
/// learning rate) after locally processing this many tokens.
const LEARNING_RATE_UPDATE_FREQUENCY: u64 = 10_000;

/// The learning rate never decays below this fraction of its initial value.
const MIN_LEARNING_RATE_FACTOR: f64 = 1e-4;

/// Degrade the learning rate linearly towards zero, with a floor.
fn decayed_learning_rate(initial: real, processed: u64, total: u64) -> real {
    let factor = (1.0 - processed as f64 / total as f64).max(MIN_LEARNING_RATE_FACTOR);
    initial * factor as real
}

/// Trains token embeddings over a fixed vocabulary.
pub struct Trainer {
    config: Config,
}

impl Trainer {
    /// Validates the configuration eagerly; nothing is computed yet.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Trainer { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the configured number of training iterations over `sentences` and
    /// return the trained embedding table.
    ///
    /// Tokens missing from `vocab` are ignored. The vocabulary must have at
    /// least two entries.
    pub fn train<T>(
        &self,
        vocab: &Vocabulary<T>,
        sentences: &[Vec<T>],
        listener: &dyn ProgressListener,
    ) -> Result<Model<T>>
    where
        T: Clone + Eq + Hash,
    {
        let nodes = huffman::encode(vocab.counts(), listener)?;

        // Map sentences onto dense indices once, up front; out-of-vocabulary
        // tokens drop out here.
        let encoded: Vec<Vec<u32>> = sentences
            .iter()
            .map(|s| s.iter().filter_map(|t| vocab.index_of(t)).collect())
            .collect();

        // Every sentence implicitly ends with one extra trainable token.
        let trained_tokens = vocab.total_count() + encoded.len() as u64;
        log::info!(
            "training {} sentences against {} vocabulary tokens ({} trainable tokens per iteration)",
            encoded.len(),
            vocab.len(),
            trained_tokens
        );

        let network = NetworkTrainer::new(&self.config, &nodes, trained_tokens, listener);
        network.train(&encoded)?;
        Ok(Model::new(
            vocab,
            self.config.layer_size,
            network.into_embeddings(),
        ))
    }
}

/// The shared state every worker reads and writes during a run.
pub(crate) struct NetworkTrainer<'a> {
    pub(crate) config: &'a Config,
    pub(crate) nodes: &'a [HuffmanNode],
    pub(crate) weights: SharedWeights,
    table: Option<UnigramTable>,
    /// The shared learning rate. Written by whichever worker last folded in
    /// a count delta, read by all of them; it only has to trend downward
    /// smoothly, not be exactly consistent across threads.
    alpha: Real,
    /// Tokens processed so far, across all workers and iterations.
    processed: AtomicU64,
    trained_tokens: u64,
    listener: &'a dyn ProgressListener,
}

impl<'a> NetworkTrainer<'a> {
    pub(crate) fn new(
        config: &'a Config,
        nodes: &'a [HuffmanNode],
        trained_tokens: u64,
        listener: &'a dyn ProgressListener,
    ) -> Self {
        let weights = SharedWeights::new(nodes.len(), config.layer_size);
        let table = (config.negative_samples > 0).then(|| {
            let counts: Vec<u64> = nodes.iter().map(|n| n.count).collect();
            UnigramTable::new(&counts)
        });
        let alpha = Real::default();
        alpha.set(config.initial_learning_rate);
        NetworkTrainer {
            config,
            nodes,
            weights,
            table,
            alpha,
            processed: AtomicU64::new(0),
            trained_tokens,
            listener,
        }
    }

    pub(crate) fn alpha(&self) -> real {
        self.alpha.get()
    }

    pub(crate) fn unigram_table(&self) -> Option<&UnigramTable> {
        self.table.as_ref()
    }

    /// One pass of parallel workers per iteration, with a full barrier
    /// between iterations. Batch assignment across workers does not preserve
    /// any ordering of updates to the shared weights.
    pub(crate) fn train(&self, sentences: &[Vec<u32>]) -> Result<()> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()
            .map_err(|e| Error::Training(format!("failed to start worker pool: {e}")))?;

        self.listener.update(Stage::TrainNetwork, 0.0);
        let batches: Vec<&[Vec<u32>]> = sentences.chunks(BATCH_SIZE).collect();
        let num_batches = batches.len();

        for iter in (1..=self.config.iterations).rev() {
            log::debug!("iteration {iter}: dispatching {num_batches} batches");
            let failure: Mutex<Option<Error>> = Mutex::new(None);
            pool.scope(|scope| {
                for (i, batch) in batches.iter().copied().enumerate() {
                    let failure = &failure;
                    scope.spawn(move |_| {
                        let seed = (i + iter as usize * num_batches) as u64;
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                            Worker::new(self, seed).run(batch);
                        }));
                        if let Err(payload) = outcome {
                            let mut slot = failure.lock().unwrap();
                            if slot.is_none() {
                                *slot = Some(Error::Training(panic_message(payload.as_ref())));
                            }
                        }
                    });
                }
            });
            // The barrier has passed; surface any worker failure before the
            // next iteration starts.
            if let Some(err) = failure.into_inner().unwrap() {
                return Err(err);
            }
        }
        Ok(())
    }

    pub(crate) fn into_embeddings(self) -> Vec<real> {
        self.weights.export_embeddings()
    }

    /// Score and update the internal-node vectors along the target token's
    /// Huffman path, accumulating the propagated error into `err`.
    pub(crate) fn hierarchical_softmax(
        &self,
        node: &HuffmanNode,
        hidden: &[real],
        err: &mut [real],
        alpha: real,
    ) {
        for d in 0..node.code.len() {
            let row = self.weights.node_row(node.path[d] as usize);
            // Propagate hidden -> output
            let f: real = hidden.iter().zip(row.iter()).map(|(h, w)| h * w.get()).sum();
            if f <= -MAX_EXP || f >= MAX_EXP {
                continue;
            }
            let f = sigmoid_table().value(f);
            // 'g' is the gradient multiplied by the learning rate
            let g = ((1 - node.code[d]) as real - f) * alpha;
            // Propagate errors output -> hidden
            for (e, w) in err.iter_mut().zip(row.iter()) {
                *e += g * w.get();
            }
            // Learn weights hidden -> output
            for (w, h) in row.iter().zip(hidden.iter()) {
                w.add(g * h);
            }
        }
    }

    /// Contrast the true target against `negative_samples` random draws from
    /// the unigram table, accumulating the propagated error into `err`.
    pub(crate) fn negative_sampling(
        &self,
        table: &UnigramTable,
        rng: &mut Rng,
        node: &HuffmanNode,
        hidden: &[real],
        err: &mut [real],
        alpha: real,
    ) {
        let vocab_size = self.nodes.len();
        for d in 0..=self.config.negative_samples {
            let (target, label) = if d == 0 {
                (node.idx as usize, 1.0)
            } else {
                let r = rng.rand_u64();
                let mut target = table.sample(r);
                if target == 0 {
                    // Slot 0 is reserved; fall back to a uniform draw over
                    // the rest of the vocabulary.
                    target = r as usize % (vocab_size - 1) + 1;
                }
                if target as u32 == node.idx {
                    continue;
                }
                (target, 0.0f32)
            };

            let row = self.weights.noise_row(target);
            let f: real = hidden.iter().zip(row.iter()).map(|(h, w)| h * w.get()).sum();
            let g = (label - sigmoid_table().value_saturating(f)) * alpha;
            for (e, w) in err.iter_mut().zip(row.iter()) {
                *e += g * w.get();
            }
            for (w, h) in row.iter().zip(hidden.iter()) {
                w.add(g * h);
            }
        }
    }
}

/// One per-batch training task. Owns its generator state and scratch
/// buffers; everything else is shared through the trainer.
pub(crate) struct Worker<'a, 'b> {
    pub(crate) nt: &'b NetworkTrainer<'a>,
    pub(crate) rng: Rng,
    pub(crate) hidden: Vec<real>,
    pub(crate) hidden_err: Vec<real>,
    word_count: u64,
    last_word_count: u64,
}

impl<'a, 'b> Worker<'a, 'b> {
    pub(crate) fn new(nt: &'b NetworkTrainer<'a>, seed: u64) -> Self {
        Worker {
            nt,
            rng: Rng(seed),
            hidden: vec![0.0; nt.config.layer_size],
            hidden_err: vec![0.0; nt.config.layer_size],
            word_count: 0,
            last_word_count: 0,
        }
    }

    pub(crate) fn run(&mut self, batch: &[Vec<u32>]) {
        let mut filtered: Vec<u32> = Vec::new();
        for sentence in batch {
            self.filter_sentence(sentence, &mut filtered);
            // One more for the implicit end-of-sentence token.
            self.word_count += 1;

            for chunk in filtered.chunks(MAX_SENTENCE_LENGTH) {
                if self.word_count - self.last_word_count > LEARNING_RATE_UPDATE_FREQUENCY {
                    self.update_learning_rate();
                }
                match self.nt.config.architecture {
                    Architecture::Cbow => cbow::train_chunk(self, chunk),
                    Architecture::SkipGram => skipgram::train_chunk(self, chunk),
                }
            }
        }
        self.nt
            .processed
            .fetch_add(self.word_count - self.last_word_count, Ordering::Relaxed);
    }

    /// Copy `sentence` into `out`, randomly discarding frequent tokens while
    /// keeping the ranking the same.
    fn filter_sentence(&mut self, sentence: &[u32], out: &mut Vec<u32>) {
        out.clear();
        let rate = self.nt.config.down_sample_rate;
        for &word in sentence {
            self.word_count += 1;
            if rate > 0.0 {
                let count = self.nt.nodes[word as usize].count as real;
                let k = rate * self.nt.trained_tokens as real;
                let keep = ((count / k).sqrt() + 1.0) * k / count;
                if keep < self.rng.rand_real() {
                    continue;
                }
            }
            out.push(word);
        }
    }

    fn update_learning_rate(&mut self) {
        let nt = self.nt;
        let delta = self.word_count - self.last_word_count;
        let processed = nt.processed.fetch_add(delta, Ordering::Relaxed) + delta;
        self.last_word_count = self.word_count;

        let total = nt.config.iterations as u64 * nt.trained_tokens;
        nt.alpha
            .set(decayed_learning_rate(nt.config.initial_learning_rate, processed, total));
        nt.listener.update(
            Stage::TrainNetwork,
            (processed as f64 / (total + 1) as f64).min(1.0),
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learning_rate_decays_monotonically() {
        let initial = 0.05;
        let total = 1_000_000;
        let mut last = initial;
        for processed in (0..=total).step_by(50_000) {
            let alpha = decayed_learning_rate(initial, processed, total);
            assert!(alpha <= last);
            last = alpha;
        }
    }

    #[test]
    fn learning_rate_is_floored() {
        let initial = 0.025;
        // Processed counts can exceed the projected total near the end of a
        // run; the rate must never reach zero, let alone go negative.
        for processed in [999_999, 1_000_000, 2_000_000] {
            let alpha = decayed_learning_rate(initial, processed, 1_000_000);
            assert!(alpha >= initial * 1e-4);
        }
    }
}

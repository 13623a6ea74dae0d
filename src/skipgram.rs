//! The skip-gram update rule.

use crate::trainer::Worker;

/// Train one sentence chunk: at each position, pair the token there with
/// every context token inside a randomly shrunk window, scoring each pair
/// against that context token's own vector.
pub(crate) fn train_chunk(w: &mut Worker<'_, '_>, sen: &[u32]) {
    let nt = w.nt;
    let window = nt.config.window_size;

    for pos in 0..sen.len() {
        let node = &nt.nodes[sen[pos] as usize];
        let alpha = nt.alpha();
        let r = w.rng.rand_u64();
        // The jitter folds the raw generator state back in; cbow's does not.
        let b = ((r % window as u64).wrapping_add(r) % window as u64) as usize;

        for a in b..(window * 2 + 1 - b) {
            if a == window {
                continue;
            }
            if pos + a < window {
                continue;
            }
            let c = pos + a - window;
            if c >= sen.len() {
                continue;
            }
            let ctx_idx = sen[c] as usize;

            // The context token's own vector is the hidden layer for this
            // pair; it is only written once the pair's error is complete.
            let ctx = nt.weights.embedding_row(ctx_idx);
            for (h, cell) in w.hidden.iter_mut().zip(ctx.iter()) {
                *h = cell.get();
            }
            w.hidden_err.fill(0.0);

            if nt.config.use_hierarchical_softmax {
                nt.hierarchical_softmax(node, &w.hidden, &mut w.hidden_err, alpha);
            }
            if let Some(table) = nt.unigram_table() {
                nt.negative_sampling(table, &mut w.rng, node, &w.hidden, &mut w.hidden_err, alpha);
            }

            // Learn weights input -> hidden
            for (cell, e) in ctx.iter().zip(w.hidden_err.iter()) {
                cell.add(*e);
            }
        }
    }
}

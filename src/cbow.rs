//! The continuous-bag-of-words update rule.

use crate::real;
use crate::trainer::Worker;

/// Train one sentence chunk: at each position, predict the token there from
/// the average of the context vectors inside a randomly shrunk window, then
/// share the accumulated error back across that same context.
pub(crate) fn train_chunk(w: &mut Worker<'_, '_>, sen: &[u32]) {
    let nt = w.nt;
    let window = nt.config.window_size;

    for pos in 0..sen.len() {
        let node = &nt.nodes[sen[pos] as usize];
        let alpha = nt.alpha();
        w.hidden.fill(0.0);
        w.hidden_err.fill(0.0);
        let b = (w.rng.rand_u64() % window as u64) as usize;

        // in -> hidden
        let mut cw = 0usize;
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
            let ctx = nt.weights.embedding_row(sen[c] as usize);
            for (h, cell) in w.hidden.iter_mut().zip(ctx.iter()) {
                *h += cell.get();
            }
            cw += 1;
        }

        // Nothing survived the window jitter at this position.
        if cw == 0 {
            continue;
        }
        for h in w.hidden.iter_mut() {
            *h /= cw as real;
        }

        if nt.config.use_hierarchical_softmax {
            nt.hierarchical_softmax(node, &w.hidden, &mut w.hidden_err, alpha);
        }
        if let Some(table) = nt.unigram_table() {
            nt.negative_sampling(table, &mut w.rng, node, &w.hidden, &mut w.hidden_err, alpha);
        }

        // hidden -> in
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
            let ctx = nt.weights.embedding_row(sen[c] as usize);
            for (cell, e) in ctx.iter().zip(w.hidden_err.iter()) {
                cell.add(*e);
            }
        }
    }
}

//! Binary Huffman tree construction over token frequencies.
//!
//! Frequent tokens get short codes; every token's root-to-leaf path doubles
//! as the list of internal-node rows its hierarchical-softmax updates touch.

use crate::error::{Error, Result};
use crate::progress::{ProgressListener, Stage};

/// How many merge/encode steps pass between progress updates.
const PROGRESS_INTERVAL: usize = 1000;

/// Per-token output of the encoder.
#[derive(Clone, Debug)]
pub struct HuffmanNode {
    /// Branch bits from the root down to this token's leaf.
    pub code: Vec<u8>,
    /// Internal-node rows visited from the root down, paired with `code`.
    /// The root is stored as `vocab_size - 2`; every other entry is that
    /// node's index minus `vocab_size`.
    pub path: Vec<u32>,
    /// Dense index of the token in the vocabulary.
    pub idx: u32,
    /// The token's frequency, copied from the vocabulary.
    pub count: u64,
}

/// Build the Huffman tree for `counts` (sorted by descending frequency) and
/// emit one node per vocabulary entry, in vocabulary order.
///
/// Runs in O(N): because the leaves are sorted, the two smallest live nodes
/// at every step are found by two pointers, one scanning the leaves from the
/// small end and one scanning the internal nodes in creation order.
pub fn encode(counts: &[u64], listener: &dyn ProgressListener) -> Result<Vec<HuffmanNode>> {
    let n = counts.len();
    if n < 2 {
        return Err(Error::Structural(format!(
            "vocabulary has {n} entries; a Huffman tree needs at least 2"
        )));
    }

    let mut count = vec![0u64; n * 2 + 1];
    let mut binary = vec![0u8; n * 2 + 1]; // which child a node is of its parent (0 or 1)
    let mut parent_node = vec![0usize; n * 2 + 1];

    count[..n].copy_from_slice(counts);
    for c in &mut count[n..n * 2] {
        *c = 1_000_000_000_000_000;
    }

    let mut pos1 = n;
    let mut pos2 = n;
    // Construct the tree by adding one internal node at a time.
    for a in 0..(n - 1) {
        // First, find the two smallest nodes 'min1, min2'
        let min1i;
        if pos1 > 0 && count[pos1 - 1] < count[pos2] {
            pos1 -= 1;
            min1i = pos1;
        } else {
            min1i = pos2;
            pos2 += 1;
        }

        let min2i;
        if pos1 > 0 && count[pos1 - 1] < count[pos2] {
            pos1 -= 1;
            min2i = pos1;
        } else {
            min2i = pos2;
            pos2 += 1;
        }

        count[n + a] = count[min1i] + count[min2i];
        parent_node[min1i] = n + a;
        parent_node[min2i] = n + a;
        binary[min2i] = 1;

        if a % PROGRESS_INTERVAL == 0 {
            listener.update(Stage::BuildHuffman, 0.5 * a as f64 / n as f64);
        }
    }

    // Now walk each leaf up to the root and assign its code.
    let mut nodes = Vec::with_capacity(n);
    for a in 0..n {
        let mut code: Vec<u8> = Vec::new();
        let mut path: Vec<u32> = Vec::new();
        let mut b = a;
        loop {
            if !code.is_empty() {
                path.push((b - n) as u32);
            }
            code.push(binary[b]);
            b = parent_node[b];
            if b == n * 2 - 2 {
                break;
            }
        }
        code.reverse();
        path.push((n - 2) as u32);
        path.reverse();

        nodes.push(HuffmanNode {
            code,
            path,
            idx: a as u32,
            count: counts[a],
        });

        if a % PROGRESS_INTERVAL == 0 {
            listener.update(Stage::BuildHuffman, 0.5 + 0.5 * a as f64 / n as f64);
        }
    }

    log::debug!("built Huffman tree over {n} tokens");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullListener;

    fn is_prefix(a: &[u8], b: &[u8]) -> bool {
        a.len() <= b.len() && a == &b[..a.len()]
    }

    #[test]
    fn golden_tree() {
        // Merge order: C+D (2), then B+(C+D) (4), then A+root (9).
        let nodes = encode(&[5, 2, 1, 1], &NullListener).unwrap();
        let lengths: Vec<usize> = nodes.iter().map(|nd| nd.code.len()).collect();
        assert_eq!(lengths, vec![1, 2, 3, 3]);
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.idx as usize, i);
            assert_eq!(node.path.len(), node.code.len());
            // The first decision on every path is at the root row.
            assert_eq!(node.path[0], 2);
        }
        let total: u64 = nodes.iter().map(|nd| nd.count).sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn codes_are_prefix_free() {
        let counts = [40u64, 30, 20, 10, 10, 5, 5, 2, 1, 1];
        let nodes = encode(&counts, &NullListener).unwrap();
        assert_eq!(nodes.len(), counts.len());
        for (i, a) in nodes.iter().enumerate() {
            for (j, b) in nodes.iter().enumerate() {
                if i != j {
                    assert!(
                        !is_prefix(&a.code, &b.code),
                        "code of entry {i} is a prefix of entry {j}"
                    );
                }
            }
        }
    }

    #[test]
    fn code_length_tracks_frequency() {
        let counts = [100u64, 50, 20, 20, 8, 3, 2, 1];
        let nodes = encode(&counts, &NullListener).unwrap();
        for pair in nodes.windows(2) {
            assert!(pair[0].code.len() <= pair[1].code.len());
        }
    }

    #[test]
    fn path_entries_address_internal_rows() {
        let counts = [9u64, 7, 4, 2, 2, 1];
        let n = counts.len() as u32;
        let nodes = encode(&counts, &NullListener).unwrap();
        for node in &nodes {
            for &p in &node.path {
                // N leaves produce exactly N-1 internal nodes.
                assert!(p < n - 1);
            }
        }
    }

    #[test]
    fn rejects_tiny_vocabularies() {
        assert!(encode(&[], &NullListener).is_err());
        assert!(encode(&[5], &NullListener).is_err());
    }
}

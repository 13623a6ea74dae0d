use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};

/// A frequency-ordered vocabulary: tokens paired with their corpus counts,
/// highest count first. A token's position in this ordering is its dense
/// index everywhere else in the crate.
///
/// How the counts were collected (and which tokens were filtered out) is the
/// caller's business; this type only checks the invariants the training
/// engine relies on.
pub struct Vocabulary<T> {
    tokens: Vec<T>,
    counts: Vec<u64>,
    index: HashMap<T, u32>,
    total: u64,
}

impl<T: Clone + Eq + Hash> Vocabulary<T> {
    /// Build from `(token, count)` pairs already sorted by descending count.
    ///
    /// Fails on a zero count, an out-of-order entry, or a duplicate token.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, u64)>,
    {
        let mut tokens = Vec::new();
        let mut counts: Vec<u64> = Vec::new();
        let mut index = HashMap::new();
        let mut total = 0u64;

        for (pos, (token, count)) in entries.into_iter().enumerate() {
            if count == 0 {
                return Err(Error::Structural(format!(
                    "vocabulary entry {pos} has a zero count"
                )));
            }
            if let Some(&prev) = counts.last() {
                if count > prev {
                    return Err(Error::Structural(format!(
                        "vocabulary entries are not sorted by descending count \
                         (entry {pos} has count {count}, previous has {prev})"
                    )));
                }
            }
            if index.insert(token.clone(), pos as u32).is_some() {
                return Err(Error::Structural(format!(
                    "duplicate vocabulary token at entry {pos}"
                )));
            }
            tokens.push(token);
            counts.push(count);
            total += count;
        }

        Ok(Vocabulary {
            tokens,
            counts,
            index,
            total,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Sum of all counts: the number of trainable token occurrences in the
    /// corpus the counts were taken from.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Counts in vocabulary order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Tokens in vocabulary order.
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    /// Dense index of `token`, if it is in the vocabulary.
    pub fn index_of(&self, token: &T) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn get(&self, idx: usize) -> Option<(&T, u64)> {
        Some((self.tokens.get(idx)?, self.counts[idx]))
    }

    pub(crate) fn index_map(&self) -> &HashMap<T, u32> {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_entries() {
        let v = Vocabulary::from_entries([("the", 10u64), ("cat", 4), ("sat", 4), ("mat", 1)])
            .unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v.total_count(), 19);
        assert_eq!(v.index_of(&"sat"), Some(2));
        assert_eq!(v.index_of(&"dog"), None);
        assert_eq!(v.get(0), Some((&"the", 10)));
        assert_eq!(v.counts(), &[10, 4, 4, 1]);
    }

    #[test]
    fn rejects_unsorted_counts() {
        let err = Vocabulary::from_entries([("a", 2u64), ("b", 5)]).err().unwrap();
        assert!(err.to_string().contains("descending"));
    }

    #[test]
    fn rejects_zero_count() {
        assert!(Vocabulary::from_entries([("a", 1u64), ("b", 0)]).is_err());
    }

    #[test]
    fn rejects_duplicate_token() {
        assert!(Vocabulary::from_entries([("a", 3u64), ("a", 2)]).is_err());
    }

    #[test]
    fn empty_is_allowed_here() {
        let v = Vocabulary::<&str>::from_entries([]).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.total_count(), 0);
    }
}

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Index;

use crate::real;
use crate::vocab::Vocabulary;

pub fn norm(v: &[real]) -> real {
    v.iter().copied().map(|e| e * e).sum::<real>().sqrt()
}

pub fn dot(a: &[real], b: &[real]) -> real {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(&a, &b)| a * b).sum()
}

/// The trained embedding table: one dense vector per vocabulary token, in
/// vocabulary order.
pub struct Model<T> {
    /// Embedding vector length (number of dimensions).
    layer_size: usize,
    tokens: Vec<T>,
    index: HashMap<T, u32>,
    /// `embeddings[k * layer_size..(k+1) * layer_size]` is token `k`'s vector.
    embeddings: Vec<real>,
}

impl<T: Clone + Eq + Hash> Model<T> {
    pub(crate) fn new(vocab: &Vocabulary<T>, layer_size: usize, embeddings: Vec<real>) -> Self {
        debug_assert_eq!(embeddings.len(), vocab.len() * layer_size);
        Model {
            layer_size,
            tokens: vocab.tokens().to_vec(),
            index: vocab.index_map().clone(),
            embeddings,
        }
    }

    /// Number of tokens in the model.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn layer_size(&self) -> usize {
        self.layer_size
    }

    /// Tokens in vocabulary order.
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    /// The vector for token index `i`. Panics if `i` is out of range.
    pub fn vector(&self, i: usize) -> &[real] {
        &self.embeddings[i * self.layer_size..][..self.layer_size]
    }

    /// The vector for `token`, if it is in the vocabulary.
    pub fn get(&self, token: &T) -> Option<&[real]> {
        self.index.get(token).map(|&i| self.vector(i as usize))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &[real])> {
        self.tokens
            .iter()
            .zip(self.embeddings.chunks_exact(self.layer_size))
    }
}

impl<T> Index<usize> for Model<T> {
    type Output = [real];

    fn index(&self, i: usize) -> &[real] {
        &self.embeddings[i * self.layer_size..][..self.layer_size]
    }
}

//! Training of dense token embeddings from sentences of discrete tokens,
//! using the CBOW and skip-gram objectives with hierarchical softmax and
//! negative sampling.
//!
//! Feed a frequency-ordered [`Vocabulary`] and a slice of tokenized
//! sentences to a [`Trainer`]; the result is a [`Model`] holding one dense
//! vector per vocabulary token.

#[allow(non_camel_case_types)]
pub type real = f32; // Precision of float numbers

mod cbow;
mod config;
mod error;
pub mod huffman;
mod model;
mod net;
mod progress;
mod rng;
mod sigmoid;
mod skipgram;
mod trainer;
mod unigram;
mod vocab;

pub use config::{Architecture, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use model::{dot, norm, Model};
pub use progress::{LogListener, NullListener, ProgressBarListener, ProgressListener, Stage};
pub use rng::Rng;
pub use trainer::Trainer;
pub use vocab::Vocabulary;

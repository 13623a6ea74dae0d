use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::real;

/// Which update rule drives training.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Architecture {
    /// Continuous bag of words: predict a token from its averaged context.
    Cbow,
    /// Skip-gram: predict each context token from the current token.
    SkipGram,
}

impl Architecture {
    /// The learning rate used when none is configured explicitly.
    pub fn default_learning_rate(self) -> real {
        match self {
            Architecture::Cbow => 0.05,
            Architecture::SkipGram => 0.025,
        }
    }
}

/// A validated training configuration. Use [`Config::builder`] to construct
/// one with the usual defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub architecture: Architecture,
    pub num_threads: usize,
    pub iterations: u32,
    /// Embedding vector length.
    pub layer_size: usize,
    /// Max distance between the current token and a context token, before
    /// the per-position random shrink.
    pub window_size: usize,
    /// Negative examples drawn per training pair; 0 disables negative
    /// sampling.
    pub negative_samples: usize,
    /// Threshold for randomly discarding frequent tokens; 0 disables
    /// downsampling. Useful range is (0, 1e-5].
    pub down_sample_rate: real,
    pub initial_learning_rate: real,
    pub use_hierarchical_softmax: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.layer_size == 0 {
            return Err(Error::Config("layer_size must be positive".into()));
        }
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be positive".into()));
        }
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be positive".into()));
        }
        if self.num_threads == 0 {
            return Err(Error::Config("num_threads must be positive".into()));
        }
        if !(self.down_sample_rate >= 0.0) {
            return Err(Error::Config(format!(
                "down_sample_rate must be non-negative, got {}",
                self.down_sample_rate
            )));
        }
        if !(self.initial_learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "initial_learning_rate must be positive, got {}",
                self.initial_learning_rate
            )));
        }
        Ok(())
    }
}

/// Fluent builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    architecture: Architecture,
    num_threads: usize,
    iterations: u32,
    layer_size: usize,
    window_size: usize,
    negative_samples: usize,
    down_sample_rate: real,
    initial_learning_rate: Option<real>,
    use_hierarchical_softmax: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            architecture: Architecture::Cbow,
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            iterations: 5,
            layer_size: 100,
            window_size: 5,
            negative_samples: 5,
            down_sample_rate: 1e-3,
            initial_learning_rate: None,
            use_hierarchical_softmax: false,
        }
    }
}

impl ConfigBuilder {
    pub fn architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn layer_size(mut self, layer_size: usize) -> Self {
        self.layer_size = layer_size;
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn negative_samples(mut self, negative_samples: usize) -> Self {
        self.negative_samples = negative_samples;
        self
    }

    pub fn down_sample_rate(mut self, down_sample_rate: real) -> Self {
        self.down_sample_rate = down_sample_rate;
        self
    }

    /// Defaults to the architecture's usual rate when not set.
    pub fn initial_learning_rate(mut self, rate: real) -> Self {
        self.initial_learning_rate = Some(rate);
        self
    }

    pub fn use_hierarchical_softmax(mut self, on: bool) -> Self {
        self.use_hierarchical_softmax = on;
        self
    }

    pub fn build(self) -> Result<Config> {
        let config = Config {
            architecture: self.architecture,
            num_threads: self.num_threads,
            iterations: self.iterations,
            layer_size: self.layer_size,
            window_size: self.window_size,
            negative_samples: self.negative_samples,
            down_sample_rate: self.down_sample_rate,
            initial_learning_rate: self
                .initial_learning_rate
                .unwrap_or_else(|| self.architecture.default_learning_rate()),
            use_hierarchical_softmax: self.use_hierarchical_softmax,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.layer_size, 100);
        assert_eq!(config.window_size, 5);
        assert_eq!(config.iterations, 5);
        assert_eq!(config.negative_samples, 5);
        assert_eq!(config.initial_learning_rate, 0.05);
    }

    #[test]
    fn learning_rate_defaults_per_architecture() {
        let sg = Config::builder()
            .architecture(Architecture::SkipGram)
            .build()
            .unwrap();
        assert_eq!(sg.initial_learning_rate, 0.025);

        let explicit = Config::builder()
            .architecture(Architecture::SkipGram)
            .initial_learning_rate(0.1)
            .build()
            .unwrap();
        assert_eq!(explicit.initial_learning_rate, 0.1);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Config::builder().layer_size(0).build().is_err());
        assert!(Config::builder().window_size(0).build().is_err());
        assert!(Config::builder().iterations(0).build().is_err());
        assert!(Config::builder().num_threads(0).build().is_err());
        assert!(Config::builder().down_sample_rate(-0.5).build().is_err());
        assert!(Config::builder().initial_learning_rate(0.0).build().is_err());
    }
}

use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};

/// The coarse phases of producing a trained model.
///
/// `BuildVocab` and `FilterSortVocab` belong to whatever collects and orders
/// the vocabulary upstream of this crate; the training engine itself reports
/// `BuildHuffman` and `TrainNetwork`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    BuildVocab,
    FilterSortVocab,
    BuildHuffman,
    TrainNetwork,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::BuildVocab => "build vocabulary",
            Stage::FilterSortVocab => "filter and sort vocabulary",
            Stage::BuildHuffman => "build Huffman tree",
            Stage::TrainNetwork => "train network",
        })
    }
}

/// Receives progress updates, with `progress` in `[0, 1]` per stage.
///
/// During training this is called concurrently from every worker thread, so
/// implementations must be cheap, thread-safe, and must not panic.
pub trait ProgressListener: Sync {
    fn update(&self, stage: Stage, progress: f64);
}

/// Discards every update.
pub struct NullListener;

impl ProgressListener for NullListener {
    fn update(&self, _stage: Stage, _progress: f64) {}
}

/// Forwards updates to the `log` facade at debug level.
pub struct LogListener;

impl ProgressListener for LogListener {
    fn update(&self, stage: Stage, progress: f64) {
        log::debug!("{stage}: {:.2}%", progress * 100.0);
    }
}

/// Renders a terminal progress bar for the current stage.
pub struct ProgressBarListener {
    bar: ProgressBar,
}

impl ProgressBarListener {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{msg:28} [{bar:40}] {percent:>3}%")
                .expect("static template is well-formed")
                .progress_chars("=> "),
        );
        ProgressBarListener { bar }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for ProgressBarListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressListener for ProgressBarListener {
    fn update(&self, stage: Stage, progress: f64) {
        self.bar.set_message(stage.to_string());
        self.bar.set_position((progress * 100.0) as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::TrainNetwork.to_string(), "train network");
        assert_eq!(Stage::BuildHuffman.to_string(), "build Huffman tree");
    }

    #[test]
    fn null_listener_accepts_updates() {
        let listener: &dyn ProgressListener = &NullListener;
        listener.update(Stage::TrainNetwork, 0.5);
    }
}

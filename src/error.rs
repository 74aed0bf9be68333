use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions raised while configuring or running the generator.
///
/// There is no recoverable class: every variant aborts the run.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// A command-line option could not be parsed or is out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// More unique tickers were requested than three letters can spell.
    #[error("Cannot allocate {requested} unique tickers, only {capacity} exist")]
    NameSpaceExhausted { requested: usize, capacity: usize },

    /// The output file (or a rotated daily file) could not be created.
    #[error("Failed to open output file {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// The sampler queue disconnected while the session was still running.
    #[error("Liquidity sampler stopped before the session ended")]
    SamplerStopped,
}

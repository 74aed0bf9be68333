//! Synthetic trade-and-quote (TAQ) market data.
//!
//! A seeded universe of three-letter tickers is sampled in proportion to
//! liquidity on a background thread, while the consumer loop advances a
//! simulated session clock and derives each stock's next quote or trade
//! from its own previous state. Rows are written as CSV, optionally one
//! file per simulated day.

pub mod clock;
pub mod config;
pub mod csv_output;
pub mod distributions;
pub mod error;
pub mod exchange;
pub mod names;
pub mod pipeline;
pub mod quote_trade;
pub mod sampler;
pub mod stats;
pub mod universe;

pub use config::{GenerateArgs, GeneratorConfig};
pub use error::GeneratorError;
pub use pipeline::{RunSummary, run};
pub use stats::Stats;

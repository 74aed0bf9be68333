use chrono::NaiveDate;
use rand::Rng;
use std::sync::Arc;

use crate::clock::{SessionClock, Tick};
use crate::universe::Stock;

/// Process-wide session state: the clock and the stocks it trades.
///
/// The consumer loop is the only owner; the sampler only ever sees the
/// liquidity snapshot returned by [`Exchange::liquidity_weights`].
#[derive(Debug)]
pub struct Exchange {
    clock: SessionClock,
    stocks: Vec<Stock>,
    total_liquidity: f64,
}

impl Exchange {
    pub fn new(clock: SessionClock, stocks: Vec<Stock>, total_liquidity: f64) -> Self {
        Self {
            clock,
            stocks,
            total_liquidity,
        }
    }

    pub fn total_liquidity(&self) -> f64 {
        self.total_liquidity
    }

    pub fn current_date(&self) -> NaiveDate {
        self.clock.current_date()
    }

    pub fn stocks(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn liquidity_weights(&self) -> Arc<[f64]> {
        self.stocks.iter().map(|s| s.liquidity).collect()
    }

    pub fn next_tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Tick {
        self.clock.tick(rng)
    }

    /// Exclusive access to one stock for a single generation step.
    pub fn stock_mut(&mut self, index: usize) -> Option<&mut Stock> {
        self.stocks.get_mut(index)
    }

    /// Re-arms every stock so its first event of the new day is a quote.
    pub fn begin_session(&mut self) {
        for stock in &mut self.stocks {
            stock.started = false;
        }
    }
}

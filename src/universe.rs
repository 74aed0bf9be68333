use chrono::NaiveDateTime;
use rand::Rng;
use tracing::{debug, info};

use crate::distributions::bounded_normal;

pub const LIQUIDITY_RANGE: (f64, f64) = (0.0, 1.0);
pub const BASE_PRICE_RANGE: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Quote,
    Trade,
}

impl EventKind {
    pub fn code(self) -> &'static str {
        match self {
            EventKind::Quote => "q",
            EventKind::Trade => "t",
        }
    }
}

/// One synthetic ticker and its rolling quote/trade state.
#[derive(Debug, Clone)]
pub struct Stock {
    pub name: String,
    pub liquidity: f64,
    pub base_price: f64,
    pub last_trade_price: f64,
    pub last_trade_size: u64,
    pub last_trade_time: Option<NaiveDateTime>,
    pub last_bid_price: f64,
    pub last_bid_size: u64,
    pub last_ask_price: f64,
    pub last_ask_size: u64,
    pub last_quote_time: Option<NaiveDateTime>,
    pub last_arrival_time: Option<NaiveDateTime>,
    pub last_event: Option<EventKind>,
    /// Set by the first quote of the current session.
    pub started: bool,
}

impl Stock {
    pub fn new(name: impl Into<String>, liquidity: f64, base_price: f64) -> Self {
        Self {
            name: name.into(),
            liquidity,
            base_price,
            last_trade_price: base_price,
            last_trade_size: 0,
            last_trade_time: None,
            last_bid_price: 0.0,
            last_bid_size: 0,
            last_ask_price: 0.0,
            last_ask_size: 0,
            last_quote_time: None,
            last_arrival_time: None,
            last_event: None,
            started: false,
        }
    }
}

/// Assigns every name a liquidity weight and base price.
///
/// Stocks come back in the order of `names`, together with the summed
/// liquidity used as the sampler's total weight.
pub fn build_universe<R: Rng + ?Sized>(names: &[String], rng: &mut R) -> (Vec<Stock>, f64) {
    let mut stocks = Vec::with_capacity(names.len());
    let mut total_liquidity = 0.0;

    for name in names {
        let liquidity = bounded_normal(rng, LIQUIDITY_RANGE.0, LIQUIDITY_RANGE.1);
        let base_price = bounded_normal(rng, BASE_PRICE_RANGE.0, BASE_PRICE_RANGE.1);
        debug!("{}: liquidity {:.4}, base price {:.2}", name, liquidity, base_price);

        total_liquidity += liquidity;
        stocks.push(Stock::new(name.as_str(), liquidity, base_price));
    }

    info!("Built universe of {} stocks, total liquidity {:.4}", stocks.len(), total_liquidity);
    (stocks, total_liquidity)
}

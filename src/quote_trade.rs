use chrono::NaiveDateTime;
use rand::Rng;

use crate::distributions::{bounded_normal, reporting_latency, round_lot};
use crate::universe::{EventKind, Stock};

/// Side of the `[0, TRADE_DRAW_SPAN)` draw above which a started stock trades.
const TRADE_DRAW_SPAN: u32 = 20;
const TRADE_THRESHOLD: u32 = 17;

/// Keeps the relative spread above zero for fully liquid names.
const SPREAD_FLOOR: f64 = 0.01;

/// Derives each stock's next quote or trade from its own previous state.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteTradeGenerator;

impl QuoteTradeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Mutates `stock` with a new event stamped at `tick_time`.
    ///
    /// A stock that has not quoted this session always quotes, so a trade
    /// always has a bid/ask to fall between. Afterwards roughly one event
    /// in ten is a trade.
    pub fn generate<R: Rng + ?Sized>(&self, stock: &mut Stock, tick_time: NaiveDateTime, rng: &mut R) {
        if stock.started && rng.gen_range(0..TRADE_DRAW_SPAN) > TRADE_THRESHOLD {
            self.trade(stock, tick_time, rng);
        } else {
            self.quote(stock, tick_time, rng);
        }
    }

    fn trade<R: Rng + ?Sized>(&self, stock: &mut Stock, tick_time: NaiveDateTime, rng: &mut R) {
        stock.last_event = Some(EventKind::Trade);
        stock.last_trade_price = bounded_normal(rng, stock.last_bid_price, stock.last_ask_price);
        stock.last_trade_size = round_lot(rng);
        stock.last_trade_time = Some(tick_time);
        stock.last_arrival_time = Some(tick_time + reporting_latency(rng));
    }

    fn quote<R: Rng + ?Sized>(&self, stock: &mut Stock, tick_time: NaiveDateTime, rng: &mut R) {
        stock.last_event = Some(EventKind::Quote);

        // Thin names quote wider.
        let last = stock.last_trade_price;
        let abs_spread = (1.0 - stock.liquidity + SPREAD_FLOOR) * last / 100.0;

        // Bid and ask are drawn independently, not mirrored around a mid.
        stock.last_bid_price = bounded_normal(rng, last - abs_spread, last);
        stock.last_ask_price = bounded_normal(rng, last, last + abs_spread);
        stock.last_bid_size = round_lot(rng);
        stock.last_ask_size = round_lot(rng);
        stock.last_quote_time = Some(tick_time);
        stock.last_arrival_time = Some(tick_time + reporting_latency(rng));
        stock.started = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tick(ms: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            + chrono::Duration::milliseconds(ms)
    }

    #[test]
    fn test_first_event_is_a_quote() {
        let generator = QuoteTradeGenerator::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut stock = Stock::new("ABC", 0.5, 50.0);
            generator.generate(&mut stock, tick(0), &mut rng);
            assert_eq!(stock.last_event, Some(EventKind::Quote));
            assert!(stock.started);
        }
    }

    #[test]
    fn test_quote_brackets_last_trade() {
        let generator = QuoteTradeGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut stock = Stock::new("ABC", 0.3, 42.0);

        for i in 0..20_000 {
            let before = stock.clone();
            let t = tick(i);
            generator.generate(&mut stock, t, &mut rng);

            match stock.last_event {
                Some(EventKind::Quote) => {
                    assert!(stock.last_bid_price <= stock.last_trade_price);
                    assert!(stock.last_trade_price <= stock.last_ask_price);
                    assert_eq!(stock.last_quote_time, Some(t));
                    assert_eq!(stock.last_trade_price, before.last_trade_price);
                }
                Some(EventKind::Trade) => {
                    assert!(before.started);
                    assert!(stock.last_trade_price >= before.last_bid_price);
                    assert!(stock.last_trade_price <= before.last_ask_price);
                    assert_eq!(stock.last_trade_time, Some(t));
                    assert_eq!(stock.last_bid_price, before.last_bid_price);
                    assert_eq!(stock.last_ask_price, before.last_ask_price);
                }
                None => panic!("no event generated"),
            }

            let latency = (stock.last_arrival_time.unwrap() - t).num_milliseconds();
            assert!((5..10).contains(&latency));
        }
    }

    #[test]
    fn test_trade_share_is_about_one_in_ten() {
        let generator = QuoteTradeGenerator::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut stock = Stock::new("XYZ", 0.8, 10.0);
        let n = 50_000;
        let mut trades = 0;
        for i in 0..n {
            generator.generate(&mut stock, tick(i), &mut rng);
            if stock.last_event == Some(EventKind::Trade) {
                trades += 1;
            }
        }
        let share = trades as f64 / n as f64;
        assert!((share - 0.1).abs() < 0.01, "trade share {share}");
    }

    #[test]
    fn test_sizes_are_round_lots() {
        let generator = QuoteTradeGenerator::new();
        let mut rng = StdRng::seed_from_u64(4);
        let mut stock = Stock::new("LOT", 0.5, 25.0);
        for i in 0..2_000 {
            generator.generate(&mut stock, tick(i), &mut rng);
            match stock.last_event {
                Some(EventKind::Quote) => {
                    assert_eq!(stock.last_bid_size % 100, 0);
                    assert_eq!(stock.last_ask_size % 100, 0);
                    assert!((100..=5000).contains(&stock.last_bid_size));
                    assert!((100..=5000).contains(&stock.last_ask_size));
                }
                Some(EventKind::Trade) => {
                    assert_eq!(stock.last_trade_size % 100, 0);
                    assert!((100..=5000).contains(&stock.last_trade_size));
                }
                None => unreachable!(),
            }
        }
    }

    #[test]
    fn test_spread_widens_with_lower_liquidity() {
        let generator = QuoteTradeGenerator::new();
        let mut rng = StdRng::seed_from_u64(12);
        let mut widest = |liquidity: f64| {
            let mut max_width: f64 = 0.0;
            for i in 0..2_000 {
                let mut stock = Stock::new("SPR", liquidity, 100.0);
                generator.generate(&mut stock, tick(i), &mut rng);
                max_width = max_width.max(stock.last_ask_price - stock.last_bid_price);
            }
            max_width
        };

        let thin = widest(0.1);
        let deep = widest(1.0);
        assert!(thin <= 2.0 * 0.91 + 1e-9);
        assert!(deep <= 2.0 * 0.01 + 1e-9);
        assert!(deep > 0.0);
        assert!(thin > deep);
    }
}

use chrono::Duration;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Redraws allowed before an out-of-range normal sample is clamped.
const MAX_REDRAWS: usize = 16;

/// Standard deviations between the range midpoint and either bound.
const SIGMAS_PER_HALF_RANGE: f64 = 3.0;

pub const LOT_SIZE: u64 = 100;
pub const MAX_LOTS: u64 = 50;

const MIN_LATENCY_MS: i64 = 5;
const MAX_LATENCY_MS: i64 = 10;

fn clamp_to(value: f64, low: f64, high: f64) -> f64 {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

/// Normal draw centred on the middle of `[low, high]`, never leaving it.
///
/// Samples outside the range are redrawn a few times and finally clamped,
/// so the result is inside the closed interval even at its exact edges.
/// A degenerate range returns its single point.
pub fn bounded_normal<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    debug_assert!(low <= high, "bounded_normal called with low {low} > high {high}");

    let width = high - low;
    let mean = low + width / 2.0;
    if width <= 0.0 || !width.is_finite() {
        return clamp_to(mean, low, high);
    }

    let normal = match Normal::new(mean, width / 2.0 / SIGMAS_PER_HALF_RANGE) {
        Ok(normal) => normal,
        Err(_) => return clamp_to(mean, low, high),
    };

    let mut sample = normal.sample(rng);
    for _ in 0..MAX_REDRAWS {
        if (low..=high).contains(&sample) {
            return sample;
        }
        sample = normal.sample(rng);
    }
    clamp_to(sample, low, high)
}

/// Round-lot size between 100 and 5000 shares.
pub fn round_lot<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    (1 + rng.gen_range(0..MAX_LOTS)) * LOT_SIZE
}

/// Reporting delay between a tick and the event's arrival, 5 to 9 ms.
pub fn reporting_latency<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::milliseconds(rng.gen_range(MIN_LATENCY_MS..MAX_LATENCY_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_bounded_normal_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10_000 {
            let v = bounded_normal(&mut rng, 99.5, 100.25);
            assert!((99.5..=100.25).contains(&v));
        }
    }

    #[test]
    fn test_bounded_normal_centres_on_midpoint() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let mean = (0..n).map(|_| bounded_normal(&mut rng, 0.0, 1.0)).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean was {mean}");
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(bounded_normal(&mut rng, 42.0, 42.0), 42.0);
        assert_eq!(bounded_normal(&mut rng, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_round_lots() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..5_000 {
            let size = round_lot(&mut rng);
            assert_eq!(size % 100, 0);
            assert!((100..=5000).contains(&size));
        }
    }

    #[test]
    fn test_reporting_latency_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1_000 {
            let ms = reporting_latency(&mut rng).num_milliseconds();
            assert!((5..10).contains(&ms));
        }
    }
}

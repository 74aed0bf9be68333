use crossbeam::channel::{self, Receiver, Sender};
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::GeneratorError;

/// Default bound of the selection queue between sampler and consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Picks stock indices with probability `liquidity / total_liquidity`.
///
/// Linear scan over the weights; universes are small enough that an alias
/// table would not pay for itself.
#[derive(Debug, Clone)]
pub struct LiquiditySampler {
    weights: Arc<[f64]>,
    total: f64,
}

impl LiquiditySampler {
    pub fn new(weights: Arc<[f64]>, total: f64) -> Result<Self, GeneratorError> {
        if weights.is_empty() {
            return Err(GeneratorError::Config("universe has no stocks".to_string()));
        }
        if !(total.is_finite() && total > 0.0) {
            return Err(GeneratorError::Config(format!(
                "total liquidity must be positive, got {total}"
            )));
        }
        Ok(Self { weights, total })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let mut p = rng.gen_range(0.0..self.total);
        for (index, weight) in self.weights.iter().enumerate() {
            p -= weight;
            if p <= 0.0 {
                return index;
            }
        }
        // Rounding in the running sum can leave a sliver past the last weight.
        self.weights.len() - 1
    }
}

/// Background thread feeding sampled indices into a bounded queue.
///
/// The thread blocks on a full queue and exits once the task is shut
/// down or dropped: the stop flag is cleared and the receiver dropped,
/// which also wakes a sender parked on a full queue.
pub struct SamplerTask {
    receiver: Option<Receiver<usize>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl SamplerTask {
    pub fn spawn(sampler: LiquiditySampler, mut rng: StdRng, capacity: usize) -> anyhow::Result<Self> {
        let (sender, receiver): (Sender<usize>, Receiver<usize>) = channel::bounded(capacity.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name("liquidity-sampler".to_string())
            .spawn(move || {
                let mut draws = 0u64;
                while flag.load(Ordering::Relaxed) {
                    let index = sampler.sample(&mut rng);
                    if sender.send(index).is_err() {
                        break;
                    }
                    draws += 1;
                }
                debug!("Sampler thread exiting after {} draws", draws);
                draws
            })?;

        info!("Started liquidity sampler (queue capacity {})", capacity.max(1));
        Ok(Self {
            receiver: Some(receiver),
            running,
            handle: Some(handle),
        })
    }

    /// Blocks until the next sampled stock index is available.
    pub fn next(&self) -> Result<usize, GeneratorError> {
        self.receiver
            .as_ref()
            .ok_or(GeneratorError::SamplerStopped)?
            .recv()
            .map_err(|_| GeneratorError::SamplerStopped)
    }

    /// Stops the thread and returns how many selections it produced.
    pub fn shutdown(mut self) -> u64 {
        self.stop()
    }

    fn stop(&mut self) -> u64 {
        self.running.store(false, Ordering::Relaxed);
        drop(self.receiver.take());
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(draws) => draws,
                Err(e) => {
                    warn!("Error joining sampler thread: {:?}", e);
                    0
                }
            },
            None => 0,
        }
    }
}

impl Drop for SamplerTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn sampler(weights: &[f64]) -> LiquiditySampler {
        let total = weights.iter().sum();
        LiquiditySampler::new(Arc::from(weights.to_vec()), total).unwrap()
    }

    #[test]
    fn test_selection_follows_liquidity() {
        let s = sampler(&[0.1, 0.3, 0.6]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut counts = [0usize; 3];
        let n = 60_000;
        for _ in 0..n {
            counts[s.sample(&mut rng)] += 1;
        }

        for (count, expected) in counts.iter().zip([0.1, 0.3, 0.6]) {
            let share = *count as f64 / n as f64;
            assert!((share - expected).abs() < 0.02, "share {share} vs {expected}");
        }
    }

    #[test]
    fn test_zero_weight_stock_is_never_picked() {
        let s = sampler(&[0.5, 0.0, 0.5]);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..10_000 {
            assert_ne!(s.sample(&mut rng), 1);
        }
    }

    #[test]
    fn test_rejects_empty_or_weightless_universe() {
        assert!(LiquiditySampler::new(Arc::from(Vec::<f64>::new()), 1.0).is_err());
        assert!(LiquiditySampler::new(Arc::from(vec![0.0, 0.0]), 0.0).is_err());
    }

    #[test]
    fn test_task_matches_synchronous_draws() {
        let s = sampler(&[0.2, 0.5, 0.3, 0.9]);
        let mut sync_rng = StdRng::seed_from_u64(77);
        let expected: Vec<usize> = (0..2_000).map(|_| s.sample(&mut sync_rng)).collect();

        let task = SamplerTask::spawn(s, StdRng::seed_from_u64(77), 16).unwrap();
        let received: Vec<usize> = (0..2_000).map(|_| task.next().unwrap()).collect();
        assert_eq!(received, expected);

        let draws = task.shutdown();
        assert!(draws >= 2_000);
    }

    #[test]
    fn test_shutdown_unblocks_full_queue() {
        let s = sampler(&[1.0]);
        let task = SamplerTask::spawn(s, StdRng::seed_from_u64(0), 4).unwrap();
        assert_eq!(task.next().unwrap(), 0);
        thread::sleep(std::time::Duration::from_millis(20));
        // Bounded by capacity plus the one consumed and one in-flight send.
        assert!(task.shutdown() <= 6);
    }
}

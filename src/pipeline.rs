use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::clock::SessionClock;
use crate::config::GeneratorConfig;
use crate::csv_output::TaqSink;
use crate::error::GeneratorError;
use crate::exchange::Exchange;
use crate::names::allocate_names;
use crate::quote_trade::QuoteTradeGenerator;
use crate::sampler::{LiquiditySampler, SamplerTask};
use crate::stats::Stats;
use crate::universe::build_universe;

/// How often the consumer loop checks the shutdown flag, in events.
const SHUTDOWN_CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub events: u64,
    pub quotes: u64,
    pub trades: u64,
    pub sessions: u64,
    pub files: usize,
    pub sampler_draws: u64,
    pub interrupted: bool,
}

/// Builds the universe and generates events until the clock runs out.
///
/// The sampler thread pushes stock selections into a bounded queue; this
/// loop advances the clock once per selection it consumes, so rows come
/// out in tick order. Clearing `running` stops the loop early with the
/// output flushed.
pub fn run(config: &GeneratorConfig, stats: &Stats, running: &AtomicBool) -> Result<RunSummary> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let names = allocate_names(config.num_stocks, &mut rng).context("Failed to allocate tickers")?;
    let (stocks, total_liquidity) = build_universe(&names, &mut rng);
    let clock = SessionClock::new(config.schedule, config.max_interval_ms);
    let mut exchange = Exchange::new(clock, stocks, total_liquidity);

    let sampler = LiquiditySampler::new(exchange.liquidity_weights(), exchange.total_liquidity())?;
    let sampler_rng = StdRng::seed_from_u64(rng.next_u64());
    let task = SamplerTask::spawn(sampler, sampler_rng, config.queue_capacity)
        .context("Failed to start liquidity sampler")?;

    let mut sink = TaqSink::open(config.output.clone(), exchange.current_date())
        .context("Failed to open output")?;
    stats.record_session(exchange.current_date());
    info!("Session {} started", exchange.current_date().format("%Y-%m-%d"));

    let generator = QuoteTradeGenerator::new();
    let mut events = 0u64;
    let mut interrupted = false;

    loop {
        if events % SHUTDOWN_CHECK_INTERVAL == 0 && !running.load(Ordering::Relaxed) {
            warn!("Generation interrupted after {} events", events);
            interrupted = true;
            break;
        }

        let tick = exchange.next_tick(&mut rng);
        if tick.done {
            break;
        }
        if tick.rolled_over {
            exchange.begin_session();
            let date = exchange.current_date();
            sink.rotate(date)?;
            stats.record_session(date);
            info!("Session {} started", date.format("%Y-%m-%d"));
        }

        let index = task.next()?;
        let stock = exchange.stock_mut(index).ok_or(GeneratorError::SamplerStopped)?;
        generator.generate(stock, tick.time, &mut rng);
        sink.write(stock)?;
        if let Some(kind) = stock.last_event {
            stats.record_event(kind);
        }
        events += 1;
    }

    let files = sink.finish()?;
    let sampler_draws = task.shutdown();
    debug!("Sampler produced {} selections for {} events", sampler_draws, events);

    let snapshot = stats.snapshot();
    Ok(RunSummary {
        events,
        quotes: snapshot.quotes,
        trades: snapshot.trades,
        sessions: snapshot.sessions,
        files,
        sampler_draws,
        interrupted,
    })
}

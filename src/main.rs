use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use taq_synth::csv_output::OutputTarget;
use taq_synth::{GenerateArgs, Stats, pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let args = GenerateArgs::parse();

    // Logs go to stderr so CSV on stdout stays clean.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let report_interval = args.report_interval;
    let config = args.into_config().context("Invalid command line")?;

    info!("Starting TAQ generation");
    info!("Stocks: {}, seed: {}", config.num_stocks, config.seed);
    info!(
        "Dates: {} to {} ({} sessions), session {} to {}",
        config.schedule.date_begin.format("%Y%m%d"),
        config.schedule.date_end.format("%Y%m%d"),
        config.schedule.days(),
        config.schedule.start_of_day.format("%H:%M"),
        config.schedule.end_of_day.format("%H:%M"),
    );
    info!("Max tick interval: {} ms", config.max_interval_ms);
    match &config.output {
        OutputTarget::Stdout => info!("Output: stdout"),
        OutputTarget::File(path) => info!("Output file: {}", path.display()),
        OutputTarget::Daily(template) => info!("Output template (one file per day): {}", template),
    }

    let stats = Arc::new(Stats::new());
    let running = Arc::new(AtomicBool::new(true));

    // Progress reporting
    let stats_handle = (report_interval > 0).then(|| {
        let stats = stats.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(report_interval));
            interval.tick().await;
            let mut last_events = 0u64;
            let mut last_time = Instant::now();

            loop {
                interval.tick().await;

                let snap = stats.snapshot();
                let now = Instant::now();
                let elapsed = now.duration_since(last_time).as_secs_f64();
                let rate = (snap.events - last_events) as f64 / elapsed;
                let day = snap
                    .session_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();

                info!(
                    "Progress: session {} ({}) - Events: {} (quotes {}, trades {}) - Rate: {} events/s",
                    snap.sessions, day, snap.events, snap.quotes, snap.trades, rate as u64
                );

                last_events = snap.events;
                last_time = now;
            }
        })
    });

    // Graceful shutdown
    let ctrl_c_handle = {
        let running = running.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, shutting down...");
                    running.store(false, Ordering::Relaxed);
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        })
    };

    let start_time = Instant::now();
    let summary = {
        let stats = stats.clone();
        let running = running.clone();
        tokio::task::spawn_blocking(move || pipeline::run(&config, &stats, &running))
            .await
            .context("Generator task failed")??
    };

    if let Some(handle) = stats_handle {
        handle.abort();
    }
    ctrl_c_handle.abort();

    let duration = start_time.elapsed();
    let avg_rate = if duration.as_secs_f64() > 0.0 {
        summary.events as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    info!("======= GENERATION SUMMARY =======");
    info!("Total time: {:.2} seconds", duration.as_secs_f64());
    info!("Events: {} (quotes {}, trades {})", summary.events, summary.quotes, summary.trades);
    info!("Sessions: {}", summary.sessions);
    info!("Files written: {}", summary.files);
    info!("Sampler draws: {}", summary.sampler_draws);
    info!("Average rate: {:.0} events/second", avg_rate);
    if summary.interrupted {
        warn!("Run was interrupted before the last session ended");
    }
    info!("==================================");

    Ok(())
}

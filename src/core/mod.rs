//! Benchmark orchestration and the command line flow around it.

pub mod controller;
pub mod error;
pub mod settings;

use std::future::Future;
use std::io;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use colored::*;
use indicatif::ProgressBar;

use crate::render::{FrameScheduler, GpuContext, GpuWorkload, RenderLoop};
use crate::thermal::{TemperatureProbe, ThermalSampler};
use crate::ui::report;

pub use controller::{BenchReport, BenchmarkController, RunOutcome};
pub use error::BenchError;
pub use settings::{BenchmarkSettings, CliArgs, DEFAULT_SETTINGS_FILE};

const PROGRESS_TICK: Duration = Duration::from_millis(100);

// ============================================================================
// MAIN FLOW
// ============================================================================

/// Load settings, bring up the GPU, run one benchmark and print the report.
///
/// Ctrl-C cancels the run; nothing is reported for a cancelled run.
pub async fn run_benchmark(args: CliArgs) -> Result<(), BenchError> {
    let mut settings = BenchmarkSettings::load(&args.config)?;
    settings.apply_overrides(&args)?;

    report::print_banner(&format!("GPU THERMAL BENCHMARK v{}", crate::VERSION));

    let context = GpuContext::new().await?;
    report::print_system_info(&context.adapter_info);
    report::print_settings(&settings);

    let probe = TemperatureProbe::from_paths(&settings.thermal_zone_paths, &settings.battery_paths);
    report::print_thermal_sources(&probe.readable_sources());
    let sampler = Arc::new(ThermalSampler::new(probe));

    let workload = GpuWorkload::new(&context, settings.triangle_count, settings.mesh_seed);
    let scheduler = FrameScheduler::spawn(
        RenderLoop::new(workload),
        settings.width,
        settings.height,
        settings.frame_interval(),
    )?;
    let controller = BenchmarkController::new(scheduler.handle(), sampler.clone(), settings.poll_interval());

    let duration = settings.duration();
    let progress = (!args.quiet).then(|| report::progress_bar(duration));
    if let Some(pb) = &progress {
        // Weak, so the callback stored in the sampler does not keep it alive
        let samples: Weak<ThermalSampler> = Arc::downgrade(&sampler);
        let pb = pb.clone();
        controller.on_temperature_update(move || {
            if let Some(sampler) = samples.upgrade() {
                pb.set_message(report::temperature_message(&sampler.results()));
            }
        });
    }
    let ticker = progress.clone().map(|pb| tokio::spawn(track_elapsed(pb)));

    report::print_section("Running");
    log::info!("Benchmark started for {:?}", duration);

    let outcome = tokio::select! {
        outcome = controller.run_benchmark(duration) => outcome,
        _ = interrupted(tokio::signal::ctrl_c()) => {
            log::warn!("Interrupted, cancelling the benchmark");
            controller.stop_benchmark().map(|_| RunOutcome::Cancelled)
        }
    };

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    scheduler.shutdown();

    match outcome? {
        RunOutcome::Completed(bench_report) => {
            if let Some(pb) = progress {
                pb.finish_with_message("benchmark completed");
            }
            println!();
            report::print_report(&bench_report);
        }
        RunOutcome::Cancelled => {
            if let Some(pb) = progress {
                pb.abandon_with_message("cancelled");
            }
            println!("\n{}", "Benchmark cancelled, no results.".bold().yellow());
        }
    }

    Ok(())
}

/// Resolve once the interrupt signal arrives.
///
/// If the handler cannot be installed the run carries on uninterruptible.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        log::warn!("Ctrl-C handler unavailable, the run cannot be interrupted: {}", e);
        futures::future::pending::<()>().await;
    }
}

/// Advance the bar with wall time until the run ends
async fn track_elapsed(pb: ProgressBar) {
    let started = Instant::now();
    let mut interval = tokio::time::interval(PROGRESS_TICK);
    loop {
        interval.tick().await;
        let elapsed = started.elapsed().as_millis() as u64;
        pb.set_position(elapsed.min(pb.length().unwrap_or(elapsed)));
    }
}

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{counting_probe, zone_probe, FakeWorkload};
use gpu_thermal_bench::render::{FrameScheduler, RenderLoop};
use gpu_thermal_bench::thermal::{TemperatureProbe, ThermalSampler};
use gpu_thermal_bench::{BenchmarkController, RunOutcome};

const FRAME: Duration = Duration::from_millis(2);
const POLL: Duration = Duration::from_millis(10);

type Harness = (
    FrameScheduler<RenderLoop<FakeWorkload>>,
    Arc<BenchmarkController<FakeWorkload>>,
    Arc<ThermalSampler>,
);

fn harness(raw_temperature: Option<f64>) -> Harness {
    harness_with(zone_probe(raw_temperature))
}

fn harness_with(probe: TemperatureProbe) -> Harness {
    let (workload, _draws) = FakeWorkload::new(Duration::ZERO);
    let scheduler = FrameScheduler::spawn(RenderLoop::new(workload), 64, 64, Some(FRAME)).unwrap();
    let sampler = Arc::new(ThermalSampler::new(probe));
    let controller = Arc::new(BenchmarkController::new(scheduler.handle(), sampler.clone(), POLL));
    (scheduler, controller, sampler)
}

#[tokio::test]
async fn completed_run_reports_frames_and_temperatures() {
    let (scheduler, controller, sampler) = harness(Some(48000.0));

    let updates = Arc::new(AtomicUsize::new(0));
    let counter = updates.clone();
    controller.on_temperature_update(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let outcome = controller.run_benchmark(Duration::from_millis(150)).await.unwrap();
    let RunOutcome::Completed(report) = outcome else {
        panic!("run was cancelled");
    };

    assert!(report.result.frame_count >= 1);
    assert!(!report.temperatures.is_empty());
    assert!(report.temperatures.iter().all(|&t| t == 48.0));
    assert!(updates.load(Ordering::SeqCst) >= report.temperatures.len());
    // sampling ends together with the render loop
    assert!(!sampler.is_running());
    assert_eq!(controller.temperature_samples(), report.temperatures);

    scheduler.shutdown();
}

#[tokio::test]
async fn run_without_sensors_still_completes() {
    let (scheduler, controller, _sampler) = harness(None);

    let outcome = controller.run_benchmark(Duration::from_millis(50)).await.unwrap();
    match outcome {
        RunOutcome::Completed(report) => {
            assert!(report.temperatures.is_empty());
            assert!(report.result.frame_count >= 1);
        }
        RunOutcome::Cancelled => panic!("run was cancelled"),
    }
    scheduler.shutdown();
}

#[tokio::test]
async fn stop_cancels_both_subsystems() {
    let (scheduler, controller, sampler) = harness(Some(40.0));

    let running = controller.clone();
    let run = tokio::spawn(async move { running.run_benchmark(Duration::from_secs(30)).await });

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(sampler.is_running());
    controller.stop_benchmark().unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(!sampler.is_running());

    scheduler.shutdown();
}

#[tokio::test]
async fn newer_run_replaces_the_running_one() {
    let (scheduler, controller, sampler) = harness(Some(40.0));

    let first = controller.clone();
    let first_run = tokio::spawn(async move { first.run_benchmark(Duration::from_secs(30)).await });
    tokio::time::sleep(Duration::from_millis(40)).await;

    let second = controller.run_benchmark(Duration::from_millis(100));
    let (first_outcome, second_outcome) = tokio::join!(
        async { tokio::time::timeout(Duration::from_secs(5), first_run).await },
        second,
    );

    assert_eq!(first_outcome.unwrap().unwrap().unwrap(), RunOutcome::Cancelled);
    assert!(matches!(second_outcome.unwrap(), RunOutcome::Completed(_)));
    assert!(!sampler.is_running());

    scheduler.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finished_run_keeps_its_series_when_a_newer_run_starts() {
    let (scheduler, controller, _sampler) = harness_with(counting_probe());

    let first = controller.run_benchmark(Duration::from_millis(40));
    tokio::pin!(first);
    assert!(futures::poll!(&mut first).is_pending());

    // the first session finishes on the render thread before it is awaited
    tokio::time::sleep(Duration::from_millis(200)).await;

    let second = controller.run_benchmark(Duration::from_millis(40));
    tokio::pin!(second);
    assert!(futures::poll!(&mut second).is_pending());

    let RunOutcome::Completed(report) = first.await.unwrap() else {
        panic!("first run was cancelled");
    };
    // the series starts at the first reading and holds no reading of the second run
    assert_eq!(report.temperatures.first(), Some(&1.0));
    assert!(report.temperatures.len() >= 2);
    assert!(report.temperatures.windows(2).all(|pair| pair[1] == pair[0] + 1.0));

    let RunOutcome::Completed(second_report) = second.await.unwrap() else {
        panic!("second run was cancelled");
    };
    let last_of_first = *report.temperatures.last().unwrap();
    assert!(second_report.temperatures.iter().all(|&t| t > last_of_first));

    scheduler.shutdown();
}

#[tokio::test]
async fn run_after_shutdown_is_an_error() {
    let (scheduler, controller, sampler) = harness(Some(40.0));
    scheduler.shutdown();

    assert!(controller.run_benchmark(Duration::from_millis(50)).await.is_err());
    assert!(!sampler.is_running());
}

mod common;

use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::time::Duration;

use common::FakeWorkload;
use gpu_thermal_bench::render::{FrameScheduler, LoopState, RenderLoop};
use gpu_thermal_bench::BenchError;

const FRAME: Duration = Duration::from_millis(2);

#[test]
fn timed_session_delivers_one_result() {
    let (workload, draws) = FakeWorkload::new(Duration::ZERO);
    let scheduler = FrameScheduler::spawn(RenderLoop::new(workload), 64, 64, Some(FRAME)).unwrap();

    let (tx, rx) = mpsc::channel();
    scheduler
        .handle()
        .post(move |render_loop| {
            render_loop.start(Duration::from_millis(100), move |result| {
                tx.send(result).unwrap();
            })
        })
        .unwrap();

    let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(result.frame_count >= 1);
    assert!(result.average_fps > 0.0);
    assert!(result.min_fps <= result.average_fps + 1e-9);
    // every recorded frame was also drawn
    assert!(draws.load(Ordering::SeqCst) > result.frame_count);

    // only one result per session
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    let (state_tx, state_rx) = mpsc::channel();
    scheduler
        .handle()
        .post(move |render_loop| state_tx.send(render_loop.state()).unwrap())
        .unwrap();
    assert_eq!(state_rx.recv_timeout(Duration::from_secs(1)).unwrap(), LoopState::Idle);

    scheduler.shutdown();
}

#[test]
fn stopped_session_never_reports() {
    let (workload, _draws) = FakeWorkload::new(Duration::ZERO);
    let scheduler = FrameScheduler::spawn(RenderLoop::new(workload), 64, 64, Some(FRAME)).unwrap();
    let handle = scheduler.handle();

    let (tx, rx) = mpsc::channel();
    handle
        .post(move |render_loop| {
            render_loop.start(Duration::from_secs(30), move |result| {
                let _ = tx.send(result);
            })
        })
        .unwrap();
    std::thread::sleep(Duration::from_millis(50));
    handle.post(|render_loop| render_loop.stop()).unwrap();

    // the callback was dropped with the session
    assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Err(mpsc::RecvTimeoutError::Disconnected));
    scheduler.shutdown();
}

#[test]
fn uncapped_frames_render_back_to_back() {
    let (workload, draws) = FakeWorkload::new(Duration::from_micros(100));
    let scheduler = FrameScheduler::spawn(RenderLoop::new(workload), 64, 64, None).unwrap();

    let (tx, rx) = mpsc::channel();
    scheduler
        .handle()
        .post(move |render_loop| {
            render_loop.start(Duration::from_millis(50), move |result| {
                tx.send(result).unwrap();
            })
        })
        .unwrap();

    let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    // far more than a 60 Hz cadence would allow in 50 ms
    assert!(result.frame_count > 10);
    assert!(draws.load(Ordering::SeqCst) > 10);
    scheduler.shutdown();
}

#[test]
fn initialization_failure_is_reported_to_the_caller() {
    let (mut workload, draws) = FakeWorkload::new(Duration::ZERO);
    workload.fail_init = true;

    let err = FrameScheduler::spawn(RenderLoop::new(workload), 64, 64, Some(FRAME))
        .err()
        .expect("spawn should fail");
    match err {
        BenchError::Shader { stage, diagnostics } => {
            assert_eq!(stage, "fragment");
            assert!(diagnostics.contains("syntax error"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(draws.load(Ordering::SeqCst), 0);
}

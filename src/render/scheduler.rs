//! Host-side frame scheduler.
//!
//! Owns a dedicated render thread that drives a [`RenderSurface`] the way a
//! windowing system drives a continuously rendering view: one
//! `on_surface_created`, one `on_resize`, then `on_draw_frame` at the refresh
//! cadence. Work for the surface is posted as closures and runs on the render
//! thread between two frame callbacks.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::error::BenchError;

/// Callbacks a continuously rendered surface receives from its host
pub trait RenderSurface: Send + 'static {
    /// Called once on the render thread before any other callback
    fn on_surface_created(&mut self) -> Result<(), BenchError>;

    fn on_resize(&mut self, width: u32, height: u32);

    /// Called once per frame; must not block on GPU completion
    fn on_draw_frame(&mut self);

    /// Whether the host should keep issuing frame callbacks.
    ///
    /// When this returns `false` the render thread sleeps until new work is
    /// posted instead of spinning.
    fn wants_frames(&self) -> bool {
        true
    }
}

type SurfaceTask<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Command<S> {
    Run(SurfaceTask<S>),
    Shutdown,
}

/// Cloneable handle used to post work onto the render thread
pub struct SchedulerHandle<S> {
    tx: Sender<Command<S>>,
}

impl<S> Clone for SchedulerHandle<S> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<S: RenderSurface> SchedulerHandle<S> {
    /// Queue `task` to run on the render thread before the next frame
    pub fn post<F>(&self, task: F) -> Result<(), BenchError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx
            .send(Command::Run(Box::new(task)))
            .map_err(|_| BenchError::RenderThread("render thread has exited".into()))
    }
}

/// Owner of the render thread
pub struct FrameScheduler<S> {
    handle: SchedulerHandle<S>,
    thread: Option<JoinHandle<()>>,
}

impl<S: RenderSurface> FrameScheduler<S> {
    /// Start the render thread and wait for `on_surface_created` to finish.
    ///
    /// `frame_interval` of `None` issues frame callbacks back to back.
    pub fn spawn(
        mut surface: S,
        width: u32,
        height: u32,
        frame_interval: Option<Duration>,
    ) -> Result<Self, BenchError> {
        let (tx, rx) = mpsc::channel::<Command<S>>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), BenchError>>();

        let thread = thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                if let Err(e) = surface.on_surface_created() {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                surface.on_resize(width, height);
                let _ = ready_tx.send(Ok(()));
                drop(ready_tx);

                render_thread_loop(surface, rx, frame_interval);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(BenchError::RenderThread(
                    "render thread exited during surface creation".into(),
                ));
            }
        }

        log::info!("Render thread started ({}x{}, {:?} per frame)", width, height, frame_interval);
        Ok(Self {
            handle: SchedulerHandle { tx },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> SchedulerHandle<S> {
        self.handle.clone()
    }

    /// Stop issuing callbacks and join the render thread
    pub fn shutdown(mut self) {
        self.stop_thread();
    }
}

impl<S> FrameScheduler<S> {
    fn stop_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.tx.send(Command::Shutdown);
            if thread.join().is_err() {
                log::error!("Render thread panicked");
            }
        }
    }
}

impl<S> Drop for FrameScheduler<S> {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

/// Returns `false` once the thread should exit
fn apply<S>(surface: &mut S, command: Command<S>) -> bool {
    match command {
        Command::Run(task) => {
            task(surface);
            true
        }
        Command::Shutdown => false,
    }
}

fn render_thread_loop<S: RenderSurface>(
    mut surface: S,
    rx: Receiver<Command<S>>,
    frame_interval: Option<Duration>,
) {
    let mut next_frame = Instant::now();

    loop {
        // Drain posted work between frames
        loop {
            match rx.try_recv() {
                Ok(command) => {
                    if !apply(&mut surface, command) {
                        return;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }

        if !surface.wants_frames() {
            match rx.recv() {
                Ok(command) => {
                    if !apply(&mut surface, command) {
                        return;
                    }
                    next_frame = Instant::now();
                    continue;
                }
                Err(_) => return,
            }
        }

        surface.on_draw_frame();

        if let Some(interval) = frame_interval {
            next_frame += interval;
            let now = Instant::now();
            if next_frame > now {
                // Wake early for posted work, otherwise wait out the frame
                match rx.recv_timeout(next_frame - now) {
                    Ok(command) => {
                        if !apply(&mut surface, command) {
                            return;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            } else {
                // Fell behind the cadence, do not try to catch up
                next_frame = now;
            }
        }
    }
}

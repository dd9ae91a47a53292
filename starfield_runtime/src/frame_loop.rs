//! Host-driven frame scheduler. Tasks registered here run once per `tick` until their
//! handle is cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub type FrameCallback = Box<dyn FnMut(f32) + Send>;

/// Cancellation handle for a scheduled frame task. Cloning shares the same task.
#[derive(Clone, Debug)]
pub struct FrameHandle {
    cancelled: Arc<AtomicBool>,
}

impl FrameHandle {
    /// Stops the task. No tick that starts after this returns will invoke it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct FrameTask {
    cancelled: Arc<AtomicBool>,
    callback: FrameCallback,
}

#[derive(Default)]
pub struct FrameLoop {
    tasks: Vec<FrameTask>,
    ticks: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, callback: F) -> FrameHandle
    where
        F: FnMut(f32) + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.tasks.push(FrameTask {
            cancelled: Arc::clone(&cancelled),
            callback: Box::new(callback),
        });
        FrameHandle { cancelled }
    }

    /// Runs every live task once. Returns how many ran.
    pub fn tick(&mut self, delta: f32) -> usize {
        self.tasks.retain(|task| !task.cancelled.load(Ordering::SeqCst));
        let mut ran = 0;
        for task in &mut self.tasks {
            // Re-checked per task: an earlier task in this tick may cancel a later one.
            if task.cancelled.load(Ordering::SeqCst) {
                continue;
            }
            (task.callback)(delta);
            ran += 1;
        }
        self.ticks += 1;
        ran
    }

    pub fn task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| !task.cancelled.load(Ordering::SeqCst))
            .count()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

//! Single-worker FIFO task queue.
//!
//! All pipeline work runs on one background thread in strict submission
//! order. No deduplication: submitting the same contract twice runs it
//! twice. The queue lock is never held while a stage executes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use super::PipelineError;

/// Poll interval when the queue is empty.
const IDLE_POLL_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ocr,
    Extract,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ocr => "ocr",
            Stage::Extract => "extract",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct QueuedTask {
    pub contract_id: Uuid,
    pub stage: Stage,
}

/// Returned by `submit`: where the task landed and what is in front of it.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SubmitReceipt {
    /// 1-based position among waiting tasks.
    pub position: usize,
    pub queue_depth: usize,
    /// The task executing right now, if any.
    pub current: Option<QueuedTask>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueStatus {
    pub queue_depth: usize,
    pub current: Option<QueuedTask>,
}

struct QueueInner {
    queue: VecDeque<QueuedTask>,
    current: Option<QueuedTask>,
}

/// Submit-only view of the queue, handed to stage executors so the OCR
/// stage can chain the extraction stage without owning the queue.
pub trait TaskSink {
    fn enqueue(&self, contract_id: Uuid, stage: Stage);
}

/// Executes one queued task. The worker owns the runner exclusively, so it
/// may hold its own database connection.
pub trait StageRunner: Send {
    fn run(
        &mut self,
        contract_id: Uuid,
        stage: Stage,
        sink: &dyn TaskSink,
    ) -> Result<(), PipelineError>;
}

#[derive(Clone)]
struct InnerSink(Arc<Mutex<QueueInner>>);

impl TaskSink for InnerSink {
    fn enqueue(&self, contract_id: Uuid, stage: Stage) {
        let mut inner = self.0.lock().unwrap();
        inner.queue.push_back(QueuedTask { contract_id, stage });
    }
}

/// Handle for the worker thread. Supports graceful shutdown via
/// `shutdown()` or automatic cleanup on `Drop`; the in-flight task
/// completes, waiting tasks are abandoned.
pub struct TaskQueue {
    inner: Arc<Mutex<QueueInner>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawn the worker thread draining tasks through `runner`.
    pub fn start(mut runner: Box<dyn StageRunner + Send>) -> Self {
        let inner = Arc::new(Mutex::new(QueueInner {
            queue: VecDeque::new(),
            current: None,
        }));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_inner = inner.clone();
        let flag = shutdown.clone();
        let handle = std::thread::spawn(move || {
            tracing::info!("Pipeline worker started");
            worker_loop(&worker_inner, &flag, runner.as_mut());
            tracing::info!("Pipeline worker shutting down");
        });

        Self {
            inner,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, contract_id: Uuid, stage: Stage) -> SubmitReceipt {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push_back(QueuedTask { contract_id, stage });
        let receipt = SubmitReceipt {
            position: inner.queue.len(),
            queue_depth: inner.queue.len(),
            current: inner.current,
        };
        tracing::info!(
            contract_id = %contract_id,
            stage = stage.as_str(),
            position = receipt.position,
            "Task submitted"
        );
        receipt
    }

    pub fn status(&self) -> QueueStatus {
        let inner = self.inner.lock().unwrap();
        QueueStatus {
            queue_depth: inner.queue.len(),
            current: inner.current,
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn worker_loop(inner: &Arc<Mutex<QueueInner>>, shutdown: &AtomicBool, runner: &mut dyn StageRunner) {
    let sink = InnerSink(inner.clone());
    while !shutdown.load(Ordering::Relaxed) {
        let task = {
            let mut guard = inner.lock().unwrap();
            let task = guard.queue.pop_front();
            guard.current = task;
            task
        };

        let Some(task) = task else {
            std::thread::sleep(Duration::from_millis(IDLE_POLL_MS));
            continue;
        };

        // Stage failures are recorded against the contract and logged;
        // the worker always moves on to the next task.
        if let Err(e) = runner.run(task.contract_id, task.stage, &sink) {
            tracing::error!(
                contract_id = %task.contract_id,
                stage = task.stage.as_str(),
                error = %e,
                "Stage execution failed"
            );
        }

        inner.lock().unwrap().current = None;
    }
}

//! Deep-validation task queue.
//!
//! A fixed pool of worker threads shares one channel receiver. Each task runs
//! the coherence rules and the risk model over a dossier snapshot; callers
//! poll by task id and `take` the result once finished. Finished tasks nobody
//! takes are evicted after the retention window. Dropping the queue closes
//! the channel, lets in-flight tasks finish and joins the workers.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::coherence::{CoherenceReport, CoherenceValidator};
use crate::config::EngineConfig;
use crate::models::Dossier;
use crate::risk::{RiskAssessment, RiskContext, RiskValidator};

pub type TaskId = Uuid;

/// How long a finished task stays on the board when nobody takes it.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Validation queue is shut down")]
    ShutDown,
    #[error("Unknown validation task: {0}")]
    UnknownTask(TaskId),
    #[error("Validation queue needs at least one worker")]
    NoWorkers,
    #[error("Failed to spawn validation worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Validation queue state lock poisoned")]
    Poisoned,
}

/// Full revalidation of one dossier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepValidation {
    pub dossier_id: String,
    pub coherence: CoherenceReport,
    pub risk: RiskAssessment,
    pub completed_at: DateTime<Utc>,
}

impl DeepValidation {
    /// Blocked by coherence or rejected by the risk model.
    pub fn is_blocked(&self) -> bool {
        self.coherence.is_blocked || !self.risk.valid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed(Box<DeepValidation>),
    Failed(String),
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

struct Job {
    id: TaskId,
    dossier_id: String,
    dossier: Dossier,
    context: RiskContext,
}

struct TaskEntry {
    status: TaskStatus,
    finished_at: Option<Instant>,
}

/// Task statuses plus a condition variable signalled on every change.
struct TaskBoard {
    entries: Mutex<HashMap<TaskId, TaskEntry>>,
    changed: Condvar,
    retention: Duration,
}

impl TaskBoard {
    fn new(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            changed: Condvar::new(),
            retention,
        }
    }

    /// Record a status change. Finished entries past retention are evicted
    /// on the way.
    fn set(&self, id: TaskId, status: TaskStatus) {
        match self.entries.lock() {
            Ok(mut entries) => {
                let now = Instant::now();
                let before = entries.len();
                entries.retain(|_, e| {
                    e.finished_at
                        .map_or(true, |at| now.duration_since(at) < self.retention)
                });
                let evicted = before - entries.len();
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted finished validation tasks");
                }
                let finished_at = status.is_finished().then_some(now);
                entries.insert(id, TaskEntry { status, finished_at });
            }
            Err(_) => tracing::error!(task_id = %id, "Task board lock poisoned"),
        }
        self.changed.notify_all();
    }
}

pub struct ValidationQueue {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    board: Arc<TaskBoard>,
}

impl ValidationQueue {
    pub fn new(worker_count: usize) -> Result<Self, QueueError> {
        Self::with_retention(worker_count, DEFAULT_RETENTION)
    }

    /// Pool whose finished tasks are kept for `retention` when not taken.
    pub fn with_retention(worker_count: usize, retention: Duration) -> Result<Self, QueueError> {
        if worker_count == 0 {
            return Err(QueueError::NoWorkers);
        }
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let board = Arc::new(TaskBoard::new(retention));

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let receiver = Arc::clone(&receiver);
            let board = Arc::clone(&board);
            let handle = std::thread::Builder::new()
                .name(format!("dossiera-validation-{index}"))
                .spawn(move || worker_loop(index, &receiver, &board))?;
            workers.push(handle);
        }
        tracing::info!(workers = worker_count, "Validation queue started");

        Ok(Self {
            sender: Some(sender),
            workers,
            board,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, QueueError> {
        Self::new(config.queue_workers)
    }

    /// Queue a full revalidation of `dossier`. The dossier is a snapshot:
    /// later uploads need a new task.
    pub fn enqueue(
        &self,
        dossier_id: impl Into<String>,
        dossier: Dossier,
        context: RiskContext,
    ) -> Result<TaskId, QueueError> {
        let sender = self.sender.as_ref().ok_or(QueueError::ShutDown)?;
        let id = Uuid::new_v4();
        let dossier_id = dossier_id.into();

        self.board.set(id, TaskStatus::Pending);
        let job = Job {
            id,
            dossier_id: dossier_id.clone(),
            dossier,
            context,
        };
        if sender.send(job).is_err() {
            if let Ok(mut entries) = self.board.entries.lock() {
                entries.remove(&id);
            }
            return Err(QueueError::ShutDown);
        }
        tracing::debug!(task_id = %id, dossier_id = %dossier_id, "Validation task queued");
        Ok(id)
    }

    pub fn poll(&self, id: TaskId) -> Result<TaskStatus, QueueError> {
        let entries = self.board.entries.lock().map_err(|_| QueueError::Poisoned)?;
        entries
            .get(&id)
            .map(|e| e.status.clone())
            .ok_or(QueueError::UnknownTask(id))
    }

    /// Current status of a task. A finished task is removed from the board
    /// and its id becomes unknown afterwards.
    pub fn take(&self, id: TaskId) -> Result<TaskStatus, QueueError> {
        let mut entries = self.board.entries.lock().map_err(|_| QueueError::Poisoned)?;
        match entries.get(&id) {
            None => Err(QueueError::UnknownTask(id)),
            Some(entry) if !entry.status.is_finished() => Ok(entry.status.clone()),
            Some(_) => entries
                .remove(&id)
                .map(|e| e.status)
                .ok_or(QueueError::UnknownTask(id)),
        }
    }

    /// Tasks currently on the board, finished ones included.
    pub fn tracked_tasks(&self) -> usize {
        self.board.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Block until the task finishes or `timeout` elapses, then return its
    /// latest status.
    pub fn wait(&self, id: TaskId, timeout: Duration) -> Result<TaskStatus, QueueError> {
        let deadline = Instant::now() + timeout;
        let mut entries = self.board.entries.lock().map_err(|_| QueueError::Poisoned)?;
        loop {
            let status = entries
                .get(&id)
                .map(|e| e.status.clone())
                .ok_or(QueueError::UnknownTask(id))?;
            let now = Instant::now();
            if status.is_finished() || now >= deadline {
                return Ok(status);
            }
            let (guard, _) = self
                .board
                .changed
                .wait_timeout(entries, deadline - now)
                .map_err(|_| QueueError::Poisoned)?;
            entries = guard;
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting tasks, drain the queue and join the workers.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Validation worker exited with a panic");
            }
        }
        tracing::info!("Validation queue stopped");
    }
}

impl Drop for ValidationQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(index: usize, receiver: &Mutex<Receiver<Job>>, board: &TaskBoard) {
    let coherence = CoherenceValidator::new();
    let risk = RiskValidator::new();
    loop {
        // The lock is held only while waiting for the next job.
        let next = match receiver.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok(job) = next else {
            break;
        };

        board.set(job.id, TaskStatus::Running);
        let _span = tracing::info_span!("deep_validation", task_id = %job.id, worker = index).entered();
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| DeepValidation {
            coherence: coherence.validate_dossier_at(&job.dossier, job.context.today),
            risk: risk.validate(&job.dossier, &job.context),
            dossier_id: job.dossier_id.clone(),
            completed_at: Utc::now(),
        }));

        let status = match outcome {
            Ok(result) => {
                tracing::info!(
                    dossier_id = %job.dossier_id,
                    blocked = result.is_blocked(),
                    risk_level = %result.risk.risk_level,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Deep validation completed"
                );
                TaskStatus::Completed(Box::new(result))
            }
            Err(_) => {
                tracing::error!(dossier_id = %job.dossier_id, "Deep validation panicked");
                TaskStatus::Failed("Validation failed unexpectedly".to_string())
            }
        };
        board.set(job.id, status);
    }
    tracing::debug!(worker = index, "Validation worker exiting");
}

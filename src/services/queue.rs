//! In-memory job queue.
//!
//! [`QueueState`] is a reducer: every change goes through [`QueueState::apply`]
//! as a discrete [`QueueEvent`], which rejects transitions that would break the
//! per-job state machine or start a second job while one is in flight.
//! [`JobQueue`] wraps it for sharing between HTTP handlers and the worker.
//!
//! Display order: each submitted batch is prepended, FIFO within the batch.
//! [`QueueState::dispatch`] picks the first PENDING job in that order, so the
//! newest batch is worked before older leftovers.
//!
//! Jobs hold their upload and result bytes until [`QueueEvent::JobsCleared`]
//! discards the finished ones. PENDING and PROCESSING jobs are never removed.

use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};

use crate::models::job::{GeneratedFrame, Job, JobId, JobStatus, SourceImage};
use crate::models::upload::QueueCounts;

/// A discrete state transition.
#[derive(Debug)]
pub enum QueueEvent {
    JobsAdded(Vec<Job>),
    ProcessingStarted(JobId),
    ProcessingSucceeded { job_id: JobId, frame: GeneratedFrame },
    ProcessingFailed { job_id: JobId, error: String },
    /// Drop every COMPLETED and FAILED job.
    JobsCleared,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("job {0} not found")]
    UnknownJob(JobId),

    #[error("job {in_flight} is already processing")]
    Busy { in_flight: JobId },

    #[error("job {job_id} is {actual}, expected {expected}")]
    InvalidState {
        job_id: JobId,
        actual: JobStatus,
        expected: JobStatus,
    },
}

/// Work handed to the worker by [`QueueState::dispatch`].
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub job_id: JobId,
    pub source: SourceImage,
}

#[derive(Debug, Default)]
pub struct QueueState {
    jobs: Vec<Job>,
    in_flight: Option<JobId>,
    revision: u64,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: QueueEvent) -> Result<(), TransitionError> {
        match event {
            QueueEvent::JobsAdded(mut batch) => {
                batch.append(&mut self.jobs);
                self.jobs = batch;
            }
            QueueEvent::ProcessingStarted(job_id) => {
                if let Some(in_flight) = self.in_flight {
                    return Err(TransitionError::Busy { in_flight });
                }
                let job = self.transition(job_id, JobStatus::Pending, JobStatus::Processing)?;
                job.updated_at = Utc::now();
                self.in_flight = Some(job_id);
            }
            QueueEvent::ProcessingSucceeded { job_id, frame } => {
                let job = self.transition(job_id, JobStatus::Processing, JobStatus::Completed)?;
                job.result = Some(frame);
                job.updated_at = Utc::now();
                self.in_flight = None;
            }
            QueueEvent::ProcessingFailed { job_id, error } => {
                let job = self.transition(job_id, JobStatus::Processing, JobStatus::Failed)?;
                job.error = Some(error);
                job.updated_at = Utc::now();
                self.in_flight = None;
            }
            QueueEvent::JobsCleared => {
                self.jobs.retain(|job| !job.status.is_terminal());
            }
        }
        self.revision += 1;
        Ok(())
    }

    fn transition(
        &mut self,
        job_id: JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<&mut Job, TransitionError> {
        let job = self
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(TransitionError::UnknownJob(job_id))?;
        if job.status != expected {
            return Err(TransitionError::InvalidState {
                job_id,
                actual: job.status,
                expected,
            });
        }
        job.status = next;
        Ok(job)
    }

    /// First PENDING job in display order.
    pub fn next_pending(&self) -> Option<&Job> {
        self.jobs.iter().find(|j| j.status == JobStatus::Pending)
    }

    /// Start the next job if idle. Returns `None` when busy or nothing is
    /// pending.
    pub fn dispatch(&mut self) -> Option<Dispatch> {
        if self.in_flight.is_some() {
            return None;
        }
        let next = self.next_pending().map(|job| Dispatch {
            job_id: job.id,
            source: job.source.clone(),
        })?;
        self.apply(QueueEvent::ProcessingStarted(next.job_id)).ok()?;
        Some(next)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == job_id)
    }

    pub fn in_flight(&self) -> Option<JobId> {
        self.in_flight
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts {
            total: self.jobs.len(),
            ..QueueCounts::default()
        };
        for job in &self.jobs {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// Shared handle to the queue.
///
/// The lock is never held across an await point; submissions are immediate
/// and never wait on the worker.
pub struct JobQueue {
    state: Mutex<QueueState>,
    wake: Notify,
    changes: watch::Sender<u64>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Mutex::new(QueueState::new()),
            wake: Notify::new(),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a batch as PENDING jobs ahead of everything already queued.
    pub fn submit(&self, sources: Vec<SourceImage>) -> Vec<JobId> {
        if sources.is_empty() {
            return Vec::new();
        }
        let now = Utc::now();
        let batch: Vec<Job> = sources.into_iter().map(|s| Job::new(s, now)).collect();
        let ids = batch.iter().map(|j| j.id).collect();

        let revision = {
            let mut state = self.lock();
            // JobsAdded cannot be rejected
            let _ = state.apply(QueueEvent::JobsAdded(batch));
            metrics::gauge!("end_frame_queue_depth").set(state.counts().pending as f64);
            state.revision()
        };
        self.changes.send_replace(revision);
        self.wake.notify_one();
        ids
    }

    /// Start the next PENDING job if nothing is in flight.
    pub fn dispatch(&self) -> Option<Dispatch> {
        let (dispatch, revision) = {
            let mut state = self.lock();
            let dispatch = state.dispatch()?;
            metrics::gauge!("end_frame_queue_depth").set(state.counts().pending as f64);
            (dispatch, state.revision())
        };
        self.changes.send_replace(revision);
        Some(dispatch)
    }

    /// Record the outcome of the in-flight job.
    pub fn finish(
        &self,
        job_id: JobId,
        outcome: Result<GeneratedFrame, String>,
    ) -> Result<(), TransitionError> {
        let event = match outcome {
            Ok(frame) => QueueEvent::ProcessingSucceeded { job_id, frame },
            Err(error) => QueueEvent::ProcessingFailed { job_id, error },
        };
        let revision = {
            let mut state = self.lock();
            state.apply(event)?;
            state.revision()
        };
        self.changes.send_replace(revision);
        Ok(())
    }

    /// Discard finished jobs and their payloads. Returns how many were removed.
    pub fn clear_finished(&self) -> usize {
        let (removed, revision) = {
            let mut state = self.lock();
            let before = state.jobs().len();
            // JobsCleared cannot be rejected
            let _ = state.apply(QueueEvent::JobsCleared);
            (before - state.jobs().len(), state.revision())
        };
        self.changes.send_replace(revision);
        removed
    }

    /// Wait until a submission may have produced new work.
    pub async fn wait_for_work(&self) {
        self.wake.notified().await;
    }

    /// Receiver that observes the revision after every transition.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// All jobs in display order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.lock().jobs().to_vec()
    }

    pub fn get(&self, job_id: JobId) -> Option<Job> {
        self.lock().job(job_id).cloned()
    }

    pub fn counts(&self) -> QueueCounts {
        self.lock().counts()
    }

    pub fn in_flight(&self) -> Option<JobId> {
        self.lock().in_flight()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::{Job, JobStatus};

/// Response after submitting a batch of start frames.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_ids: Vec<Uuid>,
    /// Files dropped because they were not images.
    pub skipped: usize,
}

/// Response after discarding finished jobs.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub removed: usize,
    pub counts: QueueCounts,
}

/// Per-status totals across the whole queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Client-facing snapshot of a job. Binary payloads are served from their
/// own endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub file_name: String,
    pub suggested_file_name: String,
    pub source_url: String,
    pub result_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        let base = format!("/api/v1/jobs/{}", job.id);
        Self {
            job_id: job.id,
            status: job.status,
            file_name: job.source.file_name.clone(),
            suggested_file_name: job.suggested_file_name.clone(),
            source_url: format!("{base}/source"),
            result_url: job.result.as_ref().map(|_| format!("{base}/result")),
            aspect_ratio: job.result.as_ref().map(|r| r.aspect_ratio.to_string()),
            error: job.error.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Response for listing the queue in display order.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobView>,
    pub counts: QueueCounts,
}

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::aspect_ratio::AspectRatio;

pub type JobId = Uuid;

/// Fixed marker inserted into every download name.
pub const OUTPUT_SUFFIX: &str = "end-frame";

/// Lifecycle of an end-frame generation job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// An uploaded start frame.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// A generated end frame, always PNG-encoded.
#[derive(Debug, Clone)]
pub struct GeneratedFrame {
    pub mime_type: String,
    pub bytes: Bytes,
    pub aspect_ratio: AspectRatio,
}

/// Caller-side generation settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub aspect_ratio: AspectRatio,
}

/// One start frame on its way to an end frame.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source: SourceImage,
    pub status: JobStatus,
    pub result: Option<GeneratedFrame>,
    pub error: Option<String>,
    pub suggested_file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(source: SourceImage, now: DateTime<Utc>) -> Self {
        let suggested_file_name = suggested_output_name(&source.file_name, now);
        Self {
            id: Uuid::new_v4(),
            source,
            status: JobStatus::Pending,
            result: None,
            error: None,
            suggested_file_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Build the download name for a job created at `now`.
///
/// `sunset.jpg` created at epoch millis `1712345678901` becomes
/// `sunset-end-frame-678901.png`. Only the last extension is stripped; names
/// without one, or whose only dot leads the name, are kept whole.
pub fn suggested_output_name(original: &str, now: DateTime<Utc>) -> String {
    let stem = match original.rfind('.') {
        Some(idx) if idx > 0 => &original[..idx],
        _ => original,
    };
    let disambiguator = now.timestamp_millis().rem_euclid(1_000_000);
    format!("{stem}-{OUTPUT_SUFFIX}-{disambiguator:06}.png")
}

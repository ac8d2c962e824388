use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::job::{JobStatus, SourceImage};
use crate::models::upload::{ClearResponse, JobListResponse, JobView, UploadResponse};

/// POST /api/v1/jobs: Upload one or more start frames.
///
/// Every file field is considered; anything whose declared type is not
/// `image/*` is dropped without an error.
pub async fn submit_jobs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, StatusCode> {
    let mut sources = Vec::new();
    let mut skipped = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mime_type = field.content_type().unwrap_or_default().to_string();
        if !mime_type.starts_with("image/") {
            tracing::debug!(%file_name, %mime_type, "Skipping non-image upload");
            skipped += 1;
            continue;
        }

        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        sources.push(SourceImage {
            file_name,
            mime_type,
            bytes,
        });
    }

    let job_ids = state.queue.submit(sources);
    metrics::counter!("end_frame_jobs_submitted").increment(job_ids.len() as u64);
    tracing::info!(accepted = job_ids.len(), skipped, "Start frames queued");

    Ok(Json(UploadResponse { job_ids, skipped }))
}

/// GET /api/v1/jobs: All jobs in display order.
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs = state.queue.snapshot();
    let counts = state.queue.counts();
    Json(JobListResponse {
        jobs: jobs.iter().map(JobView::from).collect(),
        counts,
    })
}

/// DELETE /api/v1/jobs: Discard completed and failed jobs along with their
/// images. Queued and running jobs are kept.
pub async fn clear_jobs(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.queue.clear_finished();
    tracing::info!(removed, "Cleared finished jobs");
    Json(ClearResponse {
        removed,
        counts: state.queue.counts(),
    })
}

/// GET /api/v1/jobs/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobView>, StatusCode> {
    let job = state.queue.get(job_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(JobView::from(&job)))
}

/// GET /api/v1/jobs/{job_id}/source: The uploaded start frame, for previews.
pub async fn get_source(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    let job = state.queue.get(job_id).ok_or(StatusCode::NOT_FOUND)?;
    let content_type = HeaderValue::from_str(&job.source.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    Ok(([(header::CONTENT_TYPE, content_type)], job.source.bytes).into_response())
}

/// GET /api/v1/jobs/{job_id}/result: Download the generated end frame.
pub async fn download_result(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    let job = state.queue.get(job_id).ok_or(StatusCode::NOT_FOUND)?;
    let frame = match (job.status, job.result) {
        (JobStatus::Completed, Some(frame)) => frame,
        _ => return Err(StatusCode::CONFLICT),
    };

    let disposition = HeaderValue::from_str(&content_disposition(&job.suggested_file_name))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let content_type = HeaderValue::from_str(&frame.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("image/png"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        frame.bytes,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback plus the RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let encoded = urlencoding::encode(file_name);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

//! Test helper utilities shared by the integration and E2E suites

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use end_frame_gen::models::aspect_ratio::AspectRatio;
use end_frame_gen::models::job::{GeneratedFrame, GenerationConfig, SourceImage};
use end_frame_gen::models::upload::{JobListResponse, JobView, UploadResponse};
use end_frame_gen::services::generation::{FrameGenerator, GenerationError};
use end_frame_gen::services::queue::JobQueue;
use reqwest::multipart;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

use crate::fixtures::png_bytes;

pub const BOUNDARY: &str = "end-frame-test-boundary";

/// A file part for [`multipart_body`]
pub struct UploadPart<'a> {
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// Encode `parts` as a `multipart/form-data` body under the `files` field.
/// Returns the content-type header value and the body.
pub fn multipart_body(parts: &[UploadPart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Generator whose outcome is picked by file-name prefix:
/// `fail-*` is a remote error, `empty-*` returns no image, anything else
/// succeeds with a small PNG.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl FrameGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        source: &SourceImage,
        _config: &GenerationConfig,
    ) -> Result<GeneratedFrame, GenerationError> {
        self.calls.lock().unwrap().push(source.file_name.clone());
        if source.file_name.starts_with("fail-") {
            return Err(GenerationError::Remote(
                "API key not valid. Please pass a valid API key.".to_string(),
            ));
        }
        if source.file_name.starts_with("empty-") {
            return Err(GenerationError::NoImageReturned);
        }
        let aspect_ratio = AspectRatio::detect(&source.bytes)?;
        Ok(GeneratedFrame {
            mime_type: "image/png".to_string(),
            bytes: Bytes::from(png_bytes(4, 4)),
            aspect_ratio,
        })
    }
}

/// Local endpoint that accepts connections and never answers them.
/// Returns its base URL and the accept task.
pub async fn silent_upstream() -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent upstream");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{addr}"), handle)
}

/// Wait until no job is PENDING or PROCESSING
pub async fn wait_until_settled(queue: &JobQueue) {
    let mut rx = queue.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let counts = queue.counts();
            if counts.pending == 0 && counts.processing == 0 {
                return;
            }
            rx.changed().await.expect("queue dropped");
        }
    })
    .await
    .expect("queue did not settle within 5 seconds");
}

/// Upload start frames to a running server (E2E)
pub async fn upload_start_frames(
    client: &reqwest::Client,
    base_url: &str,
    image_paths: &[&Path],
) -> Result<UploadResponse, Box<dyn std::error::Error>> {
    let mut form = multipart::Form::new();
    for path in image_paths {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or("invalid file name")?
            .to_string();
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "image/png",
        };
        form = form.part("files", multipart::Part::bytes(bytes).file_name(filename).mime_str(mime)?);
    }

    let response = client
        .post(format!("{}/api/v1/jobs", base_url))
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Upload failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<UploadResponse>().await?)
}

/// Poll a job until it is completed or failed (with timeout)
pub async fn poll_job_status(
    client: &reqwest::Client,
    base_url: &str,
    job_id: &str,
    timeout_secs: u64,
) -> Result<JobView, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for attempt in 0..max_attempts {
        let response = client
            .get(format!("{}/api/v1/jobs/{}", base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let job = response.json::<JobView>().await?;
        if job.status.is_terminal() {
            return Ok(job);
        }
        if attempt % 10 == 0 && attempt > 0 {
            println!("  ... still waiting (attempt {}/{})", attempt, max_attempts);
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(format!("Job did not complete within {} seconds", timeout_secs).into())
}

/// Fetch the whole queue from a running server (E2E)
pub async fn list_jobs(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<JobListResponse, Box<dyn std::error::Error>> {
    let response = client
        .get(format!("{}/api/v1/jobs", base_url))
        .send()
        .await?;
    Ok(response.json::<JobListResponse>().await?)
}

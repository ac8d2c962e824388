use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::models::job::GenerationConfig;
use crate::services::generation::{FrameGenerator, GenerationError, GENERIC_FAILURE};
use crate::services::queue::JobQueue;

/// The single consumer that drives jobs through generation, one at a time.
pub struct Worker {
    queue: Arc<JobQueue>,
    generator: Arc<dyn FrameGenerator>,
    config: GenerationConfig,
}

impl Worker {
    pub fn new(
        queue: Arc<JobQueue>,
        generator: Arc<dyn FrameGenerator>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            queue,
            generator,
            config,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process until the queue is drained, then sleep until the next
    /// submission. Never returns.
    pub async fn run(self) {
        tracing::info!("Worker ready, waiting for jobs");
        loop {
            while self.process_next().await {}
            tracing::trace!("No pending jobs, sleeping");
            self.queue.wait_for_work().await;
        }
    }

    /// Process the next PENDING job.
    /// Returns false if nothing could be dispatched.
    pub async fn process_next(&self) -> bool {
        let Some(dispatch) = self.queue.dispatch() else {
            return false;
        };

        tracing::info!(
            job_id = %dispatch.job_id,
            file_name = %dispatch.source.file_name,
            "Processing end-frame job"
        );

        let start = Instant::now();
        let generator = Arc::clone(&self.generator);
        let config = self.config;
        let source = dispatch.source;
        // Own task so a panic inside the client fails the job instead of the worker
        let outcome = tokio::spawn(async move { generator.generate(&source, &config).await })
            .await
            .unwrap_or_else(|join_err| {
                tracing::error!(job_id = %dispatch.job_id, error = %join_err, "Generation task aborted");
                Err(GenerationError::Remote(GENERIC_FAILURE.to_string()))
            });
        let duration = start.elapsed();
        metrics::histogram!("end_frame_generation_seconds").record(duration.as_secs_f64());

        let outcome = match outcome {
            Ok(frame) => {
                tracing::info!(
                    job_id = %dispatch.job_id,
                    aspect_ratio = %frame.aspect_ratio,
                    duration_ms = duration.as_millis() as u64,
                    output_bytes = frame.bytes.len(),
                    "Job completed successfully"
                );
                metrics::counter!("end_frame_jobs_completed").increment(1);
                Ok(frame)
            }
            Err(e) => {
                tracing::error!(
                    job_id = %dispatch.job_id,
                    duration_ms = duration.as_millis() as u64,
                    error = %e,
                    "Job failed"
                );
                metrics::counter!("end_frame_jobs_failed").increment(1);
                Err(e.to_string())
            }
        };

        if let Err(e) = self.queue.finish(dispatch.job_id, outcome) {
            tracing::error!(job_id = %dispatch.job_id, error = %e, "Failed to record job outcome");
        }
        true
    }
}

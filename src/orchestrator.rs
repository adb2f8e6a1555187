use crate::formats::TargetFormat;
use crate::job::{FileJob, JobStatus, ResultHandle};
use crate::progress::{start_fake_progress, ProgressSettings};
use crate::state::{BatchObserver, BatchState};
use crate::transport::CompressionTransport;
use crate::upload::UploadFile;
use crate::utils::calculate_compression_ratio;
use std::sync::Arc;
use tokio::sync::watch;

/// Totals for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    /// Original bytes of the jobs that finished successfully
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

impl BatchSummary {
    pub fn from_jobs(jobs: &[FileJob]) -> Self {
        jobs.iter().fold(
            BatchSummary {
                total: jobs.len(),
                ..Default::default()
            },
            |mut summary, job| {
                match job.status() {
                    JobStatus::Done => {
                        summary.done += 1;
                        summary.original_bytes += job.original_size();
                        summary.compressed_bytes += job.compressed_size().unwrap_or(0);
                    }
                    JobStatus::Error => summary.failed += 1,
                    JobStatus::Pending | JobStatus::Uploading => {}
                }
                summary
            },
        )
    }

    /// Overall size reduction of the successful jobs, in percent.
    pub fn overall_ratio(&self) -> f64 {
        calculate_compression_ratio(self.original_bytes, self.compressed_bytes)
    }
}

/// Drives a batch of uploads through the compression endpoint, one file at
/// a time, in submission order.
///
/// `submit_batch` takes `&mut self`: one orchestrator runs at most one batch
/// at a time, which keeps it the only writer of its `BatchState`.
pub struct Orchestrator<T> {
    transport: T,
    state: Arc<BatchState>,
    settings: ProgressSettings,
}

impl<T: CompressionTransport> Orchestrator<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: Arc::new(BatchState::new()),
            settings: ProgressSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ProgressSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(self, observer: Arc<dyn BatchObserver>) -> Self {
        self.state.add_observer(observer);
        self
    }

    pub fn state(&self) -> &Arc<BatchState> {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<FileJob>> {
        self.state.subscribe()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replaces the current batch with the image entries of `files` and
    /// processes them sequentially.
    ///
    /// Entries whose declared content type is not `image/*` are dropped
    /// without a job. A failed file never stops the batch.
    pub async fn submit_batch(&mut self, files: Vec<UploadFile>, format: TargetFormat) -> BatchSummary {
        let submitted = files.len();
        let files: Vec<UploadFile> = files.into_iter().filter(UploadFile::is_image).collect();
        if files.len() < submitted {
            tracing::debug!(
                dropped = submitted - files.len(),
                "Ignoring entries that are not images"
            );
        }

        let jobs = files
            .iter()
            .map(|file| FileJob::new(file.name(), file.size()))
            .collect();
        self.state.replace(jobs);

        tracing::info!(files = files.len(), format = %format, "Starting batch");

        for (index, file) in files.iter().enumerate() {
            self.process_job(index, file, format).await;
        }

        let summary = BatchSummary::from_jobs(&self.state.snapshot());
        tracing::info!(
            done = summary.done,
            failed = summary.failed,
            "Batch finished"
        );
        summary
    }

    async fn process_job(&self, index: usize, file: &UploadFile, format: TargetFormat) {
        if let Err(e) = self.state.begin_upload(index, self.settings.initial) {
            tracing::error!(index, error = %e, "Job could not start");
            return;
        }

        let ticker = start_fake_progress(Arc::clone(&self.state), index, self.settings);
        let outcome = self.transport.compress(file, format).await;
        ticker.stop().await;

        let applied = match outcome {
            Ok(bytes) => {
                tracing::debug!(file = file.name(), compressed_size = bytes.len(), "Upload finished");
                self.state.complete(index, ResultHandle::new(bytes, format))
            }
            Err(e) => {
                tracing::warn!(file = file.name(), error = %e, "Compression request failed");
                self.state.fail(index)
            }
        };

        if let Err(e) = applied {
            tracing::error!(index, error = %e, "Job outcome could not be recorded");
        }
    }
}

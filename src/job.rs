use crate::constants::DOWNLOAD_PREFIX;
use crate::error::{CompressionError, Result};
use crate::formats::TargetFormat;
use crate::utils::reduction_percent;
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};

/// Lifecycle of one uploaded file: `Pending -> Uploading -> {Done, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Uploading,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Uploading)
                | (JobStatus::Uploading, JobStatus::Done)
                | (JobStatus::Uploading, JobStatus::Error)
        )
    }
}

/// Reference to the compressed bytes returned by the endpoint.
///
/// Cloning is cheap; all clones share one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    bytes: Bytes,
    format: TargetFormat,
}

impl ResultHandle {
    pub fn new(bytes: Bytes, format: TargetFormat) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> TargetFormat {
        self.format
    }

    /// `compressed-<index>.<ext>`, with the extension of the requested format
    pub fn download_name(&self, index: usize) -> String {
        format!("{}{}.{}", DOWNLOAD_PREFIX, index, self.format.extension())
    }

    /// Writes the bytes to `dir` under `download_name(index)`.
    pub fn save_to(&self, dir: &Path, index: usize) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .map_err(|_| CompressionError::DirectoryCreationFailed(dir.to_path_buf()))?;

        let path = dir.join(self.download_name(index));
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// One submitted image and its processing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    file_name: String,
    status: JobStatus,
    progress: u8,
    original_size: u64,
    compressed_size: Option<u64>,
    reduction_percent: Option<u32>,
    result: Option<ResultHandle>,
}

impl FileJob {
    pub fn new(file_name: impl Into<String>, original_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            status: JobStatus::Pending,
            progress: 0,
            original_size,
            compressed_size: None,
            reduction_percent: None,
            result: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn compressed_size(&self) -> Option<u64> {
        self.compressed_size
    }

    pub fn reduction_percent(&self) -> Option<u32> {
        self.reduction_percent
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        self.result.as_ref()
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CompressionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// `Pending -> Uploading`, with progress set to `initial`.
    pub fn begin_upload(&mut self, initial: u8) -> Result<()> {
        self.transition(JobStatus::Uploading)?;
        self.progress = initial.min(100);
        Ok(())
    }

    /// Bumps simulated progress by `step`, never past `cap` and never
    /// backwards. Only an uploading job moves; returns whether it did.
    pub fn advance_progress(&mut self, step: u8, cap: u8) -> bool {
        if self.status != JobStatus::Uploading {
            return false;
        }
        let next = self.progress.saturating_add(step).min(cap);
        if next <= self.progress {
            return false;
        }
        self.progress = next;
        true
    }

    /// `Uploading -> Done`: progress 100, sizes and result recorded.
    pub fn complete(&mut self, result: ResultHandle) -> Result<()> {
        self.transition(JobStatus::Done)?;
        let compressed_size = result.len() as u64;
        self.progress = 100;
        self.compressed_size = Some(compressed_size);
        self.reduction_percent = Some(reduction_percent(self.original_size, compressed_size));
        self.result = Some(result);
        Ok(())
    }

    /// `Uploading -> Error`: progress back to 0, nothing kept.
    pub fn fail(&mut self) -> Result<()> {
        self.transition(JobStatus::Error)?;
        self.progress = 0;
        self.compressed_size = None;
        self.reduction_percent = None;
        self.result = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn uploading(name: &str, size: u64) -> FileJob {
        let mut job = FileJob::new(name, size);
        job.begin_upload(10).unwrap();
        job
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = FileJob::new("cat.png", 2048);
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.progress(), 0);
        assert_eq!(job.original_size(), 2048);
        assert!(job.compressed_size().is_none());
        assert!(job.result().is_none());
    }

    #[test]
    fn test_allowed_transitions() {
        use JobStatus::*;
        assert!(Pending.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Done));
        assert!(Uploading.can_transition_to(Error));

        assert!(!Pending.can_transition_to(Done));
        assert!(!Pending.can_transition_to(Error));
        assert!(!Done.can_transition_to(Uploading));
        assert!(!Error.can_transition_to(Pending));
        assert!(!Done.can_transition_to(Error));
    }

    #[test]
    fn test_advance_progress_is_capped() {
        let mut job = uploading("a.jpg", 100);
        for _ in 0..20 {
            job.advance_progress(10, 90);
        }
        assert_eq!(job.progress(), 90);
        assert!(!job.advance_progress(10, 90));
    }

    #[test]
    fn test_advance_progress_ignored_unless_uploading() {
        let mut job = FileJob::new("a.jpg", 100);
        assert!(!job.advance_progress(10, 90));
        assert_eq!(job.progress(), 0);

        let mut job = uploading("a.jpg", 100);
        job.fail().unwrap();
        assert!(!job.advance_progress(10, 90));
        assert_eq!(job.progress(), 0);
    }

    #[test]
    fn test_complete_records_result() {
        let mut job = uploading("photo.jpg", 10_000);
        let handle = ResultHandle::new(Bytes::from(vec![0u8; 3_333]), TargetFormat::Jpeg);
        job.complete(handle.clone()).unwrap();

        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.progress(), 100);
        assert_eq!(job.compressed_size(), Some(3_333));
        assert_eq!(job.reduction_percent(), Some(33));
        assert_eq!(job.result(), Some(&handle));
    }

    #[test]
    fn test_fail_resets_progress() {
        let mut job = uploading("photo.jpg", 10_000);
        job.advance_progress(10, 90);
        job.fail().unwrap();

        assert_eq!(job.status(), JobStatus::Error);
        assert_eq!(job.progress(), 0);
        assert!(job.result().is_none());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = uploading("photo.jpg", 10);
        job.complete(ResultHandle::new(Bytes::from_static(b"x"), TargetFormat::Png))
            .unwrap();

        assert!(matches!(
            job.fail(),
            Err(CompressionError::InvalidTransition { .. })
        ));
        assert!(job.begin_upload(10).is_err());
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.progress(), 100);
    }

    #[test]
    fn test_download_name_follows_format() {
        let handle = ResultHandle::new(Bytes::new(), TargetFormat::WebP);
        assert_eq!(handle.download_name(0), "compressed-0.webp");

        let handle = ResultHandle::new(Bytes::new(), TargetFormat::Jpeg);
        assert_eq!(handle.download_name(3), "compressed-3.jpg");
    }

    #[test]
    fn test_save_to_writes_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        let handle = ResultHandle::new(Bytes::from_static(b"png bytes"), TargetFormat::Png);

        let path = handle.save_to(&out_dir, 1).unwrap();
        assert_eq!(path, out_dir.join("compressed-1.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"png bytes");
    }
}

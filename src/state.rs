use crate::error::{CompressionError, Result};
use crate::job::{FileJob, ResultHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::watch;

/// Receives every batch mutation as it happens.
///
/// Callbacks run while the batch lock is held, so they see updates in the
/// order they were applied. They must not call back into `BatchState`.
pub trait BatchObserver: Send + Sync {
    fn on_batch_replaced(&self, _jobs: &[FileJob]) {}

    fn on_job_updated(&self, index: usize, job: &FileJob);
}

/// Owner of the currently displayed batch.
///
/// Only the orchestrator (and the progress ticker it starts) writes to it;
/// readers take snapshots or subscribe to the watch channel.
pub struct BatchState {
    jobs: Mutex<Vec<FileJob>>,
    snapshots: watch::Sender<Vec<FileJob>>,
    observers: RwLock<Vec<Arc<dyn BatchObserver>>>,
}

impl Default for BatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchState {
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            jobs: Mutex::new(Vec::new()),
            snapshots,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn BatchObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<FileJob>> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> Vec<FileJob> {
        self.lock().clone()
    }

    pub fn job(&self, index: usize) -> Option<FileJob> {
        self.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Swaps in a new batch; the previous one is discarded, not appended to.
    pub fn replace(&self, new_jobs: Vec<FileJob>) {
        let mut jobs = self.lock();
        *jobs = new_jobs;
        self.snapshots.send_replace(jobs.clone());
        for observer in self.observers().iter() {
            observer.on_batch_replaced(&jobs);
        }
    }

    pub fn begin_upload(&self, index: usize, initial: u8) -> Result<()> {
        self.mutate(index, |job| job.begin_upload(initial).map(|_| true))
            .map(|_| ())
    }

    /// Returns whether the job's progress moved.
    pub fn advance_progress(&self, index: usize, step: u8, cap: u8) -> bool {
        self.mutate(index, |job| Ok(job.advance_progress(step, cap)))
            .unwrap_or(false)
    }

    pub fn complete(&self, index: usize, result: ResultHandle) -> Result<()> {
        self.mutate(index, |job| job.complete(result).map(|_| true))
            .map(|_| ())
    }

    pub fn fail(&self, index: usize) -> Result<()> {
        self.mutate(index, |job| job.fail().map(|_| true)).map(|_| ())
    }

    /// Applies `f` to one job and, if it reports a change, publishes the new
    /// state before releasing the lock.
    fn mutate<F>(&self, index: usize, f: F) -> Result<bool>
    where
        F: FnOnce(&mut FileJob) -> Result<bool>,
    {
        let mut jobs = self.lock();
        let job = jobs
            .get_mut(index)
            .ok_or(CompressionError::JobNotFound(index))?;

        if !f(job)? {
            return Ok(false);
        }

        let updated = job.clone();
        self.snapshots.send_replace(jobs.clone());
        for observer in self.observers().iter() {
            observer.on_job_updated(index, &updated);
        }
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FileJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> Vec<Arc<dyn BatchObserver>> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::TargetFormat;
    use crate::job::JobStatus;
    use bytes::Bytes;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(usize, JobStatus, u8)>>,
        replaced: Mutex<usize>,
    }

    impl BatchObserver for Recorder {
        fn on_batch_replaced(&self, _jobs: &[FileJob]) {
            *self.replaced.lock().unwrap() += 1;
        }

        fn on_job_updated(&self, index: usize, job: &FileJob) {
            self.events
                .lock()
                .unwrap()
                .push((index, job.status(), job.progress()));
        }
    }

    fn two_jobs() -> Vec<FileJob> {
        vec![FileJob::new("a.png", 10), FileJob::new("b.png", 20)]
    }

    #[test]
    fn test_replace_discards_previous_batch() {
        let state = BatchState::new();
        state.replace(two_jobs());
        assert_eq!(state.len(), 2);

        state.replace(vec![FileJob::new("c.png", 30)]);
        let jobs = state.snapshot();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].file_name(), "c.png");
    }

    #[test]
    fn test_every_mutation_reaches_observers() {
        let state = BatchState::new();
        let recorder = Arc::new(Recorder::default());
        state.add_observer(recorder.clone());

        state.replace(two_jobs());
        state.begin_upload(1, 10).unwrap();
        assert!(state.advance_progress(1, 10, 90));
        state
            .complete(1, ResultHandle::new(Bytes::from_static(b"abc"), TargetFormat::Png))
            .unwrap();

        assert_eq!(*recorder.replaced.lock().unwrap(), 1);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![
                (1, JobStatus::Uploading, 10),
                (1, JobStatus::Uploading, 20),
                (1, JobStatus::Done, 100),
            ]
        );
    }

    #[test]
    fn test_unchanged_progress_is_not_published() {
        let state = BatchState::new();
        let recorder = Arc::new(Recorder::default());
        state.add_observer(recorder.clone());
        state.replace(two_jobs());

        // pending jobs do not tick
        assert!(!state.advance_progress(0, 10, 90));
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscribers_see_latest_snapshot() {
        let state = BatchState::new();
        let receiver = state.subscribe();
        state.replace(two_jobs());
        state.begin_upload(0, 10).unwrap();
        state.fail(0).unwrap();

        let latest = receiver.borrow();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].status(), JobStatus::Error);
        assert_eq!(latest[0].progress(), 0);
    }

    #[test]
    fn test_out_of_range_index() {
        let state = BatchState::new();
        assert!(matches!(
            state.begin_upload(0, 10),
            Err(CompressionError::JobNotFound(0))
        ));
        assert!(!state.advance_progress(5, 10, 90));
    }

    #[test]
    fn test_invalid_transition_leaves_job_untouched() {
        let state = BatchState::new();
        state.replace(two_jobs());
        assert!(state.fail(0).is_err());
        assert_eq!(state.job(0).unwrap().status(), JobStatus::Pending);
    }
}

//! Terminal rendering of a batch: one progress bar per file, then a summary.

use crate::constants::PROGRESS_BAR_TEMPLATE;
use crate::job::{FileJob, JobStatus};
use crate::orchestrator::BatchSummary;
use crate::state::BatchObserver;
use crate::utils::format_file_size;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, PoisonError};

/// Draws per-file progress bars as the orchestrator publishes updates.
pub struct ProgressRenderer {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<Vec<ProgressBar>>,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(PROGRESS_BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Self {
            multi: MultiProgress::with_draw_target(target),
            style,
            bars: Mutex::new(Vec::new()),
        }
    }

    /// Current position of each bar, in batch order.
    pub fn positions(&self) -> Vec<u64> {
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ProgressBar::position)
            .collect()
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressRenderer {
    fn on_batch_replaced(&self, jobs: &[FileJob]) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        for bar in bars.drain(..) {
            self.multi.remove(&bar);
        }

        for job in jobs {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(self.style.clone());
            bar.set_prefix(job.file_name().to_string());
            bar.set_message("pending");
            bars.push(bar);
        }
    }

    fn on_job_updated(&self, index: usize, job: &FileJob) {
        let bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(bar) = bars.get(index) else {
            return;
        };

        bar.set_position(u64::from(job.progress()));
        match job.status() {
            JobStatus::Pending => bar.set_message("pending"),
            JobStatus::Uploading => bar.set_message("uploading"),
            JobStatus::Done => bar.finish_with_message(format!(
                "✅ {} -> {} ({}%)",
                format_file_size(job.original_size()),
                format_file_size(job.compressed_size().unwrap_or(0)),
                job.reduction_percent().unwrap_or(0)
            )),
            JobStatus::Error => bar.abandon_with_message("❌ Compression failed"),
        }
    }
}

/// Per-file result lines followed by batch totals.
pub fn print_summary(jobs: &[FileJob], summary: &BatchSummary) {
    println!("\n📊 Compression Summary:");
    for (index, job) in jobs.iter().enumerate() {
        match (job.status(), job.result()) {
            (JobStatus::Done, Some(result)) => {
                println!("  ✅ {}", job.file_name());
                println!("     Original:   {}", format_file_size(job.original_size()));
                println!("     Compressed: {}", format_file_size(result.len() as u64));
                println!("     Reduction:  {}%", job.reduction_percent().unwrap_or(0));
                println!("     Download:   {}", result.download_name(index));
            }
            (JobStatus::Error, _) => println!("  ❌ {}: Compression failed", job.file_name()),
            _ => println!("  ⏳ {}: not processed", job.file_name()),
        }
    }

    println!("  📁 Total files: {}", summary.total);
    println!("  ✅ Compressed: {}", summary.done);
    if summary.failed > 0 {
        println!("  ⚠️  Failed files: {}", summary.failed);
    }
    println!(
        "  📊 Total original size: {}",
        format_file_size(summary.original_bytes)
    );
    println!(
        "  📈 Total compressed size: {}",
        format_file_size(summary.compressed_bytes)
    );
    println!("  🎯 Overall compression ratio: {:.1}%", summary.overall_ratio());
}

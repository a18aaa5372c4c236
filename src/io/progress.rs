//! Batch and per-stage progress display

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

/// Receives pipeline progress notifications
///
/// Every method has a no-op default except [`ProgressReporter::stage`], so
/// a reporter only overrides what it displays.
pub trait ProgressReporter {
    /// An image of the batch is about to be processed
    fn start_image(&mut self, _index: usize, _path: &Path) {}

    /// Stage `stage_index` of `stage_count` has started
    fn stage(&mut self, stage_index: usize, stage_count: usize, label: &str);

    /// An image of the batch is done
    fn finish_image(&mut self, _index: usize) {}
}

/// Reporter that displays nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&mut self, _stage_index: usize, _stage_count: usize, _label: &str) {}
}

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] Images: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

/// Terminal progress for a batch of images
///
/// One bar counts finished images; a second bar follows the stages of the
/// image currently being processed.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    stage_bar: Option<ProgressBar>,
    image_count: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a manager with no bars yet
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            stage_bar: None,
            image_count: 0,
        }
    }

    /// Create the bars for a batch of `image_count` images
    ///
    /// The batch bar is only shown when there is more than one image.
    pub fn initialize(&mut self, image_count: usize) {
        self.image_count = image_count;

        if image_count > 1 {
            let batch_bar = ProgressBar::new(image_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        let stage_bar = ProgressBar::new(0);
        stage_bar.set_style(STAGE_STYLE.clone());
        self.stage_bar = Some(self.multi_progress.add(stage_bar));
    }

    /// Number of images the bars were set up for
    pub const fn image_count(&self) -> usize {
        self.image_count
    }

    /// Clear all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All images processed");
        }
        let _ = self.multi_progress.clear();
    }
}

impl ProgressReporter for ProgressManager {
    fn start_image(&mut self, _index: usize, path: &Path) {
        if let Some(ref bar) = self.stage_bar {
            let name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            bar.set_prefix(name);
            bar.set_position(0);
            bar.set_message(String::new());
        }
    }

    fn stage(&mut self, stage_index: usize, stage_count: usize, label: &str) {
        if let Some(ref bar) = self.stage_bar {
            bar.set_length(stage_count as u64);
            bar.set_position(stage_index as u64);
            bar.set_message(label.to_string());
        }
    }

    fn finish_image(&mut self, _index: usize) {
        if let Some(ref bar) = self.stage_bar {
            if let Some(length) = bar.length() {
                bar.set_position(length);
            }
            bar.set_message("done");
        }
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
    }
}

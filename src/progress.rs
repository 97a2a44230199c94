use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Progress tracker for a captured frame sequence being fed through the
/// pipeline
pub struct CaptureProgressTracker {
    progress_bar: ProgressBar,
    start_time: Instant,
    total_frames: u64,
    processed_frames: u64,
    dispatched_frames: u64,
}

impl CaptureProgressTracker {
    /// Creates a progress tracker for a sequence of known length
    pub fn new(total_frames: u64, operation_name: &str) -> Self {
        let progress_bar = ProgressBar::new(total_frames);

        // Set up the progress bar style with time and frame information
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) | {msg}")
            .unwrap()
            .progress_chars("#>-");

        progress_bar.set_style(style);
        progress_bar.set_message(format!("Processing {}", operation_name));

        Self {
            progress_bar,
            start_time: Instant::now(),
            total_frames,
            processed_frames: 0,
            dispatched_frames: 0,
        }
    }

    /// Updates the progress by one frame
    pub fn update_frame(&mut self, dispatched: bool) {
        self.processed_frames += 1;
        if dispatched {
            self.dispatched_frames += 1;
        }
        self.progress_bar.inc(1);
        self.progress_bar.set_message(self.progress_message());
    }

    /// Gets comprehensive progress message
    fn progress_message(&self) -> String {
        if self.processed_frames == 0 {
            return "Starting...".to_string();
        }

        let elapsed = self.start_time.elapsed();
        let current_fps = self.processed_frames as f64 / elapsed.as_secs_f64();
        let remaining_frames = self.total_frames - self.processed_frames;
        let eta = if current_fps > 0.0 {
            format_duration(remaining_frames as f64 / current_fps)
        } else {
            "Calculating...".to_string()
        };

        format!(
            "{} dispatched | Speed: {:.1} fps | ETA: {}",
            self.dispatched_frames, current_fps, eta
        )
    }

    /// Finishes the progress bar
    pub fn finish(&self) {
        let total_time = self.start_time.elapsed();
        let avg_fps = self.processed_frames as f64 / total_time.as_secs_f64();

        self.progress_bar.finish_with_message(format!(
            "Completed! Frames: {} | Dispatched: {} | Processing: {} | Avg FPS: {:.1}",
            self.processed_frames,
            self.dispatched_frames,
            format_duration(total_time.as_secs_f64()),
            avg_fps
        ));
    }

    /// Gets the total number of frames
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Gets the current number of processed frames
    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    /// Gets the number of frames handed to the recognizer
    pub fn dispatched_frames(&self) -> u64 {
        self.dispatched_frames
    }
}

/// Formats a duration in seconds to h:mm:ss format
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

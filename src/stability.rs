use crate::config::StabilityConfig;
use crate::registration::{Translation, TranslationEstimator};
use image::GrayImage;
use log::{debug, warn};
use std::collections::VecDeque;

/// Bounded FIFO history of translation samples
pub struct TranslationHistory {
    samples: VecDeque<Translation>,
    capacity: usize,
}

impl TranslationHistory {
    /// Creates an empty history holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest one at capacity
    pub fn record(&mut self, sample: Translation) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean translation over the window; zero when empty
    pub fn mean(&self) -> Translation {
        if self.samples.is_empty() {
            return Translation::default();
        }
        let n = self.samples.len() as f32;
        let mut mean = Translation::default();
        for sample in &self.samples {
            mean.dx += sample.dx;
            mean.dy += sample.dy;
        }
        mean.dx /= n;
        mean.dy /= n;
        mean
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Decides per frame whether recent motion has settled enough to trust the
/// scene for downstream recognition.
///
/// Holds the only mutable state in the stability path (the previous frame
/// and the sample window); a single logical owner must drive `observe`,
/// there is no internal locking.
pub struct StabilityDetector {
    estimator: Box<dyn TranslationEstimator>,
    history: TranslationHistory,
    previous_frame: Option<GrayImage>,
    threshold: f32,
}

impl StabilityDetector {
    /// Creates a detector with the given estimator and tuning
    pub fn new(estimator: Box<dyn TranslationEstimator>, config: StabilityConfig) -> Self {
        Self {
            estimator,
            history: TranslationHistory::new(config.window),
            previous_frame: None,
            threshold: config.threshold,
        }
    }

    /// Consumes one luma frame and reports whether the scene is stable.
    ///
    /// The reference frame always advances, even when registration fails,
    /// so the next pair is never compared against a stale frame. A failed
    /// registration degrades to "not stable" for that one frame.
    pub fn observe(&mut self, frame: &GrayImage) -> bool {
        let Some(previous) = self.previous_frame.replace(frame.clone()) else {
            self.history.clear();
            return false;
        };

        match self.estimator.estimate(&previous, frame) {
            Err(err) => {
                warn!("failed to register frame pair for stabilizer: {err}");
                false
            }
            Ok(sample) => {
                self.history.record(sample);
                self.stability_achieved()
            }
        }
    }

    /// Forgets the reference frame and the sample window
    pub fn reset(&mut self) {
        self.previous_frame = None;
        self.history.clear();
    }

    pub fn history(&self) -> &TranslationHistory {
        &self.history
    }

    /// Stable only on a full window whose mean translation is below the
    /// threshold
    fn stability_achieved(&self) -> bool {
        if !self.history.is_full() {
            return false;
        }
        let distance = self.history.mean().manhattan();
        debug!("stability distance: {distance}");
        distance < self.threshold
    }
}

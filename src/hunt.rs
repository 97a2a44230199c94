use crate::config::{
    DEFAULT_MAX_OBSERVATIONS, DEFAULT_MINIMUM_CONFIDENCE, DEFAULT_QUADRATURE_TOLERANCE,
};
use crate::deskew::{deskew_rectangle, DetectedQuadrilateral};
use crate::error::Result;
use image::RgbImage;
use log::error;

/// Caller-supplied constraints forwarded to the rectangle detector
#[derive(Debug, Clone, Copy)]
pub struct DetectionConstraints {
    /// Smallest accepted width/height ratio of a candidate
    pub min_aspect_ratio: f32,
    /// Largest accepted width/height ratio of a candidate
    pub max_aspect_ratio: f32,
    /// Smallest accepted candidate size as a fraction of the image
    pub minimum_size: f32,
}

impl Default for DetectionConstraints {
    fn default() -> Self {
        // spine-shaped: much taller than wide, filling a decent part of
        // the frame
        Self {
            min_aspect_ratio: 0.05,
            max_aspect_ratio: 1.0,
            minimum_size: 0.2,
        }
    }
}

/// Fixed internal tuning of the hunt
#[derive(Debug, Clone, Copy)]
pub struct HuntConfig {
    /// Largest number of candidates deskewed per call
    pub max_observations: usize,
    /// Allowed deviation from 90 degrees in candidate corners
    pub quadrature_tolerance: f32,
    /// Candidates below this confidence are discarded
    pub minimum_confidence: f32,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            max_observations: DEFAULT_MAX_OBSERVATIONS,
            quadrature_tolerance: DEFAULT_QUADRATURE_TOLERANCE,
            minimum_confidence: DEFAULT_MINIMUM_CONFIDENCE,
        }
    }
}

/// External capability producing rectangle candidates for an image
pub trait RectangleDetector: Send + Sync {
    /// Detects up to `config.max_observations` quadrilateral candidates in
    /// `image`, honoring the aspect-ratio and size constraints
    fn detect(
        &self,
        image: &RgbImage,
        constraints: &DetectionConstraints,
        config: &HuntConfig,
    ) -> Result<Vec<DetectedQuadrilateral>>;
}

/// Finds rectangle candidates in `search` and returns their deskewed crops.
///
/// When `source` is provided, the crops are taken from it instead of from
/// `search`: detection can run on a depth map while the corresponding
/// region is cropped out of the color image. Candidates are rescaled when
/// the two images differ in size.
///
/// A detector error is logged and produces an empty list, as does a
/// detection pass whose candidates are all filtered out.
pub fn hunt_rectangles(
    detector: &dyn RectangleDetector,
    search: &RgbImage,
    source: Option<&RgbImage>,
    constraints: &DetectionConstraints,
    config: &HuntConfig,
) -> Vec<RgbImage> {
    let candidates = match detector.detect(search, constraints, config) {
        Ok(candidates) => candidates,
        Err(err) => {
            error!("could not perform rectangle detection: {err}");
            return Vec::new();
        }
    };

    let target = source.unwrap_or(search);
    let sx = target.width() as f32 / search.width() as f32;
    let sy = target.height() as f32 / search.height() as f32;

    candidates
        .into_iter()
        .filter(|candidate| candidate.confidence >= config.minimum_confidence)
        .take(config.max_observations)
        .map(|candidate| deskew_rectangle(target, &candidate.scaled(sx, sy)))
        .collect()
}

use crate::error::Result;
use image::imageops;
use image::{GrayImage, ImageBuffer, Pixel, RgbImage};
use log::debug;
use std::str::FromStr;

/// Similarity score below which a frame pair is always treated as a cut
const HARD_CUT_SCORE: f64 = 0.08;

/// Exif-style orientation tag describing how a captured buffer must be
/// transformed before display or recognition.
///
/// Mirrored variants apply a horizontal flip after the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    /// Rotate 90 degrees counter-clockwise
    Left,
    LeftMirrored,
    /// Rotate 90 degrees clockwise
    Right,
    RightMirrored,
}

impl Orientation {
    /// Applies the orientation transform to a pixel buffer.
    ///
    /// Color and depth planes of one capture must go through the same
    /// orientation so that pixel correspondence between them is preserved,
    /// which is why this is generic over the pixel type.
    pub fn apply<P>(self, image: &ImageBuffer<P, Vec<P::Subpixel>>) -> ImageBuffer<P, Vec<P::Subpixel>>
    where
        P: Pixel + 'static,
        P::Subpixel: 'static,
    {
        match self {
            Orientation::Up => image.clone(),
            Orientation::UpMirrored => imageops::flip_horizontal(image),
            Orientation::Down => imageops::rotate180(image),
            Orientation::DownMirrored => imageops::flip_vertical(image),
            Orientation::Left => imageops::rotate270(image),
            Orientation::LeftMirrored => imageops::flip_horizontal(&imageops::rotate270(image)),
            Orientation::Right => imageops::rotate90(image),
            Orientation::RightMirrored => imageops::flip_horizontal(&imageops::rotate90(image)),
        }
    }
}

impl FromStr for Orientation {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Orientation::Up),
            "up-mirrored" => Ok(Orientation::UpMirrored),
            "down" => Ok(Orientation::Down),
            "down-mirrored" => Ok(Orientation::DownMirrored),
            "left" => Ok(Orientation::Left),
            "left-mirrored" => Ok(Orientation::LeftMirrored),
            "right" => Ok(Orientation::Right),
            "right-mirrored" => Ok(Orientation::RightMirrored),
            other => Err(crate::error::Error::InvalidInput(format!(
                "unknown orientation: {other}"
            ))),
        }
    }
}

/// Extracts the luma plane used for frame registration
pub fn luma_plane(image: &RgbImage) -> GrayImage {
    imageops::grayscale(image)
}

/// Stateful scene-cut detector that maintains the previous frame and its
/// similarity score to avoid false positives
pub struct SceneCutDetector {
    previous_image: Option<RgbImage>,
    pub previous_score: Option<f64>,
    similarity_threshold: f64,
    previous_similarity_threshold: f64,
}

impl SceneCutDetector {
    /// Creates a new cut detector with configurable thresholds
    ///
    /// # Arguments
    /// * `similarity_threshold` - The threshold below which a cut is detected (default: 0.15)
    /// * `previous_similarity_threshold` - The threshold above which the previous score must be to consider a cut (default: 0.7)
    pub fn new(similarity_threshold: f64, previous_similarity_threshold: f64) -> Self {
        Self {
            previous_image: None,
            previous_score: None,
            similarity_threshold,
            previous_similarity_threshold,
        }
    }

    /// Compares `image` against the previously observed frame and reports
    /// whether a hard scene cut happened between them.
    ///
    /// The first observed frame always counts as a cut, since there is
    /// nothing to compare against.
    pub fn observe(&mut self, image: &RgbImage) -> Result<bool> {
        let Some(previous) = self.previous_image.replace(image.clone()) else {
            return Ok(true);
        };

        let similarity = image_compare::rgb_hybrid_compare(&previous, image)?;
        let current_score = similarity.score;

        debug!("similarity: {current_score:?}");

        // Only consider it a cut if the current score is low AND the previous
        // score was high; a floor score is a cut unconditionally
        let is_cut = match self.previous_score {
            Some(prev_score) => {
                current_score < HARD_CUT_SCORE
                    || (current_score < self.similarity_threshold
                        && prev_score > self.previous_similarity_threshold)
            }
            None => current_score < HARD_CUT_SCORE || current_score < self.similarity_threshold,
        };

        self.previous_score = Some(current_score);

        Ok(is_cut)
    }
}

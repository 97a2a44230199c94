use crate::config::DEFAULT_MAX_SHIFT;
use crate::error::{Error, Result};
use image::GrayImage;
use ndarray::Array1;

/// Profiles whose value spread is below this cannot be registered
const FLAT_PROFILE_SPREAD: f32 = 1e-3;

/// Estimated 2D translation between two consecutive frames.
///
/// Positive `dx` means the scene content moved right, positive `dy` down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Translation {
    pub dx: f32,
    pub dy: f32,
}

impl Translation {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Sum of the absolute components, the distance measure used for
    /// stability scoring
    pub fn manhattan(&self) -> f32 {
        self.dx.abs() + self.dy.abs()
    }
}

/// Registers two sequential luma frames and reports the shift between them
pub trait TranslationEstimator: Send {
    /// Estimates the translation that maps `previous` onto `current`.
    ///
    /// Fails when the pair cannot be registered; callers treat that as a
    /// recoverable per-frame condition, not a fatal error.
    fn estimate(&self, previous: &GrayImage, current: &GrayImage) -> Result<Translation>;
}

/// Translation estimator matching mean-intensity projection profiles.
///
/// Each frame is collapsed into a per-column and a per-row mean intensity
/// profile; the integer shift minimizing the mean absolute difference
/// between the two frames' profiles wins, independently per axis. This is
/// deliberately coarse: the stability gate only needs the magnitude of
/// recent motion, not subpixel registration.
pub struct ProfileShiftEstimator {
    max_shift: u32,
}

impl ProfileShiftEstimator {
    /// Creates an estimator searching shifts in `[-max_shift, max_shift]`
    pub fn new(max_shift: u32) -> Self {
        Self { max_shift }
    }

    fn column_profile(image: &GrayImage) -> Array1<f32> {
        let (width, height) = image.dimensions();
        let mut profile = Array1::<f32>::zeros(width as usize);
        for (x, _, pixel) in image.enumerate_pixels() {
            profile[x as usize] += pixel[0] as f32;
        }
        profile /= height as f32;
        profile
    }

    fn row_profile(image: &GrayImage) -> Array1<f32> {
        let (width, height) = image.dimensions();
        let mut profile = Array1::<f32>::zeros(height as usize);
        for (_, y, pixel) in image.enumerate_pixels() {
            profile[y as usize] += pixel[0] as f32;
        }
        profile /= width as f32;
        profile
    }

    fn spread(profile: &Array1<f32>) -> f32 {
        let lo = profile.fold(f32::MAX, |a, &b| a.min(b));
        let hi = profile.fold(f32::MIN, |a, &b| a.max(b));
        hi - lo
    }

    /// Shift of `current` relative to `previous` minimizing the mean
    /// absolute profile difference over the overlap
    fn best_shift(previous: &Array1<f32>, current: &Array1<f32>, max_shift: i64) -> i64 {
        let len = previous.len() as i64;
        let mut best_score = f32::MAX;
        let mut best_shift = 0i64;
        for shift in -max_shift..=max_shift {
            let lo = shift.max(0);
            let hi = len + shift.min(0);
            let mut acc = 0.0f32;
            for x in lo..hi {
                acc += (current[x as usize] - previous[(x - shift) as usize]).abs();
            }
            let score = acc / (hi - lo) as f32;
            if score < best_score {
                best_score = score;
                best_shift = shift;
            }
        }
        best_shift
    }
}

impl Default for ProfileShiftEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SHIFT)
    }
}

impl TranslationEstimator for ProfileShiftEstimator {
    fn estimate(&self, previous: &GrayImage, current: &GrayImage) -> Result<Translation> {
        let (width, height) = previous.dimensions();
        if (width, height) != current.dimensions() {
            return Err(Error::Registration(format!(
                "frame sizes differ: {width}x{height} vs {}x{}",
                current.width(),
                current.height()
            )));
        }

        // keep at least half of each profile overlapping at the extremes
        let max_shift = self.max_shift.min(width / 4).min(height / 4) as i64;
        if max_shift == 0 {
            return Err(Error::Registration(format!(
                "frame too small to register: {width}x{height}"
            )));
        }

        let previous_columns = Self::column_profile(previous);
        let previous_rows = Self::row_profile(previous);
        if Self::spread(&previous_columns) < FLAT_PROFILE_SPREAD
            || Self::spread(&previous_rows) < FLAT_PROFILE_SPREAD
        {
            return Err(Error::Registration(String::from(
                "featureless frame, registration is ambiguous",
            )));
        }

        let dx = Self::best_shift(&previous_columns, &Self::column_profile(current), max_shift);
        let dy = Self::best_shift(&previous_rows, &Self::row_profile(current), max_shift);
        Ok(Translation::new(dx as f32, dy as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{imageops, Luma};

    /// Busy pseudo-random texture so profile matches are unambiguous
    fn textured_base(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 7 + y * 13 + x * y) % 251) as u8])
        })
    }

    #[test]
    fn test_identical_frames_register_at_zero() {
        let base = textured_base(160, 120);
        let estimator = ProfileShiftEstimator::default();
        let translation = estimator.estimate(&base, &base).unwrap();
        assert_eq!(translation, Translation::new(0.0, 0.0));
    }

    #[test]
    fn test_recovers_known_shift() {
        let base = textured_base(320, 240);
        let previous = imageops::crop_imm(&base, 16, 16, 200, 150).to_image();
        // the window moved right/down over the scene, so the content
        // appears to have moved left/up
        let current = imageops::crop_imm(&base, 21, 19, 200, 150).to_image();
        let estimator = ProfileShiftEstimator::default();
        let translation = estimator.estimate(&previous, &current).unwrap();
        assert_eq!(translation, Translation::new(-5.0, -3.0));
    }

    #[test]
    fn test_rejects_mismatched_sizes() {
        let a = textured_base(100, 100);
        let b = textured_base(120, 100);
        let estimator = ProfileShiftEstimator::default();
        assert!(estimator.estimate(&a, &b).is_err());
    }

    #[test]
    fn test_rejects_featureless_frames() {
        let flat = GrayImage::from_pixel(100, 100, Luma([128]));
        let estimator = ProfileShiftEstimator::default();
        assert!(estimator.estimate(&flat, &flat).is_err());
    }

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(Translation::new(-3.0, 4.0).manhattan(), 7.0);
    }
}

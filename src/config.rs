use crate::cli::Args;
use crate::error::Result;
use crate::image::Orientation;

/// Number of translation samples kept in the stability window
pub const DEFAULT_STABILITY_WINDOW: usize = 15;

/// Upper bound on |mean dx| + |mean dy| for a window to count as stable, in pixel units
pub const DEFAULT_STABILITY_THRESHOLD: f32 = 20.0;

/// Margin stripped from each side of an image before a perspective crop
pub const DEFAULT_DESKEW_INSET: f32 = 25.0;

/// Largest number of rectangle candidates deskewed per hunt
pub const DEFAULT_MAX_OBSERVATIONS: usize = 3;

/// Allowed deviation from 90 degrees in detected rectangle corners
pub const DEFAULT_QUADRATURE_TOLERANCE: f32 = 10.0;

/// Candidates below this confidence are discarded by the hunt
pub const DEFAULT_MINIMUM_CONFIDENCE: f32 = 0.2;

/// Similarity score below which a frame pair may count as a scene cut
pub const DEFAULT_CUT_SIMILARITY: f64 = 0.15;

/// Similarity score the previous pair must exceed for a cut to register
pub const DEFAULT_CUT_START: f64 = 0.7;

/// Largest per-axis shift the profile translation estimator searches
pub const DEFAULT_MAX_SHIFT: u32 = 32;

/// Tuning for the stability detector
#[derive(Debug, Clone, Copy)]
pub struct StabilityConfig {
    /// Sliding window length; stability is only declared on a full window
    pub window: usize,
    /// Threshold on the manhattan length of the window's mean translation
    pub threshold: f32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_STABILITY_WINDOW,
            threshold: DEFAULT_STABILITY_THRESHOLD,
        }
    }
}

/// Tuning for a frame pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stability: StabilityConfig,
    /// Orientation applied identically to color and depth before packaging
    pub orientation: Orientation,
    /// Reset the stability history when a hard scene cut is detected
    pub reset_on_scene_cut: bool,
    pub cut_similarity: f64,
    pub cut_start: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stability: StabilityConfig::default(),
            orientation: Orientation::Up,
            reset_on_scene_cut: true,
            cut_similarity: DEFAULT_CUT_SIMILARITY,
            cut_start: DEFAULT_CUT_START,
        }
    }
}

/// Builds a pipeline configuration from command line arguments
pub fn build_pipeline_config(args: &Args) -> Result<PipelineConfig> {
    Ok(PipelineConfig {
        stability: StabilityConfig {
            window: args.stability_window,
            threshold: args.stability_threshold,
        },
        orientation: args.orientation.parse()?,
        reset_on_scene_cut: !args.no_cut_reset,
        cut_similarity: args.cut_similarity,
        cut_start: args.cut_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_args() -> Args {
        Args {
            source: String::from("./frames"),
            output_filepath: String::new(),
            stability_threshold: 20.0,
            stability_window: 15,
            sweet_spot_width: 0.8,
            sweet_spot_height: 0.8,
            orientation: String::from("right"),
            cut_similarity: 0.15,
            cut_start: 0.7,
            no_cut_reset: false,
        }
    }

    #[test]
    fn test_build_pipeline_config() {
        let config = build_pipeline_config(&default_args()).unwrap();
        assert_eq!(config.stability.window, 15);
        assert_eq!(config.orientation, Orientation::Right);
        assert!(config.reset_on_scene_cut);
    }

    #[test]
    fn test_rejects_unknown_orientation() {
        let mut args = default_args();
        args.orientation = String::from("sideways");
        assert!(build_pipeline_config(&args).is_err());
    }
}

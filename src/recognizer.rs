use crate::depth::DepthCorrelatedFrame;
use crate::quad::{Extent, Point};

/// Fractional (width, height) of the central frame region worth scanning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweetSpot {
    pub width: f32,
    pub height: f32,
}

impl SweetSpot {
    pub const FULL_FRAME: SweetSpot = SweetSpot {
        width: 1.0,
        height: 1.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The centered unit-space rectangle covering the sweet spot
    pub fn rect(&self) -> (Point, Extent) {
        let a = 1.0 - self.width;
        let b = 1.0 - self.height;
        (
            Point::new(a / 2.0, b / 2.0),
            Extent::new(self.width, self.height),
        )
    }
}

/// External consumer of stabilized frames
pub trait Recognizer: Send + Sync {
    /// Performs whatever image processing this recognizer wants on a
    /// stabilized, sweet-spot-clipped frame
    fn scan_image(&self, frame: DepthCorrelatedFrame);

    /// Consulted before dispatch so a busy recognizer is not flooded
    fn is_busy(&self) -> bool;

    /// The fraction of the frame worth scanning; the pipeline clips each
    /// frame to it before dispatch
    fn sweet_spot_size(&self) -> SweetSpot;
}

/// A `Recognizer` which does nothing
pub struct NullRecognizer;

impl Recognizer for NullRecognizer {
    fn scan_image(&self, _frame: DepthCorrelatedFrame) {}

    fn is_busy(&self) -> bool {
        false
    }

    fn sweet_spot_size(&self) -> SweetSpot {
        SweetSpot::FULL_FRAME
    }
}

use crate::quad::{Corner, Point, Quadrilateral};
use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use log::warn;

/// A candidate quadrilateral reported by the external detector, in pixel
/// coordinates of the searched image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedQuadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
}

impl DetectedQuadrilateral {
    /// Reassigns corner labels so that the left-edge corner with the
    /// smaller vertical coordinate is the top left.
    ///
    /// Detectors may report corners in bottom-up vertical order depending
    /// on sensor orientation; feeding such a candidate to the perspective
    /// transform unchanged yields a vertically flipped crop.
    pub fn normalized_vertical_order(self) -> Self {
        if self.top_left.y <= self.bottom_left.y {
            self
        } else {
            Self {
                top_left: self.bottom_left,
                top_right: self.bottom_right,
                bottom_left: self.top_left,
                bottom_right: self.top_right,
                confidence: self.confidence,
            }
        }
    }

    /// Rescales the corners into the pixel space of a differently sized
    /// image
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        let scale = |p: Point| Point::new(p.x * sx, p.y * sy);
        Self {
            top_left: scale(self.top_left),
            top_right: scale(self.top_right),
            bottom_left: scale(self.bottom_left),
            bottom_right: scale(self.bottom_right),
            confidence: self.confidence,
        }
    }

    /// Output rectangle implied by the quadrilateral's edge lengths
    fn output_extent(&self) -> (u32, u32) {
        let top = distance(self.top_left, self.top_right);
        let bottom = distance(self.bottom_left, self.bottom_right);
        let left = distance(self.top_left, self.bottom_left);
        let right = distance(self.top_right, self.bottom_right);
        let width = top.max(bottom).round().max(1.0) as u32;
        let height = left.max(right).round().max(1.0) as u32;
        (width, height)
    }
}

fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Maps the interior of a detected quadrilateral onto an axis-aligned
/// rectangle sized by its edge lengths.
///
/// A degenerate candidate (collinear corners) cannot define a perspective
/// transform; it produces an empty black crop rather than an error.
pub fn deskew_rectangle(image: &RgbImage, candidate: &DetectedQuadrilateral) -> RgbImage {
    let quad = candidate.normalized_vertical_order();
    let (out_width, out_height) = quad.output_extent();
    let mut output = RgbImage::new(out_width, out_height);

    let src = [
        (quad.top_left.x, quad.top_left.y),
        (quad.top_right.x, quad.top_right.y),
        (quad.bottom_right.x, quad.bottom_right.y),
        (quad.bottom_left.x, quad.bottom_left.y),
    ];
    let dst = [
        (0.0, 0.0),
        (out_width as f32, 0.0),
        (out_width as f32, out_height as f32),
        (0.0, out_height as f32),
    ];

    let Some(projection) = Projection::from_control_points(src, dst) else {
        warn!("degenerate rectangle candidate, returning empty crop");
        return output;
    };
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut output,
    );
    output
}

impl Quadrilateral {
    /// Perspective-corrects the quadrilateral interior onto the inset image
    /// rectangle.
    ///
    /// The unit corners address an inner rectangle `inset` pixels in from
    /// every side, and the output matches that inner extent. The image is
    /// mirrored vertically first: capture rows arrive bottom-up relative to
    /// the coordinate space the corners were edited in, and the mirror
    /// restores the correspondence. A degenerate corner configuration
    /// yields a black output of the same extent, never a panic.
    pub fn crop(&self, image: &RgbImage, inset: f32) -> RgbImage {
        let (width, height) = image.dimensions();
        let inner_width = (width as f32 - 2.0 * inset).max(1.0);
        let inner_height = (height as f32 - 2.0 * inset).max(1.0);

        let mut output = RgbImage::new(inner_width as u32, inner_height as u32);

        let src_corner = |corner: Corner| {
            let unit = self.unit_corner(corner);
            (unit.x * inner_width + inset, unit.y * inner_height + inset)
        };
        let src = [
            src_corner(Corner::TopLeft),
            src_corner(Corner::TopRight),
            src_corner(Corner::BottomRight),
            src_corner(Corner::BottomLeft),
        ];
        let dst = [
            (0.0, 0.0),
            (inner_width, 0.0),
            (inner_width, inner_height),
            (0.0, inner_height),
        ];

        let Some(projection) = Projection::from_control_points(src, dst) else {
            warn!("degenerate quadrilateral, returning empty crop");
            return output;
        };

        let mirrored = imageops::flip_vertical(image);
        warp_into(
            &mirrored,
            &projection,
            Interpolation::Bilinear,
            Rgb([0, 0, 0]),
            &mut output,
        );
        output
    }
}

use crate::error::{Error, Result};
use image::{imageops, ImageBuffer, Luma, RgbImage};
use ndarray::{s, ArrayView2};

/// Depth plane as a 32-bit float image, in meters
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Pixel format of a raw depth buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFormat {
    /// 32-bit IEEE float meters
    Float32,
    /// 16-bit unsigned millimeters
    Millimeters16,
}

impl DepthFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            DepthFormat::Float32 => 4,
            DepthFormat::Millimeters16 => 2,
        }
    }
}

/// Raw sensor depth: pixel-format metadata plus the packed byte payload.
///
/// The payload is little-endian, rows may carry trailing padding up to
/// `bytes_per_row`. Metadata is validated against the payload once, at
/// construction; a mismatch is malformed upstream data the pipeline cannot
/// continue with, so it surfaces as a hard [`Error::DepthConversion`].
#[derive(Debug, Clone, PartialEq)]
pub struct DepthData {
    format: DepthFormat,
    width: u32,
    height: u32,
    bytes_per_row: usize,
    data: Vec<u8>,
}

impl DepthData {
    /// Creates a validated raw depth buffer
    ///
    /// # Arguments
    /// * `format` - Pixel format of the payload
    /// * `width`, `height` - Buffer dimensions in pixels
    /// * `bytes_per_row` - Row stride in bytes, at least `width * bytes_per_pixel`
    /// * `data` - The packed payload, at least `bytes_per_row * height` bytes
    pub fn new(
        format: DepthFormat,
        width: u32,
        height: u32,
        bytes_per_row: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::DepthConversion(format!(
                "empty depth buffer: {width}x{height}"
            )));
        }
        let row_bytes = width as usize * format.bytes_per_pixel();
        if bytes_per_row < row_bytes {
            return Err(Error::DepthConversion(format!(
                "row stride {bytes_per_row} cannot hold {width} pixels"
            )));
        }
        let required = bytes_per_row * (height as usize - 1) + row_bytes;
        if data.len() < required {
            return Err(Error::DepthConversion(format!(
                "payload holds {} bytes, {required} required",
                data.len()
            )));
        }
        Ok(Self {
            format,
            width,
            height,
            bytes_per_row,
            data,
        })
    }

    /// Packs a depth image into a float32 buffer with tight rows
    pub fn from_depth_image(image: &DepthImage) -> Self {
        let (width, height) = image.dimensions();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for value in image.as_raw() {
            data.extend_from_slice(&value.to_le_bytes());
        }
        Self {
            format: DepthFormat::Float32,
            width,
            height,
            bytes_per_row: width as usize * 4,
            data,
        }
    }

    /// Decodes the payload into 32-bit float meters
    pub fn to_depth_image(&self) -> DepthImage {
        let width = self.width as usize;
        let bpp = self.format.bytes_per_pixel();
        let mut pixels = Vec::with_capacity(width * self.height as usize);
        for row in 0..self.height as usize {
            let base = row * self.bytes_per_row;
            for col in 0..width {
                let at = base + col * bpp;
                let value = match self.format {
                    DepthFormat::Float32 => {
                        f32::from_le_bytes(self.data[at..at + 4].try_into().expect("validated stride"))
                    }
                    DepthFormat::Millimeters16 => {
                        u16::from_le_bytes(self.data[at..at + 2].try_into().expect("validated stride"))
                            as f32
                            / 1000.0
                    }
                };
                pixels.push(value);
            }
        }
        DepthImage::from_raw(self.width, self.height, pixels).expect("pixel count matches dimensions")
    }

    pub fn format(&self) -> DepthFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// The authoritative depth source of a frame
enum DepthSource {
    Raw(DepthData),
    Image(DepthImage),
    Absent,
}

/// A color image paired with at most one authoritative depth representation.
///
/// There is no single representation that serves every consumer: the sensor
/// delivers raw metadata-tagged buffers, while geometric consumers want a
/// float image. This object stores whichever arrived and derives the other
/// on demand. It is immutable after construction, so concurrent readers
/// need no locking; the derivations are pure functions of the stored
/// fields.
pub struct DepthCorrelatedFrame {
    color: RgbImage,
    source: DepthSource,
}

impl DepthCorrelatedFrame {
    /// A frame with no depth information
    pub fn new(color: RgbImage) -> Self {
        Self {
            color,
            source: DepthSource::Absent,
        }
    }

    /// A frame whose authoritative depth is the raw sensor buffer
    pub fn with_raw_depth(color: RgbImage, depth: DepthData) -> Self {
        Self {
            color,
            source: DepthSource::Raw(depth),
        }
    }

    /// A frame whose authoritative depth is a derived depth image
    pub fn with_depth_image(color: RgbImage, depth: DepthImage) -> Self {
        Self {
            color,
            source: DepthSource::Image(depth),
        }
    }

    pub fn color(&self) -> &RgbImage {
        &self.color
    }

    pub fn has_depth(&self) -> bool {
        !matches!(self.source, DepthSource::Absent)
    }

    /// Raw depth data, verbatim when it was supplied at construction.
    ///
    /// When the frame was built from a depth image the raw buffer is
    /// synthesized on every call and NOT cached here; a caller that needs
    /// it repeatedly should hold on to the result.
    pub fn depth(&self) -> Option<DepthData> {
        match &self.source {
            DepthSource::Raw(depth) => Some(depth.clone()),
            DepthSource::Image(image) => Some(DepthData::from_depth_image(image)),
            DepthSource::Absent => None,
        }
    }

    /// Depth as a float image, verbatim when one was supplied at
    /// construction, otherwise converted from the raw buffer
    pub fn depth_image(&self) -> Option<DepthImage> {
        match &self.source {
            DepthSource::Image(image) => Some(image.clone()),
            DepthSource::Raw(depth) => Some(depth.to_depth_image()),
            DepthSource::Absent => None,
        }
    }

    /// Crops color and depth to the centered fractional window, preserving
    /// pixel correspondence between the two planes.
    ///
    /// The depth plane of the result is re-sourced as a derived image.
    pub fn clipped(&self, width_fraction: f32, height_fraction: f32) -> DepthCorrelatedFrame {
        let wf = width_fraction.clamp(0.0, 1.0);
        let hf = height_fraction.clamp(0.0, 1.0);
        if wf >= 1.0 && hf >= 1.0 {
            return DepthCorrelatedFrame {
                color: self.color.clone(),
                source: match &self.source {
                    DepthSource::Raw(depth) => DepthSource::Raw(depth.clone()),
                    DepthSource::Image(image) => DepthSource::Image(image.clone()),
                    DepthSource::Absent => DepthSource::Absent,
                },
            };
        }

        let color = centered_crop(&self.color, wf, hf);
        match self.depth_image() {
            Some(depth) => {
                let depth = centered_crop(&depth, wf, hf);
                DepthCorrelatedFrame::with_depth_image(color, depth)
            }
            None => DepthCorrelatedFrame::new(color),
        }
    }
}

/// Crops the centered fractional window out of an image
fn centered_crop<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    width_fraction: f32,
    height_fraction: f32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: image::Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    let crop_width = ((width as f32 * width_fraction) as u32).max(1).min(width);
    let crop_height = ((height as f32 * height_fraction) as u32).max(1).min(height);
    let x = (width - crop_width) / 2;
    let y = (height - crop_height) / 2;
    imageops::crop_imm(image, x, y, crop_width, crop_height).to_image()
}

/// Minimum and maximum depth within a window centered on the image.
///
/// Used on a depth plane to gauge how sharply the subject (a spine held
/// close to the sensor) separates from the background before trusting a
/// depth-driven detection.
pub fn pixel_range(depth: &DepthImage, window_width: u32, window_height: u32) -> (f32, f32) {
    let (width, height) = depth.dimensions();
    if width == 0 || height == 0 {
        return (f32::MAX, f32::MIN);
    }
    let ww = window_width.clamp(1, width) as usize;
    let wh = window_height.clamp(1, height) as usize;
    let x0 = (width as usize - ww) / 2;
    let y0 = (height as usize - wh) / 2;

    let view = ArrayView2::from_shape((height as usize, width as usize), depth.as_raw())
        .expect("buffer matches dimensions");
    let window = view.slice(s![y0..y0 + wh, x0..x0 + ww]);
    window.fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient_depth(width: u32, height: u32) -> DepthImage {
        DepthImage::from_fn(width, height, |x, y| Luma([(x + y * width) as f32 / 100.0]))
    }

    fn any_color(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_raw_depth_round_trips_through_image() {
        let depth = gradient_depth(8, 6);
        let raw = DepthData::from_depth_image(&depth);
        let frame = DepthCorrelatedFrame::with_raw_depth(any_color(8, 6), raw.clone());

        let derived = frame.depth_image().unwrap();
        let back = DepthData::from_depth_image(&derived);

        assert_eq!(back.format(), raw.format());
        assert_eq!(back.width(), raw.width());
        assert_eq!(back.height(), raw.height());
        assert_eq!(back.bytes_per_row(), raw.bytes_per_row());
        assert_eq!(back.data(), raw.data());
    }

    #[test]
    fn test_raw_depth_returned_verbatim() {
        let depth = gradient_depth(4, 4);
        let raw = DepthData::from_depth_image(&depth);
        let frame = DepthCorrelatedFrame::with_raw_depth(any_color(4, 4), raw.clone());
        assert_eq!(frame.depth().unwrap(), raw);
    }

    #[test]
    fn test_synthesized_raw_depth_is_not_cached() {
        let frame =
            DepthCorrelatedFrame::with_depth_image(any_color(4, 4), gradient_depth(4, 4));
        let first = frame.depth().unwrap();
        let second = frame.depth().unwrap();
        // equal payloads from independent conversions
        assert_eq!(first, second);
        assert_ne!(first.data().as_ptr(), second.data().as_ptr());
    }

    #[test]
    fn test_absent_depth() {
        let frame = DepthCorrelatedFrame::new(any_color(4, 4));
        assert!(!frame.has_depth());
        assert!(frame.depth().is_none());
        assert!(frame.depth_image().is_none());
    }

    #[test]
    fn test_millimeter_payload_decodes_to_meters() {
        let mut data = Vec::new();
        for mm in [500u16, 1000, 1500, 2000] {
            data.extend_from_slice(&mm.to_le_bytes());
        }
        let raw = DepthData::new(DepthFormat::Millimeters16, 2, 2, 4, data).unwrap();
        let image = raw.to_depth_image();
        assert_eq!(image.get_pixel(0, 0)[0], 0.5);
        assert_eq!(image.get_pixel(1, 1)[0], 2.0);
    }

    #[test]
    fn test_padded_rows_are_respected() {
        // two pixels per row, stride padded to 12 bytes
        let mut data = vec![0u8; 12 * 2];
        for (i, value) in [1.0f32, 2.0, 3.0, 4.0].iter().enumerate() {
            let at = (i / 2) * 12 + (i % 2) * 4;
            data[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
        let raw = DepthData::new(DepthFormat::Float32, 2, 2, 12, data).unwrap();
        let image = raw.to_depth_image();
        assert_eq!(image.get_pixel(1, 0)[0], 2.0);
        assert_eq!(image.get_pixel(0, 1)[0], 3.0);
    }

    #[test]
    fn test_rejects_malformed_metadata() {
        assert!(DepthData::new(DepthFormat::Float32, 4, 4, 8, vec![0; 64]).is_err());
        assert!(DepthData::new(DepthFormat::Float32, 4, 4, 16, vec![0; 16]).is_err());
        assert!(DepthData::new(DepthFormat::Float32, 0, 4, 16, vec![]).is_err());
    }

    #[test]
    fn test_clipping_preserves_color_depth_correspondence() {
        let color = RgbImage::from_fn(10, 10, |x, y| Rgb([x as u8, y as u8, 0]));
        let depth = gradient_depth(10, 10);
        let frame = DepthCorrelatedFrame::with_depth_image(color, depth);

        let clipped = frame.clipped(0.5, 0.5);
        assert_eq!(clipped.color().dimensions(), (5, 5));
        let clipped_depth = clipped.depth_image().unwrap();
        assert_eq!(clipped_depth.dimensions(), (5, 5));
        // both planes start at the same source pixel (2, 2)
        assert_eq!(clipped.color().get_pixel(0, 0)[0], 2);
        assert_eq!(clipped_depth.get_pixel(0, 0)[0], (2 + 2 * 10) as f32 / 100.0);
    }

    #[test]
    fn test_pixel_range_over_centered_window() {
        let depth = gradient_depth(10, 10);
        let (lo, hi) = pixel_range(&depth, 2, 2);
        // window covers x in 4..6, y in 4..6
        assert_eq!(lo, (4 + 4 * 10) as f32 / 100.0);
        assert_eq!(hi, (5 + 5 * 10) as f32 / 100.0);
    }
}

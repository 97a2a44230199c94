use crate::config::PipelineConfig;
use crate::depth::{DepthCorrelatedFrame, DepthData, DepthImage};
use crate::image::{luma_plane, Orientation, SceneCutDetector};
use crate::recognizer::Recognizer;
use crate::registration::TranslationEstimator;
use crate::stability::StabilityDetector;
use image::RgbImage;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Depth payload delivered alongside a color frame
pub enum DepthInput {
    Raw(DepthData),
    Image(DepthImage),
}

/// A captured frame as delivered by the camera layer
pub enum CameraFrame {
    /// Color-only capture
    Plain(RgbImage),
    /// Capture with synchronized depth
    DepthAugmented(RgbImage, DepthInput),
}

impl CameraFrame {
    pub fn color(&self) -> &RgbImage {
        match self {
            CameraFrame::Plain(color) => color,
            CameraFrame::DepthAugmented(color, _) => color,
        }
    }

    /// Packages the frame for the recognizer, applying `orientation`
    /// identically to the color and depth planes so that pixel
    /// correspondence between them is preserved.
    ///
    /// Raw depth stays the authoritative source only when no reorientation
    /// is needed; otherwise the oriented derived image takes over.
    fn into_depth_correlated(self, orientation: Orientation) -> DepthCorrelatedFrame {
        match self {
            CameraFrame::Plain(color) => DepthCorrelatedFrame::new(orientation.apply(&color)),
            CameraFrame::DepthAugmented(color, depth) => {
                let color = orientation.apply(&color);
                match depth {
                    DepthInput::Raw(raw) if orientation == Orientation::Up => {
                        DepthCorrelatedFrame::with_raw_depth(color, raw)
                    }
                    DepthInput::Raw(raw) => DepthCorrelatedFrame::with_depth_image(
                        color,
                        orientation.apply(&raw.to_depth_image()),
                    ),
                    DepthInput::Image(image) => {
                        DepthCorrelatedFrame::with_depth_image(color, orientation.apply(&image))
                    }
                }
            }
        }
    }
}

/// What the pipeline decided to do with one arriving frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Admission is paused; the frame was discarded
    Paused,
    /// The scene is not motion-stable yet; the frame only contributed
    /// stability evidence
    NotStable,
    /// The previous dispatch is still in flight; the frame was dropped in
    /// favor of a fresher one later
    Dropped,
    /// The recognizer reported busy; the frame was dropped
    RecognizerBusy,
    /// The frame was packaged and handed to the recognizer
    Dispatched,
}

/// Orchestrates the per-frame path: admission, scene-cut reset, stability
/// gating, depth-correlated packaging and background dispatch to the
/// recognizer.
///
/// One instance expects a single logical frame-delivery path calling
/// [`FramePipeline::process_frame`]; stability state is owned exclusively
/// here and is not locked. At most one frame is in flight to the
/// recognizer: later frames arriving during a dispatch are dropped, not
/// queued, trading completeness for freshness. The delivery thread never
/// blocks on recognizer work; that runs on the supplied runtime handle.
pub struct FramePipeline {
    recognizer: Arc<dyn Recognizer>,
    stabilizer: StabilityDetector,
    cut_detector: Option<SceneCutDetector>,
    orientation: Orientation,
    paused: bool,
    in_flight: Arc<AtomicBool>,
    handle: Handle,
    last_dispatch: Option<JoinHandle<()>>,
}

impl FramePipeline {
    /// Creates a pipeline dispatching to `recognizer` on `handle`.
    ///
    /// The runtime handle is the one piece of execution context the
    /// pipeline needs; it is passed in explicitly and threaded through
    /// rather than grabbed from a global.
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        estimator: Box<dyn TranslationEstimator>,
        config: &PipelineConfig,
        handle: Handle,
    ) -> Self {
        let cut_detector = config
            .reset_on_scene_cut
            .then(|| SceneCutDetector::new(config.cut_similarity, config.cut_start));
        Self {
            recognizer,
            stabilizer: StabilityDetector::new(estimator, config.stability),
            cut_detector,
            orientation: config.orientation,
            paused: false,
            in_flight: Arc::new(AtomicBool::new(false)),
            handle,
            last_dispatch: None,
        }
    }

    /// Admits one captured frame and reports what happened to it.
    ///
    /// Stability evidence is collected for every admitted frame in arrival
    /// order, even while a previous frame is still being scanned; only the
    /// dispatch itself is guarded.
    pub fn process_frame(&mut self, frame: CameraFrame) -> FrameDisposition {
        if self.paused {
            return FrameDisposition::Paused;
        }

        if let Some(cut_detector) = self.cut_detector.as_mut() {
            match cut_detector.observe(frame.color()) {
                Ok(true) => {
                    debug!("scene cut, resetting stability history");
                    self.stabilizer.reset();
                }
                Ok(false) => {}
                Err(err) => warn!("scene-cut comparison failed: {err}"),
            }
        }

        let luma = luma_plane(frame.color());
        if !self.stabilizer.observe(&luma) {
            return FrameDisposition::NotStable;
        }

        if self.in_flight.load(Ordering::Acquire) {
            return FrameDisposition::Dropped;
        }
        if self.recognizer.is_busy() {
            return FrameDisposition::RecognizerBusy;
        }

        self.in_flight.store(true, Ordering::Release);
        let packaged = frame.into_depth_correlated(self.orientation);
        let recognizer = Arc::clone(&self.recognizer);
        let in_flight = Arc::clone(&self.in_flight);
        self.last_dispatch = Some(self.handle.spawn_blocking(move || {
            let sweet_spot = recognizer.sweet_spot_size();
            let clipped = packaged.clipped(sweet_spot.width, sweet_spot.height);
            recognizer.scan_image(clipped);
            in_flight.store(false, Ordering::Release);
        }));
        FrameDisposition::Dispatched
    }

    /// Stops admitting new frames. Work already dispatched is not
    /// cancelled.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Re-opens frame admission
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when no dispatched frame is still being scanned
    pub fn is_idle(&self) -> bool {
        !self.in_flight.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until the in-flight dispatch, if any,
    /// finishes. Must not be called from inside the runtime.
    pub fn wait_idle(&mut self) {
        if let Some(dispatch) = self.last_dispatch.take() {
            if let Err(err) = self.handle.block_on(dispatch) {
                warn!("recognizer dispatch failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StabilityConfig;
    use crate::error::Result;
    use crate::recognizer::SweetSpot;
    use crate::registration::Translation;
    use image::{GrayImage, Rgb};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Estimator reporting zero motion for every pair
    struct SteadyEstimator;

    impl TranslationEstimator for SteadyEstimator {
        fn estimate(&self, _previous: &GrayImage, _current: &GrayImage) -> Result<Translation> {
            Ok(Translation::default())
        }
    }

    /// Recognizer recording the dimensions of every scanned frame
    struct RecordingRecognizer {
        scans: Mutex<Vec<(u32, u32)>>,
        sweet_spot: SweetSpot,
        scan_delay: Duration,
    }

    impl RecordingRecognizer {
        fn new(sweet_spot: SweetSpot, scan_delay: Duration) -> Self {
            Self {
                scans: Mutex::new(Vec::new()),
                sweet_spot,
                scan_delay,
            }
        }
    }

    impl Recognizer for RecordingRecognizer {
        fn scan_image(&self, frame: DepthCorrelatedFrame) {
            std::thread::sleep(self.scan_delay);
            self.scans.lock().unwrap().push(frame.color().dimensions());
        }

        fn is_busy(&self) -> bool {
            false
        }

        fn sweet_spot_size(&self) -> SweetSpot {
            self.sweet_spot
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            stability: StabilityConfig {
                window: 3,
                threshold: 20.0,
            },
            reset_on_scene_cut: false,
            ..PipelineConfig::default()
        }
    }

    fn frame() -> CameraFrame {
        CameraFrame::Plain(RgbImage::from_pixel(40, 40, Rgb([9, 9, 9])))
    }

    fn pipeline_with(
        recognizer: Arc<RecordingRecognizer>,
        runtime: &tokio::runtime::Runtime,
    ) -> FramePipeline {
        FramePipeline::new(
            recognizer,
            Box::new(SteadyEstimator),
            &test_config(),
            runtime.handle().clone(),
        )
    }

    #[test]
    fn test_dispatches_once_stable() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let recognizer = Arc::new(RecordingRecognizer::new(
            SweetSpot::FULL_FRAME,
            Duration::ZERO,
        ));
        let mut pipeline = pipeline_with(Arc::clone(&recognizer), &runtime);

        // reference frame + 3-sample window
        for _ in 0..3 {
            assert_eq!(pipeline.process_frame(frame()), FrameDisposition::NotStable);
        }
        assert_eq!(pipeline.process_frame(frame()), FrameDisposition::Dispatched);
        pipeline.wait_idle();
        assert_eq!(recognizer.scans.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_frames_are_dropped_while_dispatch_in_flight() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let recognizer = Arc::new(RecordingRecognizer::new(
            SweetSpot::FULL_FRAME,
            Duration::from_millis(300),
        ));
        let mut pipeline = pipeline_with(Arc::clone(&recognizer), &runtime);

        for _ in 0..3 {
            pipeline.process_frame(frame());
        }
        assert_eq!(pipeline.process_frame(frame()), FrameDisposition::Dispatched);
        // the scan is still sleeping; a fresh stable frame must be dropped
        assert_eq!(pipeline.process_frame(frame()), FrameDisposition::Dropped);

        pipeline.wait_idle();
        assert!(pipeline.is_idle());
        assert_eq!(recognizer.scans.lock().unwrap().len(), 1);

        // once idle, the next stable frame dispatches again
        assert_eq!(pipeline.process_frame(frame()), FrameDisposition::Dispatched);
        pipeline.wait_idle();
        assert_eq!(recognizer.scans.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_pause_gates_admission() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let recognizer = Arc::new(RecordingRecognizer::new(
            SweetSpot::FULL_FRAME,
            Duration::ZERO,
        ));
        let mut pipeline = pipeline_with(Arc::clone(&recognizer), &runtime);

        pipeline.pause();
        assert!(pipeline.is_paused());
        assert_eq!(pipeline.process_frame(frame()), FrameDisposition::Paused);

        pipeline.resume();
        assert_eq!(pipeline.process_frame(frame()), FrameDisposition::NotStable);
    }

    #[test]
    fn test_dispatched_frame_is_clipped_to_sweet_spot() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let recognizer = Arc::new(RecordingRecognizer::new(
            SweetSpot::new(0.5, 0.5),
            Duration::ZERO,
        ));
        let mut pipeline = pipeline_with(Arc::clone(&recognizer), &runtime);

        for _ in 0..3 {
            pipeline.process_frame(frame());
        }
        pipeline.process_frame(frame());
        pipeline.wait_idle();
        assert_eq!(recognizer.scans.lock().unwrap()[0], (20, 20));
    }

    #[test]
    fn test_depth_plane_follows_color_orientation() {
        let color = RgbImage::from_fn(4, 2, |x, _| Rgb([x as u8, 0, 0]));
        let depth = DepthImage::from_fn(4, 2, |x, _| image::Luma([x as f32]));
        let captured = CameraFrame::DepthAugmented(color, DepthInput::Image(depth));

        let packaged = captured.into_depth_correlated(Orientation::Right);
        assert_eq!(packaged.color().dimensions(), (2, 4));
        let depth = packaged.depth_image().unwrap();
        assert_eq!(depth.dimensions(), (2, 4));
        // source pixel (0, 1) lands at (0, 0) in both planes after the
        // clockwise rotation, and (3, 0) lands at (1, 3)
        assert_eq!(
            packaged.color().get_pixel(0, 0)[0] as f32,
            depth.get_pixel(0, 0)[0]
        );
        assert_eq!(packaged.color().get_pixel(1, 3)[0], 3);
        assert_eq!(depth.get_pixel(1, 3)[0], 3.0);
    }

    #[test]
    fn test_raw_depth_survives_upright_packaging() {
        let depth_image = DepthImage::from_fn(4, 4, |x, y| image::Luma([(x + y) as f32]));
        let raw = DepthData::from_depth_image(&depth_image);
        let captured = CameraFrame::DepthAugmented(
            RgbImage::new(4, 4),
            DepthInput::Raw(raw.clone()),
        );

        let packaged = captured.into_depth_correlated(Orientation::Up);
        assert_eq!(packaged.depth().unwrap(), raw);
    }
}

use anyhow::Result;
use chrono::Local;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use steadycrop::cli::Args;
use steadycrop::config::build_pipeline_config;
use steadycrop::depth::{pixel_range, DepthCorrelatedFrame};
use steadycrop::pipeline::{CameraFrame, FrameDisposition, FramePipeline};
use steadycrop::progress::CaptureProgressTracker;
use steadycrop::recognizer::{Recognizer, SweetSpot};
use steadycrop::registration::ProfileShiftEstimator;

/// Recognizer that saves each stabilized frame it is handed into the run
/// directory, standing in for the real downstream consumer
struct CaptureRecognizer {
    output_dir: PathBuf,
    sweet_spot: SweetSpot,
    captures: AtomicUsize,
    busy: AtomicBool,
}

impl CaptureRecognizer {
    fn new(output_dir: PathBuf, sweet_spot: SweetSpot) -> Self {
        Self {
            output_dir,
            sweet_spot,
            captures: AtomicUsize::new(0),
            busy: AtomicBool::new(false),
        }
    }

    fn captures(&self) -> usize {
        self.captures.load(Ordering::Acquire)
    }
}

impl Recognizer for CaptureRecognizer {
    fn scan_image(&self, frame: DepthCorrelatedFrame) {
        self.busy.store(true, Ordering::Release);
        let n = self.captures.fetch_add(1, Ordering::AcqRel) + 1;
        let path = self.output_dir.join(format!("capture_{n:04}.png"));
        if let Err(err) = frame.color().save(&path) {
            error!("could not save capture to {}: {err}", path.display());
        } else {
            info!("captured stable frame to {}", path.display());
        }
        if let Some(depth) = frame.depth_image() {
            let (width, height) = depth.dimensions();
            let (near, far) = pixel_range(&depth, width / 2, height / 2);
            info!("depth range over sweet spot: {near:.3}m to {far:.3}m");
        }
        self.busy.store(false, Ordering::Release);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn sweet_spot_size(&self) -> SweetSpot {
        self.sweet_spot
    }
}

/// Creates a timestamped output directory and returns its path
fn create_output_dir() -> Result<String> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_dir = format!("./runs/{}", timestamp);
    fs::create_dir_all(&output_dir)?;
    Ok(output_dir)
}

/// Collects the frame files to process, sorted by name
fn collect_frame_paths(source: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(source);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut frames: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("png") | Some("jpg") | Some("jpeg")
            )
        })
        .collect();
    frames.sort();
    Ok(frames)
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    // Create timestamped output directory
    let output_dir = create_output_dir()?;
    println!("Created output directory: {}", output_dir);

    let pipeline_config = build_pipeline_config(&args)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let recognizer = Arc::new(CaptureRecognizer::new(
        PathBuf::from(&output_dir),
        SweetSpot::new(args.sweet_spot_width, args.sweet_spot_height),
    ));
    let mut pipeline = FramePipeline::new(
        Arc::clone(&recognizer) as Arc<dyn Recognizer>,
        Box::new(ProfileShiftEstimator::default()),
        &pipeline_config,
        runtime.handle().clone(),
    );

    let frames = collect_frame_paths(&args.source)?;
    if frames.is_empty() {
        println!("No frames found in {}", args.source);
        return Ok(());
    }

    let mut progress = CaptureProgressTracker::new(frames.len() as u64, "frame sequence");
    for path in &frames {
        let color = image::open(path)?.to_rgb8();
        let disposition = pipeline.process_frame(CameraFrame::Plain(color));
        progress.update_frame(disposition == FrameDisposition::Dispatched);
    }
    pipeline.wait_idle();
    progress.finish();

    println!("Captured {} stable frames", recognizer.captures());

    // Move the run directory to output_filepath if specified
    if !args.output_filepath.is_empty() {
        println!("Moving captures to: {}", args.output_filepath);
        fs::rename(&output_dir, &args.output_filepath)?;
        println!("Captures moved successfully to: {}", args.output_filepath);
    }

    Ok(())
}

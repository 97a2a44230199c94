use argh::FromArgs;

/// Stability-gated capture pipeline
#[derive(FromArgs, Debug)]
pub struct Args {
    /// source: image file or directory of sequential frames
    #[argh(option, default = "String::from(\"./frames\")")]
    pub source: String,

    /// move the run directory here when processing finishes
    #[argh(option, default = "String::new()")]
    pub output_filepath: String,

    /// stability threshold in pixel units
    #[argh(option, default = "20.0")]
    pub stability_threshold: f32,

    /// stability window length in frames
    #[argh(option, default = "15")]
    pub stability_window: usize,

    /// fractional sweet spot width
    #[argh(option, default = "0.8")]
    pub sweet_spot_width: f32,

    /// fractional sweet spot height
    #[argh(option, default = "0.8")]
    pub sweet_spot_height: f32,

    /// exif-style orientation applied to incoming frames
    #[argh(option, default = "String::from(\"up\")")]
    pub orientation: String,

    /// similarity score below which a scene cut is suspected
    #[argh(option, default = "0.15")]
    pub cut_similarity: f64,

    /// similarity score the previous pair must exceed for a cut
    #[argh(option, default = "0.7")]
    pub cut_start: f64,

    /// disable the scene-cut stability reset
    #[argh(switch)]
    pub no_cut_reset: bool,
}

//! Run the synthetic RHEED camera through the processor and report the
//! oscillation frequencies it finds.

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use rheed_core::camera::{open_camera, CameraConfig, SyntheticCamera};
use rheed_core::pipeline::{CsvFrameSink, RheedProcessor};
use rheed_core::regions::{BoundingBox, ChannelSelection, LineSegment, RegionId, Shape};
use rheed_core::AnalysisConfig;

#[derive(Debug, Parser)]
#[command(about = "Simulate a RHEED acquisition and detect growth oscillations")]
struct Args {
    /// Number of frames to acquire
    #[arg(short = 'n', long, default_value_t = 900)]
    frames: usize,

    /// Virtual camera frame rate (Hz)
    #[arg(short = 'r', long, default_value_t = 30.0)]
    frame_rate: f64,

    /// Specular oscillation frequency (Hz)
    #[arg(short, long, default_value_t = 0.5)]
    growth_frequency: f64,

    /// Frame width in pixels
    #[arg(long, default_value_t = 320)]
    width: usize,

    /// Frame height in pixels
    #[arg(long, default_value_t = 240)]
    height: usize,

    /// JSON analysis configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write one CSV row per frame to this file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    // Finite offline run: analyze every frame
    config.pipeline.block_when_full = true;

    let camera_config = CameraConfig {
        width: args.width,
        height: args.height,
        frame_rate: args.frame_rate,
        growth_frequency: args.growth_frequency,
        frame_limit: Some(args.frames),
        ..CameraConfig::default()
    };
    let source = open_camera("synthetic", &camera_config)?;

    let mut processor = RheedProcessor::new(config);
    let (spot_x, spot_y) = SyntheticCamera::spot_center(args.width, args.height);
    let half = (args.width.min(args.height) / 20).max(1) as i64;
    let specular = RegionId::from("specular");
    processor.add_region(
        specular.clone(),
        Shape::Rectangle(BoundingBox::new(
            spot_x as i64 - half,
            spot_y as i64 - half,
            2 * half,
            2 * half,
        )),
        ChannelSelection::Mean,
    )?;
    let streaks = RegionId::from("streaks");
    processor.add_region(
        streaks.clone(),
        Shape::Line(LineSegment::new(
            0.0,
            spot_y,
            (args.width - 1) as f64,
            spot_y,
        )),
        ChannelSelection::Mean,
    )?;

    if let Some(path) = &args.csv {
        processor.set_sink(Box::new(CsvFrameSink::create(path)?));
        info!("Writing frame records to {}", path.display());
    }

    processor.start(source)?;
    processor.wait();

    let stats = processor.stats();
    println!(
        "Processed {} of {} frames ({} dropped, {:.1} fps acquisition)",
        stats.frames_processed, stats.frames_acquired, stats.frames_dropped, stats.frame_rate
    );

    match processor.spectrum(&specular) {
        Some(analysis) => match &analysis.peaks {
            Some(peaks) if !peaks.is_empty() => {
                for frequency in &peaks.frequencies {
                    println!("Region '{}': oscillation at {:.4} Hz", specular, frequency);
                }
            }
            Some(_) => println!("Region '{}': no oscillation above the noise floor", specular),
            None => warn!("Peak detection could not run for '{}'", specular),
        },
        None => warn!("No spectrum available for '{}'", specular),
    }

    if let Some(image) = processor.line_scan(&streaks) {
        let (positions, columns) = image.dim();
        println!(
            "Region '{}': line scan of {} positions x {} frames",
            streaks, positions, columns
        );
    }

    Ok(())
}

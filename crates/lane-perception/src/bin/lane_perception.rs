//! lane-perception CLI: lateral offset and heading for still road frames.

use clap::Parser;
use lane_perception::detect::{binary_to_gray_image, detect_lanes_with_debug, render_debug_view};
use lane_perception::detector::{FrameReport, LaneDetectConfig, LaneDetectReport};
use lane_perception::{LaneDetector, LaneStatus};
use std::fs;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "lane-perception")]
#[command(about = "Estimate lane offset and heading from road images")]
#[command(version)]
struct Cli {
    /// Input images (appended to the config's `image_paths`).
    images: Vec<PathBuf>,

    /// JSON config with image paths, output locations and detector params.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report path (overrides the config).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for bird's-eye edge maps (overrides the config).
    #[arg(long)]
    warped_dir: Option<PathBuf>,

    /// Directory for colorized search diagnostics.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Log level or per-module directives, e.g. `warn,lane_perception_detector=debug`.
    /// `RUST_LOG` overrides it.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_logs: bool,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut cfg = match &cli.config {
        Some(path) => LaneDetectConfig::load_json(path)?,
        None => LaneDetectConfig::default(),
    };
    cfg.image_paths
        .extend(cli.images.iter().map(|p| p.to_string_lossy().into_owned()));
    if cfg.image_paths.is_empty() {
        return Err("no input images; pass paths or --config".into());
    }

    let output = cli.output.clone().unwrap_or_else(|| cfg.output_path());
    let warped_dir = cli
        .warped_dir
        .clone()
        .or_else(|| cfg.warped_dir.as_ref().map(PathBuf::from));
    for dir in [&warped_dir, &cli.debug_dir].into_iter().flatten() {
        fs::create_dir_all(dir)?;
    }

    let detector = cfg.build_detector()?;
    let mut report = LaneDetectReport::new(detector.params().clone(), cli.config.as_deref());

    for path in &cfg.image_paths {
        let frame = run_frame(
            &detector,
            Path::new(path),
            warped_dir.as_deref(),
            cli.debug_dir.as_deref(),
        );
        match (&frame.error, frame.status) {
            (Some(err), _) => println!("{path}: error: {err}"),
            (None, Some(status)) => println!(
                "{path}: offset={:.3} m heading={:.2} deg {}",
                frame.offset_m.unwrap_or(0.0),
                frame.heading_deg.unwrap_or(0.0),
                status_label(status)
            ),
            (None, None) => {}
        }
        report.frames.push(frame);
    }

    report.write_json(&output)?;
    log::info!(
        "wrote {} ({} of {} frames detected)",
        output.display(),
        report.detected_count(),
        report.frames.len()
    );
    Ok(())
}

fn run_frame(
    detector: &LaneDetector,
    path: &Path,
    warped_dir: Option<&Path>,
    debug_dir: Option<&Path>,
) -> FrameReport {
    let mut frame = FrameReport::new(path.to_string_lossy());
    if let Err(err) = process_frame(detector, path, warped_dir, debug_dir, &mut frame) {
        log::warn!("{}: {err}", path.display());
        frame.set_error(err);
    }
    frame
}

fn process_frame(
    detector: &LaneDetector,
    path: &Path,
    warped_dir: Option<&Path>,
    debug_dir: Option<&Path>,
    frame: &mut FrameReport,
) -> CliResult<()> {
    let img = image::ImageReader::open(path)?.decode()?.to_rgb8();
    let debug = detect_lanes_with_debug(detector, &img)?;
    frame.set_detection(&debug.estimate);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());

    if let Some(dir) = warped_dir {
        let out = dir.join(format!("{stem}_warped.png"));
        binary_to_gray_image(&debug.estimate.warped)
            .ok_or("warped map buffer does not match its size")?
            .save(&out)?;
        frame.warped_path = Some(out.to_string_lossy().into_owned());
    }
    if let Some(dir) = debug_dir {
        let out = dir.join(format!("{stem}_debug.png"));
        render_debug_view(&debug, &detector.params().window).save(&out)?;
    }
    Ok(())
}

fn status_label(status: LaneStatus) -> &'static str {
    match status {
        LaneStatus::Detected => "detected",
        LaneStatus::InsufficientFitData {
            left_missing: true,
            right_missing: true,
        } => "no lane",
        LaneStatus::InsufficientFitData {
            left_missing: true,
            ..
        } => "left boundary missing",
        LaneStatus::InsufficientFitData { .. } => "right boundary missing",
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    let spec = lane_perception::core::LogSpec::from_env_or(&cli.log_level);
    let _ = lane_perception::core::init_with_spec(spec);
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    let _ = tracing_log::LogTracer::init();
    lane_perception::core::init_tracing(&cli.log_level, cli.json_logs);
}

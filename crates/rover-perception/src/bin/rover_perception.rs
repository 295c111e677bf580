//! Run one perception step on a camera frame from disk.
//!
//! ```text
//! rover-perception frame.png --x 99.7 --y 85.6 --heading 56.8 \
//!     --map map.json --vision vision.png --map-image map.png --report report.json
//!
//! rover-perception --run-config run.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use rover_perception::frame::{self, FrameError};
use rover_perception::map::io::{PerceptionConfig, PerceptionIoError, PerceptionReport};
use rover_perception::map::{ConfigError, PerceptionParams, PerceptionPipeline, Pose, WorldMap};

const RUN_FLAGS: [&str; 9] = [
    "image",
    "x",
    "y",
    "heading",
    "config",
    "map",
    "vision",
    "map_image",
    "report",
];

#[derive(Parser, Debug)]
#[command(name = "rover-perception", version, about, long_about = None)]
struct Args {
    /// Camera frame (any format the `image` crate decodes)
    #[arg(required_unless_present = "run_config")]
    image: Option<PathBuf>,

    /// Rover world x position
    #[arg(long, allow_hyphen_values = true, required_unless_present = "run_config")]
    x: Option<f64>,

    /// Rover world y position
    #[arg(long, allow_hyphen_values = true, required_unless_present = "run_config")]
    y: Option<f64>,

    /// Rover heading in degrees, counter-clockwise from world +x
    #[arg(long, allow_hyphen_values = true, required_unless_present = "run_config")]
    heading: Option<f64>,

    /// Perception parameters as JSON; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// World map JSON, loaded before the step and written back after it
    #[arg(long)]
    map: Option<PathBuf>,

    /// Output path of the top-down visualization frame
    #[arg(long)]
    vision: Option<PathBuf>,

    /// Output path of a rendered world map snapshot
    #[arg(long)]
    map_image: Option<PathBuf>,

    /// Output path of the JSON step report; printed to stdout when absent
    #[arg(long)]
    report: Option<PathBuf>,

    /// Whole run as one JSON file (image, pose, params, output paths).
    /// The report defaults to `perception_report.json`.
    #[arg(long, conflicts_with_all = RUN_FLAGS)]
    run_config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,

    /// Emit JSON log events (builds with the `tracing` feature only)
    #[arg(long)]
    log_json: bool,
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse().map_err(|_| format!("unknown log level `{raw}`"))
}

#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Persist(#[from] PerceptionIoError),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("missing --{0} (or pass --run-config)")]
    MissingArg(&'static str),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Where the step report goes.
enum ReportSink {
    Stdout,
    File(PathBuf),
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match plan(&args).and_then(|(cfg, sink)| run(&cfg, &sink)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(args: &Args) {
    if args.log_json {
        eprintln!("warning: --log-json needs the `tracing` feature; using plain logs");
    }
    let _ = rover_perception::core::init_with_level(args.log_level);
}

#[cfg(feature = "tracing")]
fn init_logging(args: &Args) {
    let _ = tracing_log::LogTracer::init();
    rover_perception::core::init_tracing(args.log_json, args.log_level);
}

/// Resolve the command line into a run configuration.
fn plan(args: &Args) -> Result<(PerceptionConfig, ReportSink), RunError> {
    if let Some(path) = &args.run_config {
        let cfg = PerceptionConfig::load_json(path)?;
        let sink = ReportSink::File(cfg.report_path());
        return Ok((cfg, sink));
    }

    let image = args.image.as_ref().ok_or(RunError::MissingArg("image"))?;
    let pose = Pose::new(
        args.x.ok_or(RunError::MissingArg("x"))?,
        args.y.ok_or(RunError::MissingArg("y"))?,
        args.heading.ok_or(RunError::MissingArg("heading"))?,
    );
    let params = match &args.config {
        Some(path) => load_params(path)?,
        None => PerceptionParams::default(),
    };
    let path_string = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());

    let cfg = PerceptionConfig {
        image_path: image.to_string_lossy().into_owned(),
        pose,
        params,
        map_path: path_string(&args.map),
        vision_path: path_string(&args.vision),
        map_image_path: path_string(&args.map_image),
        report_path: path_string(&args.report),
    };
    let sink = match &args.report {
        Some(path) => ReportSink::File(path.clone()),
        None => ReportSink::Stdout,
    };
    Ok((cfg, sink))
}

fn run(cfg: &PerceptionConfig, sink: &ReportSink) -> Result<(), RunError> {
    let pipeline = PerceptionPipeline::new(cfg.params.clone())?;

    let image_path = Path::new(&cfg.image_path);
    let img = image::ImageReader::open(image_path)
        .map_err(|source| RunError::Read {
            path: image_path.to_path_buf(),
            source,
        })?
        .decode()?
        .to_rgb8();
    log::info!(
        "loaded {} ({}x{})",
        cfg.image_path,
        img.width(),
        img.height()
    );

    let mut world = match &cfg.map_path {
        Some(path) => WorldMap::load_or_new(path, pipeline.params().world_size)?,
        None => pipeline.new_world_map(),
    };

    let out = frame::perceive(&pipeline, &img, &cfg.pose, &mut world)?;
    log::info!(
        "navigable {} px, rock {} px, obstacle {} px in the near field",
        out.stats.navigable.near_field,
        out.stats.rock.near_field,
        out.stats.obstacle.near_field
    );

    if let Some(path) = &cfg.map_path {
        world.write_json(path)?;
        log::info!("map written to {path}");
    }
    if let Some(path) = &cfg.vision_path {
        frame::to_image_rgb(out.vision.clone())?.save(path)?;
    }
    if let Some(path) = &cfg.map_image_path {
        frame::render_world_map(&world).save(path)?;
    }

    let report = PerceptionReport::new(&cfg.image_path, cfg.pose, &pipeline, &out, &world);
    match sink {
        ReportSink::File(path) => report.write_json(path)?,
        ReportSink::Stdout => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn load_params(path: &Path) -> Result<PerceptionParams, RunError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RunError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

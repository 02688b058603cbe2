mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use facefollow_core::capture::domain::frame_sink::FrameSink;
use facefollow_core::capture::domain::object_detector::ObjectDetector;
use facefollow_core::capture::domain::stop_signal::StopSignal;
use facefollow_core::capture::infrastructure::detection_trace::DetectionTrace;
use facefollow_core::capture::infrastructure::flipped_detector::FlippedDetector;
use facefollow_core::capture::infrastructure::image_dir_sink::ImageDirSink;
use facefollow_core::capture::infrastructure::stop_signals::{
    AnyStopSignal, ButtonHeldSignal, SharedStopFlag,
};
use facefollow_core::pipeline::track_targets_use_case::TrackTargetsUseCase;
use facefollow_core::pipeline::tracking_logger::StdoutTrackingLogger;
use facefollow_core::response::domain::actuator::{
    ActuatorError, DigitalInput, DigitalOutput, Level, ServoOutput,
};
use facefollow_core::response::domain::gimbal::Gimbal;
use facefollow_core::response::domain::light_align::LightAlign;
use facefollow_core::response::domain::multi_responder::MultiResponder;
use facefollow_core::response::infrastructure::logging_outputs::{
    LoggingDigitalOutput, LoggingServoOutput,
};
use facefollow_core::response::infrastructure::sysfs_gpio::{
    SysfsDigitalInput, SysfsDigitalOutput,
};
use facefollow_core::response::infrastructure::sysfs_pwm::SysfsServoOutput;
use facefollow_core::shared::config::TrackerConfig;

use settings::{PinConfig, Settings};

const PROGRESS_EVERY_FRAMES: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResponderKind {
    /// Left / center / right status lights.
    Lights,
    /// Pan/tilt servo gimbal.
    Gimbal,
}

/// Follow the most centered detection with status lights and a pan/tilt gimbal.
#[derive(Parser)]
#[command(name = "facefollow")]
struct Cli {
    /// JSON-lines detection trace: {"frame": n, "boxes": [[x0, y0, x1, y1], ...]}.
    trace: PathBuf,

    /// JSON settings file (tracking parameters and pin assignments).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model-frame width in pixels.
    #[arg(long)]
    frame_width: Option<u32>,

    /// Model-frame height in pixels.
    #[arg(long)]
    frame_height: Option<u32>,

    /// Half-width of the center light zone in pixels.
    #[arg(long)]
    center_size: Option<f64>,

    /// Responders to drive (comma-separated).
    #[arg(long, value_enum, value_delimiter = ',', default_values = ["lights", "gimbal"])]
    responders: Vec<ResponderKind>,

    /// Log pin writes instead of touching GPIO/PWM.
    #[arg(long)]
    dry_run: bool,

    /// Camera is mounted upside down.
    #[arg(long)]
    flip: bool,

    /// Replay at this many frames per second (default: as fast as possible).
    #[arg(long)]
    fps: Option<f64>,

    /// Run only while the stop button is held.
    #[arg(long)]
    use_button: bool,

    /// Log actuator faults and keep tracking instead of exiting.
    #[arg(long)]
    keep_going: bool,

    /// Write each annotated frame as a PNG into DIR.
    #[arg(long, value_name = "DIR")]
    annotate_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    validate(&cli, &settings)?;

    let board = Board::new(cli.dry_run, settings.pins.clone());
    let tracking = settings.tracking;

    let trace = DetectionTrace::load(&cli.trace)?;
    log::info!(
        "Loaded {} frames from {}",
        trace.frame_count(),
        cli.trace.display()
    );
    let (source, replay) = trace.into_replay(tracking.frame);
    let detector: Box<dyn ObjectDetector> = if cli.flip {
        Box::new(FlippedDetector::new(Box::new(replay)))
    } else {
        Box::new(replay)
    };

    let responder = build_responders(&cli.responders, &board, &tracking)?;
    log::info!("Responders: {}", responder.names().join(", "));

    let sink = build_sink(cli.annotate_dir.as_deref())?;
    let stop = build_stop_signal(cli.use_button, &board)?;
    let mut status_light = board.digital_output("status", board.pins.status_light)?;
    status_light.write(Level::High)?;

    let mut use_case = TrackTargetsUseCase::new(
        Box::new(source),
        detector,
        Box::new(responder),
        tracking.frame,
        sink,
        Some(stop),
        Some(Box::new(StdoutTrackingLogger::new(PROGRESS_EVERY_FRAMES))),
        cli.fps,
        cli.keep_going,
    );
    let result = use_case.execute();

    if let Err(e) = status_light.write(Level::Low) {
        log::warn!("Failed to turn off status light: {e}");
    }
    let stats = result?;
    log::info!(
        "Tracked {} frames, {} with a target",
        stats.frames,
        stats.frames_with_target
    );
    if stats.actuator_faults > 0 {
        log::warn!("{} frames hit an actuator fault", stats.actuator_faults);
    }
    Ok(())
}

/// File settings first, then command-line overrides.
fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    apply_overrides(cli, &mut settings.tracking);
    Ok(settings)
}

fn apply_overrides(cli: &Cli, tracking: &mut TrackerConfig) {
    if let Some(width) = cli.frame_width {
        tracking.frame.width = width;
    }
    if let Some(height) = cli.frame_height {
        tracking.frame.height = height;
    }
    if let Some(center_size) = cli.center_size {
        tracking.lights.center_size = center_size;
    }
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.trace.exists() {
        return Err(format!("Trace file not found: {}", cli.trace.display()).into());
    }
    if cli.responders.is_empty() {
        return Err("At least one responder is required".into());
    }
    if let Some(fps) = cli.fps {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(format!("FPS must be a positive number, got {fps}").into());
        }
    }
    if cli.use_button && cli.dry_run {
        return Err("--use-button needs real GPIO and cannot be combined with --dry-run".into());
    }
    settings.validate()?;
    Ok(())
}

/// Hands out pin and servo handles, real or dry-run.
struct Board {
    dry_run: bool,
    pins: PinConfig,
}

impl Board {
    fn new(dry_run: bool, pins: PinConfig) -> Self {
        Self { dry_run, pins }
    }

    fn digital_output(
        &self,
        label: &str,
        pin: u32,
    ) -> Result<Box<dyn DigitalOutput>, ActuatorError> {
        if self.dry_run {
            return Ok(Box::new(LoggingDigitalOutput::new(format!("{label} (gpio{pin})"))));
        }
        Ok(Box::new(SysfsDigitalOutput::open(&self.pins.gpio_root, pin)?))
    }

    fn digital_input(&self, pin: u32) -> Result<Box<dyn DigitalInput>, ActuatorError> {
        Ok(Box::new(SysfsDigitalInput::open(&self.pins.gpio_root, pin)?))
    }

    fn servo(&self, label: &str, channel: u32) -> Result<Box<dyn ServoOutput>, ActuatorError> {
        if self.dry_run {
            return Ok(Box::new(LoggingServoOutput::new(format!("{label} servo"))));
        }
        Ok(Box::new(SysfsServoOutput::open(
            &self.pins.pwm_root,
            self.pins.pwm_chip,
            channel,
            self.pins.pwm_frequency_hz,
        )?))
    }
}

fn build_responders(
    kinds: &[ResponderKind],
    board: &Board,
    tracking: &TrackerConfig,
) -> Result<MultiResponder, Box<dyn std::error::Error>> {
    let mut responders = MultiResponder::new();
    let mut seen = Vec::new();
    for &kind in kinds {
        if seen.contains(&kind) {
            log::warn!("Responder {kind:?} listed more than once; ignoring repeat");
            continue;
        }
        seen.push(kind);
        match kind {
            ResponderKind::Lights => {
                let pins = &board.pins;
                responders.register(Box::new(LightAlign::new(
                    board.digital_output("left", pins.led_left)?,
                    board.digital_output("center", pins.led_center)?,
                    board.digital_output("right", pins.led_right)?,
                    tracking.lights,
                )));
            }
            ResponderKind::Gimbal => {
                responders.register(Box::new(Gimbal::new(
                    board.servo("horizontal", board.pins.pwm_horizontal)?,
                    board.servo("vertical", board.pins.pwm_vertical)?,
                    tracking.gimbal,
                )?));
            }
        }
    }
    Ok(responders)
}

fn build_sink(
    dir: Option<&Path>,
) -> Result<Option<Box<dyn FrameSink>>, Box<dyn std::error::Error>> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let sink = ImageDirSink::new(dir)
        .map_err(|e| format!("Cannot create annotation directory {}: {e}", dir.display()))?;
    log::info!("Writing annotated frames to {}", dir.display());
    Ok(Some(Box::new(sink)))
}

fn build_stop_signal(
    use_button: bool,
    board: &Board,
) -> Result<Box<dyn StopSignal>, Box<dyn std::error::Error>> {
    let interrupt = SharedStopFlag::new();
    let handler_flag = interrupt.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, stopping");
        handler_flag.request_stop();
    })?;

    let mut signals: Vec<Box<dyn StopSignal>> = vec![Box::new(interrupt)];
    if use_button {
        let button = board.digital_input(board.pins.button)?;
        signals.push(Box::new(ButtonHeldSignal::new(button)));
    }
    Ok(Box::new(AnyStopSignal::new(signals)))
}

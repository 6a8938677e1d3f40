use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use mtrack::capture::VideoSource;
use mtrack::contour::ContourSegmenter;
use mtrack::csv::CsvSink;
use mtrack::render::OverlaySink;
use mtrack::{Config, MotionTracker, Session};

/// Logs position, velocity and travelled distance of objects moving
/// through a fixed camera view.
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Opts {
    /// path to the video file, reads camera 0 when omitted
    #[clap(short, long)]
    video: Option<String>,

    /// minimum blob area in processing pixels
    #[clap(short = 'a', long)]
    min_area: Option<f32>,

    /// TOML file with tracker settings
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// write the annotated video to this file
    #[clap(short, long)]
    record: Option<String>,

    /// do not open a preview window
    #[clap(long)]
    no_display: bool,

    /// write event rows here instead of stdout
    #[clap(long)]
    csv: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    let mut config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(area) = opts.min_area {
        config.min_area = Some(area);
    }

    let tracker = MotionTracker::new(config.clone())?;
    let segmenter = ContourSegmenter::new(&config, tracker.thresholds())?;

    log::info!(
        "processing at {} px (rf {:.2}), min area {:.0}",
        config.processing_width,
        config.rf(),
        tracker.thresholds().min_area
    );

    let mut source = VideoSource::open(opts.video.as_deref(), &config)?;
    let overlay = OverlaySink::new(
        source.frame_handle(),
        &config,
        !opts.no_display,
        opts.record.as_deref(),
    )?;

    let out: Box<dyn Write> = match &opts.csv {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };

    let mut sink = (CsvSink::new(out), overlay);

    // Ctrl-C or a kill end the run after the current frame, the sinks
    // still get to finish
    let stop = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop))?;
    }

    let stats = Session::new(tracker, segmenter).run(&mut source, &mut sink, &stop)?;

    log::info!(
        "{} events in {} motion runs{}",
        stats.events,
        stats.motion_runs,
        if stats.stopped { ", stopped by user" } else { "" }
    );

    Ok(())
}

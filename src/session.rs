use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::frame::GrayImage;
use crate::segment::Segmentation;
use crate::tracker::{FrameReport, MotionTracker};

/// Grayscale frames at the processing width, `None` once exhausted
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<GrayImage>, Error>;
}

/// Frames held in memory, for replays and tests
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<GrayImage>,
}

impl From<Vec<GrayImage>> for MemorySource {
    fn from(frames: Vec<GrayImage>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<GrayImage>, Error> {
        Ok(self.frames.pop_front())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Consumer of per-frame reports: overlays, CSV logs and so on
pub trait ReportSink {
    fn on_frame(&mut self, report: &FrameReport) -> Result<Control, Error>;

    fn finish(&mut self, _stats: &RunStats) -> Result<(), Error> {
        Ok(())
    }
}

impl ReportSink for Vec<FrameReport> {
    fn on_frame(&mut self, report: &FrameReport) -> Result<Control, Error> {
        self.push(report.clone());
        Ok(Control::Continue)
    }
}

impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
    fn on_frame(&mut self, report: &FrameReport) -> Result<Control, Error> {
        let mut control = Control::Continue;
        let mut failed = None;

        for res in [self.0.on_frame(report), self.1.on_frame(report)] {
            match res {
                Ok(Control::Continue) => {}
                Ok(Control::Stop) => control = Control::Stop,
                Err(err) => {
                    if let Some(prev) = failed.replace(err) {
                        log::warn!("frame {}: sink failed: {}", report.index, prev);
                    }
                }
            }
        }

        // a stop request wins over a failing sibling
        match failed {
            Some(err) if control == Control::Stop => {
                log::warn!("frame {}: sink failed: {}", report.index, err);
                Ok(Control::Stop)
            }
            Some(err) => Err(err),
            None => Ok(control),
        }
    }

    fn finish(&mut self, stats: &RunStats) -> Result<(), Error> {
        let a = self.0.finish(stats);
        self.1.finish(stats)?;
        a
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub duration: Duration,
    pub events: u64,
    pub motion_runs: u64,
    pub stopped: bool,
}

impl RunStats {
    pub fn fps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Single stream frame loop
pub struct Session<S> {
    pub tracker: MotionTracker,
    pub segmentation: S,
}

impl<S: Segmentation> Session<S> {
    pub fn new(tracker: MotionTracker, segmentation: S) -> Self {
        Self {
            tracker,
            segmentation,
        }
    }

    /// Consumes frames until the source is exhausted, the sink asks to stop
    /// or `stop` is raised. Sink failures are logged and do not interrupt
    /// tracking.
    pub fn run<F, K>(&mut self, source: &mut F, sink: &mut K, stop: &AtomicBool) -> Result<RunStats, Error>
    where
        F: FrameSource + ?Sized,
        K: ReportSink + ?Sized,
    {
        let started = Instant::now();
        let mut stats = RunStats::default();

        loop {
            if stop.load(Ordering::Relaxed) {
                stats.stopped = true;
                break;
            }

            let gray = match source.next_frame()? {
                Some(gray) => gray,
                None => break,
            };

            // the background seed frame is not counted
            let report = match self.tracker.process(&gray, &mut self.segmentation)? {
                Some(report) => report,
                None => continue,
            };

            stats.frames += 1;

            stats.events += report.event.is_some() as u64;
            stats.motion_runs += report.motion_ended.is_some() as u64;

            match sink.on_frame(&report) {
                Ok(Control::Continue) => {}
                Ok(Control::Stop) => {
                    stats.stopped = true;
                    break;
                }
                Err(err) => log::warn!("frame {}: sink failed: {}", report.index, err),
            }
        }

        stats.duration = started.elapsed();

        log::info!(
            "EOF frames = {}  dur = {:5.3} fps={:5.1}",
            stats.frames,
            stats.duration.as_secs_f64(),
            stats.fps()
        );

        if let Err(err) = sink.finish(&stats) {
            log::warn!("sink failed to finish: {}", err);
        }

        Ok(stats)
    }
}

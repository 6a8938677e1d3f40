use std::io::Write;

use crate::error::Error;
use crate::event::EventRecord;
use crate::session::{Control, ReportSink, RunStats};
use crate::tracker::FrameReport;

/// Writes reported events as comma separated rows, comments start with `#`
pub struct CsvSink<W: Write> {
    out: W,
    header: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, header: false }
    }

    pub fn with_header(mut self) -> Self {
        self.header = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_event(&mut self, rec: &EventRecord) -> Result<(), Error> {
        writeln!(
            self.out,
            "{:5.1},{:5.1}, {:5.1},  {:5.2}, {:5.0}, {:5.1}",
            rec.x, rec.inverted_y, rec.width, rec.corrected_vel_x, rec.dist_x, rec.delta_width
        )?;

        Ok(())
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn on_frame(&mut self, report: &FrameReport) -> Result<Control, Error> {
        if self.header {
            writeln!(self.out, "# xp, yp, xwidth, xvel, xdist, dxwidth")?;
            self.header = false;
        }

        if let Some(duration) = report.motion_ended {
            writeln!(self.out, "# motion end after {} frames", duration)?;
        }

        if let Some(rec) = &report.event {
            self.write_event(rec)?;
        }

        Ok(Control::Continue)
    }

    fn finish(&mut self, stats: &RunStats) -> Result<(), Error> {
        writeln!(
            self.out,
            "# EOF frames = {}  dur = {:5.3} fps={:5.1}",
            stats.frames,
            stats.duration.as_secs_f64(),
            stats.fps()
        )?;
        self.out.flush()?;

        Ok(())
    }
}

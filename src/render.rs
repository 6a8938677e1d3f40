use std::cell::RefCell;
use std::rc::Rc;

use opencv::{
    core::{self, Mat},
    highgui, imgproc,
    prelude::*,
    videoio,
};

use crate::config::Config;
use crate::error::Error;
use crate::session::{Control, ReportSink, RunStats};
use crate::slot::Slot;
use crate::tracker::FrameReport;

const WINDOW: &str = "Video";
const KEY_ESC: i32 = 27;

/// Draws slot boxes and measurements onto the color frame, shows it in a
/// window and optionally records it.
pub struct OverlaySink {
    frame: Rc<RefCell<Mat>>,
    show: bool,
    display_width: i32,
    rf: f32,
    writer: Option<videoio::VideoWriter>,
    record_path: Option<String>,
}

impl OverlaySink {
    pub fn new(frame: Rc<RefCell<Mat>>, cfg: &Config, show: bool, record_path: Option<&str>) -> Result<Self, Error> {
        if show {
            highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
        }

        Ok(Self {
            frame,
            show,
            display_width: cfg.display_width as i32,
            rf: cfg.rf(),
            writer: None,
            record_path: record_path.map(ToString::to_string),
        })
    }

    fn draw_slot(&self, frame: &mut Mat, idx: usize, slot: &Slot, reported: bool) -> opencv::Result<()> {
        let color = if slot.in_event {
            core::Scalar::new(0.0, 0.0, 255.0, 0.0)
        } else {
            core::Scalar::new(100.0, 100.0, 100.0, 0.0)
        };

        if reported {
            let lines = [
                (format!("{:5.2}", slot.vel_x.filtered), 30.0),
                (format!("{:4.0}", slot.dist_x), 40.0),
            ];

            for (text, offset) in lines {
                imgproc::put_text(
                    frame,
                    &text,
                    core::Point::new(slot.x as i32, (slot.center_y + offset * self.rf) as i32),
                    imgproc::FONT_HERSHEY_SIMPLEX,
                    0.5,
                    color,
                    2,
                    imgproc::LINE_AA,
                    false,
                )?;
            }
        }

        let bbox = slot.bbox();
        imgproc::rectangle(
            frame,
            core::Rect::new(
                bbox.left() as i32,
                bbox.top() as i32,
                bbox.width() as i32,
                bbox.height() as i32,
            ),
            color,
            2,
            imgproc::LINE_8,
            0,
        )?;

        imgproc::put_text(
            frame,
            &format!("{}", idx + 1),
            core::Point::new(slot.center_x as i32, slot.center_y as i32),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            color,
            2,
            imgproc::LINE_AA,
            false,
        )?;

        Ok(())
    }

    fn record(&mut self, frame: &Mat) -> Result<(), Error> {
        let path = match &self.record_path {
            Some(path) => path,
            None => return Ok(()),
        };

        if self.writer.is_none() {
            self.writer = Some(videoio::VideoWriter::new(
                path,
                videoio::VideoWriter::fourcc(b'X' as _, b'V' as _, b'I' as _, b'D' as _)?,
                25.0,
                core::Size::new(frame.cols(), frame.rows()),
                true,
            )?);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.write(frame)?;
        }

        Ok(())
    }

    fn show(&self, frame: &Mat) -> Result<Control, Error> {
        if frame.cols() != self.display_width {
            let height = frame.rows() * self.display_width / frame.cols().max(1);
            let mut small = Mat::default();
            imgproc::resize(
                frame,
                &mut small,
                core::Size::new(self.display_width, height),
                0.0,
                0.0,
                imgproc::INTER_AREA,
            )?;
            highgui::imshow(WINDOW, &small)?;
        } else {
            highgui::imshow(WINDOW, frame)?;
        }

        let key = highgui::wait_key(1)? & 0xFF;
        if key == 'q' as i32 || key == KEY_ESC {
            return Ok(Control::Stop);
        }

        // space pauses until pressed again
        if key == ' ' as i32 {
            while highgui::wait_key(1)? & 0xFF != ' ' as i32 {}
        }

        Ok(Control::Continue)
    }
}

impl ReportSink for OverlaySink {
    fn on_frame(&mut self, report: &FrameReport) -> Result<Control, Error> {
        let handle = self.frame.clone();
        let mut frame = handle.borrow_mut();

        for (idx, slot) in report.slots.iter().take(report.assigned).enumerate() {
            self.draw_slot(&mut frame, idx, slot, slot.in_event && report.sustained)?;
        }

        self.record(&frame)?;

        if self.show {
            self.show(&frame)
        } else {
            Ok(Control::Continue)
        }
    }

    fn finish(&mut self, _stats: &RunStats) -> Result<(), Error> {
        if let Some(mut writer) = self.writer.take() {
            writer.release()?;
        }

        if self.show {
            highgui::destroy_all_windows()?;
        }

        Ok(())
    }
}

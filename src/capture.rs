use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ndarray::Array2;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
    videoio,
};

use crate::config::Config;
use crate::error::Error;
use crate::frame::GrayImage;
use crate::session::FrameSource;

/// Time a live camera gets to settle exposure before the first read
const CAMERA_WARMUP: Duration = Duration::from_secs(4);

/// Video file or camera 0, preprocessed to blurred grayscale at the
/// processing width. The resized color frame stays available through
/// [`frame_handle`](Self::frame_handle) for overlays.
pub struct VideoSource {
    cam: videoio::VideoCapture,
    width: i32,
    blur_size: i32,
    y_crop_frac: i32,
    color: Rc<RefCell<Mat>>,
}

impl VideoSource {
    pub fn open(path: Option<&str>, cfg: &Config) -> Result<Self, Error> {
        let cam = match path {
            Some(path) => videoio::VideoCapture::from_file(path, videoio::CAP_ANY)?,
            None => {
                let cam = videoio::VideoCapture::new(0, videoio::CAP_ANY)?;
                std::thread::sleep(CAMERA_WARMUP);
                cam
            }
        };

        if !videoio::VideoCapture::is_opened(&cam)? {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unable to open {}", path.unwrap_or("camera 0")),
            )));
        }

        Ok(Self {
            cam,
            width: cfg.processing_width as i32,
            blur_size: cfg.blur_size as i32,
            y_crop_frac: cfg.y_crop_frac as i32,
            color: Rc::new(RefCell::new(Mat::default())),
        })
    }

    #[inline]
    pub fn frame_handle(&self) -> Rc<RefCell<Mat>> {
        self.color.clone()
    }
}

impl FrameSource for VideoSource {
    fn next_frame(&mut self) -> Result<Option<GrayImage>, Error> {
        let mut frame = Mat::default();
        if !self.cam.read(&mut frame)? || frame.cols() == 0 || frame.rows() == 0 {
            return Ok(None);
        }

        // cover the timestamp overlay at the top
        let crop = core::Rect::new(0, 0, frame.cols(), frame.rows() / self.y_crop_frac);
        imgproc::rectangle(
            &mut frame,
            crop,
            core::Scalar::all(0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let height = (frame.rows() as f64 * self.width as f64 / frame.cols() as f64).round() as i32;
        let mut resized = Mat::default();
        imgproc::resize(
            &frame,
            &mut resized,
            core::Size::new(self.width, height),
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )?;

        let mut gray = Mat::default();
        imgproc::cvt_color(&resized, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mut blurred = Mat::default();
        imgproc::gaussian_blur(
            &gray,
            &mut blurred,
            core::Size::new(self.blur_size, self.blur_size),
            0.0,
            0.0,
            core::BORDER_DEFAULT,
        )?;

        let data = blurred.data_typed::<u8>()?.to_vec();
        let image = Array2::from_shape_vec((height as usize, self.width as usize), data)?;

        *self.color.borrow_mut() = resized;

        Ok(Some(image))
    }
}

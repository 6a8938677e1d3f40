use ndarray::{ErrorKind, ShapeError};
use opencv::{
    core::{self, Mat, Vector},
    imgproc,
    prelude::*,
};

use crate::config::{Config, Thresholds};
use crate::detection::Blob;
use crate::error::Error;
use crate::frame::GrayImage;
use crate::segment::{Segmentation, Segmented, KERNEL5};

/// Background difference segmentation on OpenCV. Regions are the external
/// contours of the dilated mask in `find_contours` order, their area is the
/// contour area, so holes inside an object count towards it.
pub struct ContourSegmenter {
    pub threshold: f64,
    pub dilate_iterations: i32,
    kernel: Mat,
}

impl ContourSegmenter {
    pub fn new(cfg: &Config, th: &Thresholds) -> Result<Self, Error> {
        let rows: Vec<[u8; 5]> = KERNEL5.iter().map(|row| row.map(u8::from)).collect();

        Ok(Self {
            threshold: cfg.diff_threshold as f64,
            dilate_iterations: th.dilate_iterations as i32,
            kernel: Mat::from_slice_2d(&rows)?,
        })
    }
}

fn to_mat(image: &GrayImage) -> Result<Mat, Error> {
    let image = image.as_standard_layout();
    let data = image
        .as_slice()
        .ok_or_else(|| ShapeError::from_kind(ErrorKind::IncompatibleLayout))?;

    Ok(Mat::from_slice(data)?.reshape(1, image.nrows() as i32)?.try_clone()?)
}

impl Segmentation for ContourSegmenter {
    fn segment(&mut self, background: &GrayImage, current: &GrayImage) -> Result<Segmented, Error> {
        let mut delta = Mat::default();
        core::absdiff(&to_mat(background)?, &to_mat(current)?, &mut delta)?;

        let mut max_diff = 0.0;
        core::min_max_loc(&delta, None, Some(&mut max_diff), None, None, &Mat::default())?;

        let mut mask = Mat::default();
        imgproc::threshold(&delta, &mut mask, self.threshold, 255.0, imgproc::THRESH_BINARY)?;

        let mut dilated = Mat::default();
        imgproc::dilate(
            &mask,
            &mut dilated,
            &self.kernel,
            core::Point::new(-1, -1),
            self.dilate_iterations,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        let mut contours: Vector<Vector<core::Point>> = Vector::new();
        imgproc::find_contours(
            &dilated,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            core::Point::new(0, 0),
        )?;

        let mut blobs = Vec::with_capacity(contours.len());
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            let rect = imgproc::bounding_rect(&contour)?;

            blobs.push(Blob::new(
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
                area as f32,
            ));
        }

        Ok(Segmented {
            blobs,
            max_diff: max_diff as u8,
        })
    }
}

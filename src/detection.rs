use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};

/// Foreground region produced by segmentation: left-top corner,
/// (width,height) of its bounding box and its area in pixels
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(rename = "a")]
    pub area: f32,
}

impl Blob {
    #[inline]
    pub fn new(x: f32, y: f32, w: f32, h: f32, area: f32) -> Self {
        Self { x, y, w, h, area }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltwh> {
        BBox::ltwh(self.x, self.y, self.w, self.h)
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline(always)]
    pub fn center(&self) -> na::Point2<f32> {
        self.bbox().center()
    }

    /// Same blob seen at `factor` times the resolution
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            w: self.w * factor,
            h: self.h * factor,
            area: self.area * factor * factor,
        }
    }
}

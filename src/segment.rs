use ndarray::{Array2, Zip};

use crate::config::{Config, Thresholds};
use crate::detection::Blob;
use crate::error::Error;
use crate::frame::GrayImage;

/// Round-ish 5x5 structuring element, corners excluded
pub const KERNEL5: [[bool; 5]; 5] = [
    [false, true, true, true, false],
    [true, true, true, true, true],
    [true, true, true, true, true],
    [true, true, true, true, true],
    [false, true, true, true, false],
];

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Default)]
pub struct Segmented {
    /// candidate regions, in no particular order
    pub blobs: Vec<Blob>,
    /// largest absolute difference between frame and background
    pub max_diff: u8,
}

/// Turns the current frame and its background into candidate regions
pub trait Segmentation {
    fn segment(&mut self, background: &GrayImage, current: &GrayImage) -> Result<Segmented, Error>;
}

/// Background difference, binary threshold, dilation and 8-connected
/// regions reported in raster order of their first pixel. Area is the
/// region's pixel count.
#[derive(Debug, Clone)]
pub struct DiffSegmenter {
    pub threshold: u8,
    pub dilate_iterations: u32,
}

impl DiffSegmenter {
    pub fn new(cfg: &Config, th: &Thresholds) -> Self {
        Self {
            threshold: cfg.diff_threshold,
            dilate_iterations: th.dilate_iterations,
        }
    }

    fn threshold(&self, background: &GrayImage, current: &GrayImage) -> (Array2<bool>, u8) {
        let mut max_diff = 0u8;
        let mut mask = Array2::from_elem(current.dim(), false);
        let threshold = self.threshold;

        Zip::from(&mut mask)
            .and(background)
            .and(current)
            .for_each(|m, &bg, &px| {
                let diff = bg.abs_diff(px);
                max_diff = max_diff.max(diff);
                *m = diff > threshold;
            });

        (mask, max_diff)
    }
}

impl Segmentation for DiffSegmenter {
    fn segment(&mut self, background: &GrayImage, current: &GrayImage) -> Result<Segmented, Error> {
        let (mut mask, max_diff) = self.threshold(background, current);

        for _ in 0..self.dilate_iterations {
            mask = dilate(&mask);
        }

        Ok(Segmented {
            blobs: regions(&mask),
            max_diff,
        })
    }
}

pub fn dilate(mask: &Array2<bool>) -> Array2<bool> {
    let (rows, cols) = mask.dim();
    let mut out = Array2::from_elem((rows, cols), false);

    for ((r, c), &set) in mask.indexed_iter() {
        if !set {
            continue;
        }

        for (kr, row) in KERNEL5.iter().enumerate() {
            for (kc, &on) in row.iter().enumerate() {
                let (rr, cc) = (r + kr, c + kc);
                if !on || rr < 2 || cc < 2 || rr - 2 >= rows || cc - 2 >= cols {
                    continue;
                }

                out[[rr - 2, cc - 2]] = true;
            }
        }
    }

    out
}

/// Bounding box and pixel count of every 8-connected region
pub fn regions(mask: &Array2<bool>) -> Vec<Blob> {
    let (rows, cols) = mask.dim();
    let mut seen = Array2::from_elem((rows, cols), false);
    let mut stack = Vec::new();
    let mut blobs = Vec::new();

    for ((r, c), &set) in mask.indexed_iter() {
        if !set || seen[[r, c]] {
            continue;
        }

        let (mut top, mut left, mut bottom, mut right) = (r, c, r, c);
        let mut area = 0usize;

        seen[[r, c]] = true;
        stack.push((r, c));

        while let Some((pr, pc)) = stack.pop() {
            area += 1;
            top = top.min(pr);
            bottom = bottom.max(pr);
            left = left.min(pc);
            right = right.max(pc);

            for (dr, dc) in NEIGHBOURS {
                let nr = pr as isize + dr;
                let nc = pc as isize + dc;
                if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                    continue;
                }

                let n = [nr as usize, nc as usize];
                if mask[n] && !seen[n] {
                    seen[n] = true;
                    stack.push((n[0], n[1]));
                }
            }
        }

        blobs.push(Blob::new(
            left as f32,
            top as f32,
            (right - left + 1) as f32,
            (bottom - top + 1) as f32,
            area as f32,
        ));
    }

    blobs
}

use crate::config::{Config, Thresholds};
use crate::detection::Blob;
use crate::frame::Frame;
use crate::slot::SlotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// non-finite or non-positive box extent
    Malformed,
    TooSmall,
    /// center too far above the bottom edge
    OutsideRoi,
    LeftOfMinX,
    /// every slot is already taken this frame
    TooMany,
}

/// Picks the blobs worth tracking and maps them onto slots by position in
/// the accepted order. Input order is kept as is, so when segmentation
/// reorders its output between frames two objects can swap slots.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub min_area: f32,
    pub roi_fraction: f32,
    pub min_x_pos: f32,
    pub max_objects: usize,
}

impl CandidateFilter {
    pub fn new(cfg: &Config, th: &Thresholds) -> Self {
        Self {
            min_area: th.min_area,
            roi_fraction: cfg.roi_fraction,
            min_x_pos: th.min_x_pos,
            max_objects: cfg.max_objects,
        }
    }

    /// Per-blob rules, independent of how many blobs were accepted so far
    pub fn check(&self, blob: &Blob, frame_height: f32) -> Result<(), Rejection> {
        if !blob.bbox().is_well_formed() || !blob.area.is_finite() {
            return Err(Rejection::Malformed);
        }

        if blob.area < self.min_area {
            return Err(Rejection::TooSmall);
        }

        let cy = blob.center().y;
        if frame_height - cy > frame_height * self.roi_fraction {
            return Err(Rejection::OutsideRoi);
        }

        if blob.x < self.min_x_pos {
            return Err(Rejection::LeftOfMinX);
        }

        Ok(())
    }

    /// Accepted blobs in input order, at most `max_objects` of them
    pub fn select<'a>(&self, frame: &'a Frame) -> Vec<&'a Blob> {
        let mut accepted = Vec::with_capacity(self.max_objects);

        for (idx, blob) in frame.iter().enumerate() {
            let verdict = self.check(blob, frame.height()).and_then(|_| {
                if accepted.len() >= self.max_objects {
                    Err(Rejection::TooMany)
                } else {
                    Ok(())
                }
            });

            match verdict {
                Ok(()) => accepted.push(blob),
                Err(reason) => {
                    log::trace!("frame {}: blob {} rejected: {:?}", frame.index, idx, reason)
                }
            }
        }

        accepted
    }

    /// Writes the accepted geometry into slots `0..n` and returns `n`
    pub fn apply(&self, frame: &Frame, slots: &mut SlotStore) -> usize {
        let accepted = self.select(frame);

        for (idx, blob) in accepted.iter().enumerate() {
            if let Some(slot) = slots.get_mut(idx) {
                slot.assign(blob);
            }
        }

        accepted.len().min(slots.capacity())
    }
}

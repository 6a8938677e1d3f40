use serde_derive::Serialize;

use crate::config::{Config, Thresholds};
use crate::math;
use crate::slot::Slot;

/// Measurement reported for the primary slot on a motion frame
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct EventRecord {
    pub x: f32,
    /// bottom edge measured upwards from the bottom of the frame
    pub inverted_y: f32,
    pub width: f32,
    /// smoothed x velocity with perspective correction applied
    pub corrected_vel_x: f32,
    pub dist_x: f32,
    pub delta_width: f32,
}

#[derive(Debug, Clone)]
pub struct EventDecision {
    pub x_dist: f32,
    pub y_dist: f32,
    pub x_vel: f32,
    pub y_vel: f32,
    pub ps_f1: f32,
    pub ps_f2: f32,
}

impl EventDecision {
    pub fn new(cfg: &Config, th: &Thresholds) -> Self {
        Self {
            x_dist: th.x_dist,
            y_dist: th.y_dist,
            x_vel: th.x_vel,
            y_vel: th.y_vel,
            ps_f1: cfg.ps_f1,
            ps_f2: cfg.ps_f2,
        }
    }

    /// Travelled far enough and still moving fast enough
    pub fn is_event(&self, slot: &Slot) -> bool {
        let travelled = slot.dist_x.abs() > self.x_dist || slot.dist_y.abs() > self.y_dist;
        let moving =
            slot.vel_x.filtered.abs() > self.x_vel || slot.vel_y.filtered.abs() > self.y_vel;

        travelled && moving
    }

    /// Compensates foreshortening: objects on the left hand side of the
    /// view are further away and appear slower.
    pub fn corrected_vel_x(&self, slot: &Slot, frame_width: f32) -> f32 {
        let xf = math::fraction_from_right(slot.x, frame_width);
        let perspective = math::lerp(xf, self.ps_f1, self.ps_f2);

        slot.vel_x.filtered * (1.0 + perspective * xf)
    }

    pub fn record(&self, slot: &Slot, dims: (f32, f32)) -> EventRecord {
        let (frame_width, frame_height) = dims;

        EventRecord {
            x: slot.x,
            inverted_y: frame_height - slot.bottom(),
            width: slot.width,
            corrected_vel_x: self.corrected_vel_x(slot, frame_width),
            dist_x: slot.dist_x,
            delta_width: slot.delta_width,
        }
    }
}

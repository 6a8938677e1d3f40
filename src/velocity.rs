use crate::config::{Config, Thresholds};
use crate::math;
use crate::slot::{AxisVelocity, Slot};

/// Frame-to-frame change that is too large to be continued motion of the
/// same object. Values are the ones measured before the slot was reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discontinuity {
    pub raw_vel_x: f32,
    pub raw_vel_y: f32,
    pub accel: f32,
    pub delta_width: f32,
}

/// Smoothed velocity, displacement and new-track detection for one slot
#[derive(Debug, Clone)]
pub struct VelocityEngine {
    pub vfilt: f32,
    pub max_vel: f32,
    pub max_delta_vel: f32,
    pub max_delta_width: f32,
}

impl VelocityEngine {
    pub fn new(cfg: &Config, th: &Thresholds) -> Self {
        Self {
            vfilt: cfg.vfilt,
            max_vel: th.max_vel,
            max_delta_vel: th.max_delta_vel,
            max_delta_width: th.max_delta_width,
        }
    }

    #[inline]
    fn smooth(&self, axis: &mut AxisVelocity) -> bool {
        if axis.initialized {
            axis.filtered = math::ema(self.vfilt, axis.raw, axis.filtered);
            false
        } else {
            axis.filtered = axis.raw;
            axis.initialized = true;
            true
        }
    }

    #[inline]
    fn is_discontinuity(&self, d: &Discontinuity) -> bool {
        d.raw_vel_x.abs() > self.max_vel
            || d.raw_vel_y.abs() > self.max_vel
            || d.accel.abs() > self.max_delta_vel
            || d.delta_width.abs() > self.max_delta_width
    }

    /// Updates a slot that received a new blob this frame. Returns the
    /// measured change when it was large enough to restart the track.
    pub fn update(&self, slot: &mut Slot) -> Option<Discontinuity> {
        let bottom = slot.bottom();

        // x is measured on the left edge, y on the bottom edge
        slot.vel_x.raw = slot.x - slot.prev_x;
        slot.vel_y.raw = bottom - slot.prev_bottom;

        if self.smooth(&mut slot.vel_x) {
            slot.prev_filtered_vel_x = slot.vel_x.filtered;
            slot.prev_width = slot.width;
        }
        self.smooth(&mut slot.vel_y);

        slot.delta_width = slot.width - slot.prev_width;

        let measured = Discontinuity {
            raw_vel_x: slot.vel_x.raw,
            raw_vel_y: slot.vel_y.raw,
            accel: slot.vel_x.filtered - slot.prev_filtered_vel_x,
            delta_width: slot.delta_width,
        };

        let discontinuity = if self.is_discontinuity(&measured) {
            slot.vel_x.clear();
            slot.vel_y.clear();
            slot.start_x = slot.x;
            slot.start_bottom = bottom;

            Some(measured)
        } else {
            None
        };

        slot.dist_x = slot.x - slot.start_x;
        slot.dist_y = bottom - slot.start_bottom;

        slot.prev_x = slot.x;
        slot.prev_bottom = bottom;
        slot.prev_area = slot.area;
        slot.prev_width = slot.width;
        slot.prev_filtered_vel_x = slot.vel_x.filtered;

        discontinuity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Blob;
    use assert_approx_eq::assert_approx_eq;

    fn engine(width: u32) -> VelocityEngine {
        let cfg = Config::default().with_processing_width(width);
        VelocityEngine::new(&cfg, &Thresholds::from(&cfg))
    }

    fn place(slot: &mut Slot, x: f32, bottom: f32, w: f32) {
        slot.assign(&Blob::new(x, bottom - 30.0, w, 30.0, w * 30.0));
    }

    /// slot that last saw an object at (500, 380) with width 40
    fn settled_slot() -> Slot {
        let mut slot = Slot::default();
        place(&mut slot, 500.0, 380.0, 40.0);
        slot.prev_x = 500.0;
        slot.prev_bottom = 380.0;
        slot.prev_width = 40.0;
        slot.start_x = 520.0;
        slot.start_bottom = 378.0;
        slot
    }

    #[test]
    fn first_sample_is_taken_verbatim() {
        let e = engine(1296);
        let mut slot = settled_slot();

        place(&mut slot, 480.0, 384.0, 42.0);
        assert_eq!(e.update(&mut slot), None);

        assert_eq!(slot.vel_x.raw, -20.0);
        assert_eq!(slot.vel_x.filtered, -20.0);
        assert_eq!(slot.vel_y.filtered, 4.0);
        assert!(slot.vel_x.initialized && slot.vel_y.initialized);
        // the width history restarts together with the x velocity
        assert_eq!(slot.delta_width, 0.0);
        assert_eq!(slot.dist_x, -40.0);
        assert_eq!(slot.dist_y, 6.0);
        assert_eq!(slot.prev_x, 480.0);
        assert_eq!(slot.prev_bottom, 384.0);
        assert_eq!(slot.prev_width, 42.0);
        assert_eq!(slot.prev_filtered_vel_x, -20.0);
    }

    #[test]
    fn continued_track_is_smoothed() {
        let e = engine(1296);
        let mut slot = settled_slot();
        slot.vel_x = AxisVelocity {
            raw: -18.0,
            filtered: -18.0,
            initialized: true,
        };
        slot.prev_filtered_vel_x = -18.0;

        place(&mut slot, 480.0, 384.0, 42.0);
        assert_eq!(e.update(&mut slot), None);

        assert_eq!(slot.vel_x.raw, -20.0);
        assert_eq!(slot.delta_width, 2.0);
        assert_approx_eq!(slot.vel_x.filtered, -19.0);
        assert_approx_eq!(slot.prev_filtered_vel_x, -19.0);
    }

    #[test]
    fn smoothed_value_stays_between_samples() {
        let e = engine(640);
        let mut slot = Slot::default();
        let mut x = 200.0;
        let steps = [3.0, 4.0, 2.5, 3.5, 3.0, 2.0, 3.0, 4.0, 4.5, 3.0];

        place(&mut slot, x, 400.0, 50.0);
        e.update(&mut slot);
        place(&mut slot, x, 400.0, 50.0);
        e.update(&mut slot);

        for step in steps {
            x += step;
            let before = slot.vel_x.filtered;
            place(&mut slot, x, 400.0, 50.0);
            assert_eq!(e.update(&mut slot), None);

            let raw = slot.vel_x.raw;
            let after = slot.vel_x.filtered;
            assert!(after >= raw.min(before) && after <= raw.max(before));
        }
    }

    #[test]
    fn zero_velocity_keeps_smoothing() {
        let e = engine(640);
        let mut slot = Slot::default();

        place(&mut slot, 100.0, 400.0, 50.0);
        e.update(&mut slot);
        place(&mut slot, 100.0, 400.0, 50.0);
        e.update(&mut slot);
        assert_eq!(slot.vel_x.filtered, 0.0);
        assert!(slot.vel_x.initialized);

        place(&mut slot, 104.0, 400.0, 50.0);
        assert_eq!(e.update(&mut slot), None);
        assert_eq!(slot.vel_x.filtered, 2.0);
    }

    #[test]
    fn jump_restarts_track() {
        let e = engine(1296);
        let mut slot = settled_slot();

        place(&mut slot, 300.0, 384.0, 40.0);
        let d = e.update(&mut slot).expect("discontinuity");

        assert_eq!(d.raw_vel_x, -200.0);
        assert_eq!(slot.dist_x, 0.0);
        assert_eq!(slot.dist_y, 0.0);
        assert_eq!(slot.start_x, 300.0);
        assert_eq!(slot.start_bottom, 384.0);
        assert_eq!(slot.vel_x, AxisVelocity::default());
        assert_eq!(slot.vel_y, AxisVelocity::default());
        assert_eq!(slot.prev_x, 300.0);
    }

    #[test]
    fn every_limit_triggers() {
        let e = engine(320);

        // vertical jump
        let mut slot = settled_slot();
        place(&mut slot, 500.0, 410.0, 40.0);
        assert!(e.update(&mut slot).is_some());
        assert_eq!((slot.dist_x, slot.dist_y), (0.0, 0.0));

        // acceleration
        let mut slot = settled_slot();
        slot.vel_x = AxisVelocity {
            raw: 0.5,
            filtered: 0.5,
            initialized: true,
        };
        slot.prev_filtered_vel_x = 0.5;
        place(&mut slot, 510.0, 380.0, 40.0);
        let d = e.update(&mut slot).expect("acceleration");
        assert_approx_eq!(d.accel, 4.75);

        // width change
        let mut slot = settled_slot();
        slot.vel_x.initialized = true;
        slot.vel_x.filtered = 0.5;
        slot.prev_filtered_vel_x = 0.5;
        place(&mut slot, 500.0, 380.0, 70.0);
        let d = e.update(&mut slot).expect("width");
        assert_eq!(d.delta_width, 30.0);
        assert_eq!((slot.dist_x, slot.dist_y), (0.0, 0.0));
    }
}

use ndarray::Zip;
use serde_derive::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::frame::{image_dims, GrayImage};
use crate::math;
use crate::motion::MotionState;

/// What the background model did with a frame
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adaptation {
    Hold,
    /// fast background moved towards the current frame
    Blend,
    /// fast background restored from the base at the start of a motion run
    Snap,
    /// both backgrounds replaced by the current frame
    Reset,
}

/// Fast adapting background plus the slow base it falls back to when
/// motion starts, so a moving object does not burn into the reference.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    fast: GrayImage,
    slow: GrayImage,
    last_max_diff: u8,
    frac_f: f32,
    no_motion_limit: u32,
    reset_idle_frames: u32,
    reset_max_diff: u8,
}

impl BackgroundModel {
    pub fn new(first: GrayImage, cfg: &Config) -> Self {
        Self {
            slow: first.clone(),
            fast: first,
            last_max_diff: 0,
            frac_f: cfg.frac_f,
            no_motion_limit: cfg.no_motion_limit,
            reset_idle_frames: cfg.reset_idle_frames,
            reset_max_diff: cfg.reset_max_diff,
        }
    }

    /// Reference the current frame is differenced against
    #[inline]
    pub fn background(&self) -> &GrayImage {
        &self.fast
    }

    #[inline]
    pub fn base(&self) -> &GrayImage {
        &self.slow
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        image_dims(&self.fast)
    }

    /// Peak difference segmentation found against the background, consulted
    /// by the next `adapt` call.
    #[inline]
    pub fn observe_max_diff(&mut self, max_diff: u8) {
        self.last_max_diff = max_diff;
    }

    fn blend(&mut self, current: &GrayImage) {
        let frac = self.frac_f;

        Zip::from(&mut self.fast).and(current).for_each(|bg, &px| {
            let v = math::ema(frac, px as f32, *bg as f32);
            *bg = v.round().clamp(0.0, 255.0) as u8;
        });
    }

    /// Updates the references before `current` is segmented. A hard reset
    /// also restarts the idle count of `state`.
    pub fn adapt(&mut self, current: &GrayImage, state: &mut MotionState) -> Result<Adaptation, Error> {
        let dims = image_dims(current);
        if dims != self.dims() {
            return Err(Error::FrameSize {
                expected: self.dims(),
                got: dims,
            });
        }

        let mut result = Adaptation::Hold;

        if state.no_motion_count > self.no_motion_limit {
            self.blend(current);
            result = Adaptation::Blend;
        }

        if state.motion_count == 1 {
            self.fast.assign(&self.slow);
            result = Adaptation::Snap;
        }

        if state.no_motion_count > self.reset_idle_frames && self.last_max_diff < self.reset_max_diff {
            self.fast.assign(current);
            self.slow.assign(current);
            state.reset_idle();

            log::info!("background reset (peak difference {})", self.last_max_diff);
            result = Adaptation::Reset;
        }

        Ok(result)
    }
}

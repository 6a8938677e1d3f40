/// Consecutive motion / no-motion frame counters of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionState {
    pub motion_count: u32,
    pub no_motion_count: u32,
}

impl MotionState {
    /// Motion was already present on the previous frame as well, the first
    /// frames of a run are often spurious.
    #[inline]
    pub fn is_sustained(&self) -> bool {
        self.motion_count > 1
    }

    /// Advances the counters at the end of a frame. Returns the length of
    /// the motion run when this frame ended one.
    pub fn end_frame(&mut self, motion_detected: bool) -> Option<u32> {
        if motion_detected {
            self.no_motion_count = 0;
            self.motion_count += 1;

            return None;
        }

        let ended = if self.no_motion_count == 0 && self.motion_count != 0 {
            Some(self.motion_count)
        } else {
            None
        };

        self.no_motion_count += 1;
        self.motion_count = 0;

        ended
    }

    /// Background was rebuilt, start counting idle frames afresh
    #[inline]
    pub fn reset_idle(&mut self) {
        self.no_motion_count = 0;
    }
}

use serde_derive::Serialize;

use crate::bbox::{BBox, Ltwh};
use crate::detection::Blob;

/// Per-axis velocity state. `initialized` is cleared whenever the smoothed
/// value has to restart from the next raw sample, independent of the
/// smoothed value itself (a settled velocity of exactly zero stays smoothed).
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisVelocity {
    pub raw: f32,
    pub filtered: f32,
    pub initialized: bool,
}

impl AxisVelocity {
    #[inline]
    pub fn clear(&mut self) {
        self.raw = 0.0;
        self.filtered = 0.0;
        self.initialized = false;
    }
}

/// Tracking record for one candidate object, reused across frames.
///
/// Fields persist until overwritten, except `width`/`height` which are
/// zeroed at the start of every frame.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Slot {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub area: f32,
    pub center_x: f32,
    pub center_y: f32,

    pub prev_area: f32,
    pub prev_width: f32,
    // left edge on the previous update, x velocity reference
    pub prev_x: f32,
    pub prev_bottom: f32,

    // where the current contiguous track began
    pub start_x: f32,
    pub start_bottom: f32,

    pub dist_x: f32,
    pub dist_y: f32,

    pub vel_x: AxisVelocity,
    pub vel_y: AxisVelocity,
    pub prev_filtered_vel_x: f32,
    pub delta_width: f32,

    /// a blob was assigned to this slot in the current frame
    pub updated: bool,
    /// the slot satisfies the event rule in the current frame
    pub in_event: bool,
}

impl Slot {
    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn bbox(&self) -> BBox<Ltwh> {
        BBox::ltwh(self.x, self.y, self.width, self.height)
    }

    pub fn assign(&mut self, blob: &Blob) {
        let center = blob.center();

        self.x = blob.x;
        self.y = blob.y;
        self.width = blob.w;
        self.height = blob.h;
        self.area = blob.area;
        self.center_x = center.x;
        self.center_y = center.y;
        self.updated = true;
    }

    #[inline]
    pub fn begin_frame(&mut self) {
        self.width = 0.0;
        self.height = 0.0;
        self.updated = false;
        self.in_event = false;
    }

    /// Forgets the smoothed velocities so the next update restarts them
    pub fn reset_velocity(&mut self) {
        self.vel_x.filtered = 0.0;
        self.vel_x.initialized = false;
        self.vel_y.filtered = 0.0;
        self.vel_y.initialized = false;
        self.prev_filtered_vel_x = 0.0;
    }
}

/// Fixed capacity table of slots indexed by slot number
#[derive(Debug, Clone)]
pub struct SlotStore {
    slots: Vec<Slot>,
}

impl SlotStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default(); capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx)
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Slot> {
        self.slots.get_mut(idx)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    pub fn begin_frame(&mut self) {
        self.slots.iter_mut().for_each(Slot::begin_frame);
    }

    pub fn reset_velocities(&mut self) {
        self.slots.iter_mut().for_each(Slot::reset_velocity);
    }
}

impl std::ops::Index<usize> for SlotStore {
    type Output = Slot;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.slots[index]
    }
}

impl std::ops::IndexMut<usize> for SlotStore {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.slots[index]
    }
}

use serde_derive::Serialize;

use crate::background::{Adaptation, BackgroundModel};
use crate::config::{Config, Thresholds};
use crate::error::Error;
use crate::event::{EventDecision, EventRecord};
use crate::filter::CandidateFilter;
use crate::frame::{image_dims, Frame, GrayImage};
use crate::motion::MotionState;
use crate::segment::Segmentation;
use crate::slot::{Slot, SlotStore};
use crate::velocity::{Discontinuity, VelocityEngine};

/// Everything a renderer or logger needs to know about one frame
#[derive(Serialize, Debug, Clone)]
pub struct FrameReport {
    pub index: u64,
    pub dims: (u32, u32),
    /// snapshot of the whole slot store after the per-slot updates
    pub slots: Vec<Slot>,
    /// slots `0..assigned` received a blob this frame
    pub assigned: usize,
    pub motion_detected: bool,
    /// motion was already present on earlier frames, events are reported
    pub sustained: bool,
    /// measurement of the primary slot
    pub event: Option<EventRecord>,
    /// length of the motion run this frame ended
    pub motion_ended: Option<u32>,
    pub background: Adaptation,
    #[serde(skip)]
    pub discontinuities: Vec<(usize, Discontinuity)>,
}

/// Per-frame tracking core of a session
pub struct MotionTracker {
    config: Config,
    thresholds: Thresholds,
    filter: CandidateFilter,
    velocity: VelocityEngine,
    decision: EventDecision,
    slots: SlotStore,
    motion: MotionState,
    background: Option<BackgroundModel>,
    frames: u64,
}

impl MotionTracker {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let thresholds = Thresholds::from(&config);

        Ok(Self {
            filter: CandidateFilter::new(&config, &thresholds),
            velocity: VelocityEngine::new(&config, &thresholds),
            decision: EventDecision::new(&config, &thresholds),
            slots: SlotStore::new(config.max_objects),
            motion: MotionState::default(),
            background: None,
            frames: 0,
            thresholds,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[inline]
    pub fn decision(&self) -> &EventDecision {
        &self.decision
    }

    #[inline]
    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    #[inline]
    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    #[inline]
    pub fn background(&self) -> Option<&BackgroundModel> {
        self.background.as_ref()
    }

    /// Runs filter, velocity, event decision and the motion counters over
    /// one segmented frame.
    pub fn update(&mut self, frame: &Frame) -> FrameReport {
        self.slots.begin_frame();

        let assigned = self.filter.apply(frame, &mut self.slots);
        let sustained = self.motion.is_sustained();
        let dims = (self.config.processing_width as f32, frame.height());

        let mut motion_detected = false;
        let mut event = None;
        let mut discontinuities = Vec::new();

        for idx in 0..assigned {
            let slot = &mut self.slots[idx];

            if let Some(d) = self.velocity.update(slot) {
                log::debug!(
                    "reset slot {}: big change -> new object (xv:{:5.1} yv:{:5.1} av:{:5.1} dXW:{:5.1})",
                    idx,
                    d.raw_vel_x,
                    d.raw_vel_y,
                    d.accel,
                    d.delta_width
                );
                discontinuities.push((idx, d));
            }

            if self.decision.is_event(slot) {
                slot.in_event = true;
                motion_detected = true;

                // slot 0 is taken as the primary measurement
                if sustained && idx == 0 {
                    event = Some(self.decision.record(slot, dims));
                }
            }
        }

        // renderers see the slots as updated, before an idle frame clears them
        let slots = self.slots.as_slice().to_vec();

        let motion_ended = self.motion.end_frame(motion_detected);
        if !motion_detected {
            self.slots.reset_velocities();
        }

        if let Some(duration) = motion_ended {
            log::info!("motion end after {} frames", duration);
        }

        FrameReport {
            index: frame.index,
            dims: frame.dims,
            slots,
            assigned,
            motion_detected,
            sustained,
            event,
            motion_ended,
            background: Adaptation::Hold,
            discontinuities,
        }
    }

    /// Feeds one grayscale frame through background adaptation,
    /// segmentation and [`update`](Self::update). The first frame only
    /// seeds the background and yields no report.
    pub fn process<S>(&mut self, gray: &GrayImage, segmentation: &mut S) -> Result<Option<FrameReport>, Error>
    where
        S: Segmentation + ?Sized,
    {
        let (width, height) = image_dims(gray);
        if width != self.config.processing_width as usize {
            return Err(Error::FrameSize {
                expected: (self.config.processing_width as usize, height),
                got: (width, height),
            });
        }

        let index = self.frames;
        self.frames += 1;

        let bg = match self.background.as_mut() {
            Some(bg) => bg,
            None => {
                self.background = Some(BackgroundModel::new(gray.clone(), &self.config));
                return Ok(None);
            }
        };

        let adaptation = bg.adapt(gray, &mut self.motion)?;
        if adaptation != Adaptation::Hold {
            log::debug!("frame {}: background {:?}", index, adaptation);
        }

        let segmented = segmentation.segment(bg.background(), gray)?;
        bg.observe_max_diff(segmented.max_diff);

        let frame = Frame::new(index, (width as u32, height as u32), segmented.blobs);
        let mut report = self.update(&frame);
        report.background = adaptation;

        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Blob;
    use crate::segment::Segmented;
    use ndarray::Array2;

    fn tracker() -> MotionTracker {
        MotionTracker::new(Config::default().with_processing_width(320)).unwrap()
    }

    /// single object at `x`, close to the bottom of the frame
    fn moving_frame(index: u64, x: f32) -> Frame {
        Frame::new(index, (320, 240), vec![Blob::new(x, 180.0, 40.0, 30.0, 1200.0)])
    }

    #[test]
    fn first_motion_frames_are_not_reported() {
        let mut t = tracker();
        let mut reports = Vec::new();

        for i in 0..12 {
            reports.push(t.update(&moving_frame(i, 250.0 - 3.0 * i as f32)));
        }

        let first = reports.iter().position(|r| r.motion_detected).expect("motion");
        assert!(reports[first].event.is_none());
        assert!(reports[first + 1].event.is_none());
        assert_eq!(t.motion().motion_count as usize, 12 - first);

        let rec = reports[first + 2].event.expect("reported event");
        assert_eq!(rec.x, reports[first + 2].slots[0].x);
        assert_eq!(rec.inverted_y, 30.0);
        assert!(rec.corrected_vel_x < -3.0);
        assert!(rec.dist_x < -15.0);
    }

    #[test]
    fn motion_end_resets_velocities() {
        let mut t = tracker();
        for i in 0..12 {
            t.update(&moving_frame(i, 250.0 - 3.0 * i as f32));
        }
        let run = t.motion().motion_count;
        assert!(run > 1);

        let report = t.update(&Frame::new(12, (320, 240), vec![]));
        assert_eq!(report.motion_ended, Some(run));
        assert!(!report.motion_detected);
        assert_eq!(report.assigned, 0);
        for slot in t.slots().iter() {
            assert_eq!(slot.vel_x.filtered, 0.0);
            assert_eq!(slot.vel_y.filtered, 0.0);
            assert_eq!(slot.prev_filtered_vel_x, 0.0);
            assert!(!slot.vel_x.initialized && !slot.vel_y.initialized);
            assert_eq!(slot.width, 0.0);
        }

        let report = t.update(&Frame::new(13, (320, 240), vec![]));
        assert_eq!(report.motion_ended, None);
        assert_eq!(t.motion().no_motion_count, 2);
    }

    #[test]
    fn only_primary_slot_is_reported() {
        let mut t = tracker();
        let mut last = None;

        for i in 0..12 {
            let frame = Frame::new(
                i,
                (320, 240),
                vec![
                    Blob::new(100.0, 180.0, 40.0, 30.0, 100.0),
                    Blob::new(250.0 - 3.0 * i as f32, 180.0, 40.0, 30.0, 1200.0),
                ],
            );
            last = Some(t.update(&frame));
        }

        // the small blob is filtered out, the mover lands in slot 0
        let last = last.unwrap();
        assert_eq!(last.assigned, 1);
        assert!(last.event.is_some());
    }

    struct Fixed(Vec<Blob>, u8);

    impl Segmentation for Fixed {
        fn segment(&mut self, _: &GrayImage, _: &GrayImage) -> Result<Segmented, Error> {
            Ok(Segmented {
                blobs: self.0.clone(),
                max_diff: self.1,
            })
        }
    }

    #[test]
    fn process_seeds_background_first() {
        let mut t = tracker();
        let mut seg = Fixed(vec![], 0);
        let gray = Array2::from_elem((240, 320), 10u8);

        assert!(t.process(&gray, &mut seg).unwrap().is_none());
        assert!(t.background().is_some());

        let report = t.process(&gray, &mut seg).unwrap().expect("report");
        assert_eq!(report.index, 1);
        assert_eq!(report.dims, (320, 240));

        let err = t.process(&Array2::zeros((240, 640)), &mut seg).unwrap_err();
        assert!(matches!(err, Error::FrameSize { .. }));
    }

    #[test]
    fn background_adaptation_is_reported() {
        let mut t = tracker();
        let mut seg = Fixed(vec![], 0);
        let gray = Array2::from_elem((240, 320), 10u8);
        t.process(&gray, &mut seg).unwrap();

        let adaptations: Vec<_> = (0..7)
            .map(|_| t.process(&gray, &mut seg).unwrap().expect("report").background)
            .collect();

        // blending starts once the scene has been idle for long enough
        assert!(adaptations[..6].iter().all(|a| *a == Adaptation::Hold));
        assert_eq!(adaptations[6], Adaptation::Blend);

        // the frame after the first motion frame segments against the base
        let mut reports = Vec::new();
        for i in 0..12 {
            seg.0 = vec![Blob::new(250.0 - 3.0 * i as f32, 180.0, 40.0, 30.0, 1200.0)];
            reports.push(t.process(&gray, &mut seg).unwrap().expect("report"));
        }

        let first = reports.iter().position(|r| r.motion_detected).expect("motion");
        assert_eq!(reports[first + 1].background, Adaptation::Snap);
        assert_ne!(reports[first + 2].background, Adaptation::Snap);
    }
}

use std::sync::atomic::AtomicBool;

use mtrack::csv::CsvSink;
use mtrack::segment::DiffSegmenter;
use mtrack::session::MemorySource;
use mtrack::{Blob, Config, Frame, FrameReport, GrayImage, MotionTracker, Session};
use ndarray::Array2;

fn tracker(width: u32) -> MotionTracker {
    MotionTracker::new(Config::default().with_processing_width(width)).unwrap()
}

/// object sliding left by `step` px per frame near the bottom of a 320x240 view
fn mover(index: u64, step: f32) -> Frame {
    Frame::new(
        index,
        (320, 240),
        vec![Blob::new(250.0 - step * index as f32, 180.0, 40.0, 30.0, 1200.0)],
    )
}

#[test]
fn slow_turn_is_not_a_new_track() {
    let mut t = tracker(1296);
    let dims = (1296, 729);

    t.update(&Frame::new(0, dims, vec![Blob::new(500.0, 350.0, 40.0, 30.0, 9000.0)]));
    let report = t.update(&Frame::new(1, dims, vec![Blob::new(480.0, 354.0, 42.0, 30.0, 9000.0)]));

    let slot = &report.slots[0];
    assert_eq!(report.assigned, 1);
    assert!(report.discontinuities.is_empty());
    assert_eq!(slot.vel_x.raw, -20.0);
    assert_eq!(slot.vel_y.raw, 4.0);
    // first sample after a reset is taken verbatim
    assert_eq!(slot.vel_x.filtered, -20.0);
    assert_eq!(slot.dist_x, -20.0);
    assert_eq!(slot.dist_y, 4.0);
}

#[test]
fn event_never_reported_on_first_motion_frame() {
    for step in [2.0, 3.0, 5.0, 8.0] {
        let mut t = tracker(320);
        let mut motion_before = 0;

        for i in 0..20 {
            let report = t.update(&mover(i, step));
            if report.event.is_some() {
                assert!(motion_before > 1, "reported with motion count {}", motion_before);
            }
            if report.motion_detected && motion_before == 0 {
                assert!(report.event.is_none());
            }
            motion_before = t.motion().motion_count;
        }
    }
}

#[test]
fn motion_end_notice_is_emitted_once() {
    let mut t = tracker(320);
    let mut i = 0;

    while t.motion().motion_count < 7 {
        t.update(&mover(i, 3.0));
        i += 1;
        assert!(i < 50);
    }

    let mut notices = Vec::new();
    for k in 0..4 {
        let report = t.update(&Frame::new(i + k, (320, 240), vec![]));
        notices.extend(report.motion_ended);

        if k == 0 {
            assert!(t
                .slots()
                .iter()
                .all(|s| s.vel_x.filtered == 0.0 && s.vel_y.filtered == 0.0 && s.prev_filtered_vel_x == 0.0));
        }
    }

    assert_eq!(notices, vec![7]);
}

#[test]
fn decisions_are_resolution_independent() {
    let frames: Vec<Vec<Blob>> = (0..30)
        .map(|i| {
            let i = i as f32;
            let mut blobs = vec![
                Blob::new(140.0 - 2.0 * i, 170.0 + 0.5 * i, 30.0 + (i % 3.0), 24.0, 700.0),
                Blob::new(20.0 + 7.0 * i, 150.0, 20.0, 30.0, 520.0),
                Blob::new(100.0, 10.0, 50.0, 40.0, 2000.0),
                Blob::new(60.0, 200.0, 8.0, 8.0, 60.0),
            ];
            if i as u32 % 7 == 3 {
                blobs.swap(0, 1);
            }
            if i as u32 % 11 == 5 {
                blobs.push(Blob::new(280.0, 190.0, 36.0, 36.0, 1296.0));
            }
            blobs
        })
        .collect();

    let mut low = tracker(320);
    let mut high = tracker(640);

    for (idx, blobs) in frames.iter().enumerate() {
        let scaled = blobs.iter().map(|b| b.scaled(2.0)).collect();
        let a = low.update(&Frame::new(idx as u64, (320, 240), blobs.clone()));
        let b = high.update(&Frame::new(idx as u64, (640, 480), scaled));

        let outliers = |r: &FrameReport| r.discontinuities.iter().map(|(i, _)| *i).collect::<Vec<_>>();
        let events = |r: &FrameReport| r.slots.iter().map(|s| s.in_event).collect::<Vec<_>>();

        assert_eq!(a.assigned, b.assigned, "frame {}", idx);
        assert_eq!(outliers(&a), outliers(&b), "frame {}", idx);
        assert_eq!(events(&a), events(&b), "frame {}", idx);
        assert_eq!(a.event.is_some(), b.event.is_some(), "frame {}", idx);
        assert_eq!(a.motion_ended, b.motion_ended, "frame {}", idx);
    }
}

fn scene(object_x: Option<usize>) -> GrayImage {
    let mut img = Array2::from_elem((240, 320), 40u8);
    if let Some(x) = object_x {
        for r in 190..210 {
            for c in x..x + 30 {
                img[[r, c]] = 200;
            }
        }
    }
    img
}

#[test]
fn pixels_to_csv() {
    let frames: Vec<GrayImage> = (0..25)
        .map(|i| match i {
            3..=19 => scene(Some(260 - 4 * (i - 3))),
            _ => scene(None),
        })
        .collect();

    let config = Config::default().with_processing_width(320);
    let t = MotionTracker::new(config.clone()).unwrap();
    let segmenter = DiffSegmenter::new(&config, t.thresholds());
    let mut session = Session::new(t, segmenter);
    let mut sink = (Vec::<FrameReport>::new(), CsvSink::new(Vec::new()));

    let stats = session
        .run(&mut MemorySource::from(frames), &mut sink, &AtomicBool::new(false))
        .unwrap();

    // the first frame only seeds the background
    assert_eq!(stats.frames, 24);
    assert_eq!(stats.motion_runs, 1);
    assert_eq!(stats.events, 11);

    let (reports, csv) = sink;
    let ended: Vec<u32> = reports.iter().filter_map(|r| r.motion_ended).collect();
    assert_eq!(ended, vec![13]);

    for rec in reports.iter().filter_map(|r| r.event) {
        assert!(rec.corrected_vel_x < -4.0);
        assert!(rec.dist_x < -15.0);
        assert_eq!(rec.inverted_y, 240.0 - 212.0);
        assert_eq!(rec.width, 34.0);
    }

    let text = String::from_utf8(csv.into_inner()).unwrap();
    let rows = text.lines().filter(|l| !l.starts_with('#')).count();
    assert_eq!(rows, 11);
    assert!(text.contains("# motion end after 13 frames"));
    assert!(text.lines().last().unwrap().starts_with("# EOF frames = 24"));
}

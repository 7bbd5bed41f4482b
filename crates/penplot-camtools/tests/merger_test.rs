use penplot_camtools::{merge_polylines, merge_segments};
use penplot_core::{Point, Polyline, Segment, DEFAULT_TOLERANCE};

fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
    Segment::new(Point::new(x0, y0), Point::new(x1, y1))
}

#[test]
fn test_collinear_segments_join() {
    let merged = merge_segments(
        &[seg(0.0, 0.0, 1.0, 0.0), seg(1.0, 0.0, 2.0, 0.0)],
        DEFAULT_TOLERANCE,
    );
    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[0].points(),
        &[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0)
        ]
    );
}

#[test]
fn test_merge_is_idempotent() {
    let segments = vec![
        seg(0.0, 0.0, 1.0, 0.0),
        seg(1.0, 0.0, 1.0, 1.0),
        seg(5.0, 5.0, 6.0, 5.0),
        seg(6.0, 5.0, 6.0, 7.0),
        seg(10.0, 0.0, 11.0, 0.0),
        seg(20.0, 20.0, 10.0, 0.0),
    ];
    let once = merge_segments(&segments, DEFAULT_TOLERANCE);
    let twice = merge_polylines(&once, DEFAULT_TOLERANCE);
    assert_eq!(once, twice);
}

#[test]
fn test_disjoint_polylines_unchanged() {
    let polylines = vec![
        Polyline::new(vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(3.0, 3.0)]),
        Polyline::new(vec![Point::new(10.0, 10.0), Point::new(12.0, 10.0)]),
    ];
    assert_eq!(merge_polylines(&polylines, DEFAULT_TOLERANCE), polylines);
}

#[test]
fn test_output_is_deterministic() {
    let segments: Vec<Segment> = (0..40)
        .map(|i| {
            let a = (i % 7) as f64;
            let b = (i % 5) as f64;
            seg(a, b, b, a + 1.0)
        })
        .collect();
    let first = merge_segments(&segments, DEFAULT_TOLERANCE);
    for _ in 0..5 {
        assert_eq!(merge_segments(&segments, DEFAULT_TOLERANCE), first);
    }
}

#[test]
fn test_every_segment_is_drawn_once() {
    let segments = vec![
        seg(0.0, 0.0, 1.0, 0.0),
        seg(1.0, 0.0, 1.0, 1.0),
        seg(1.0, 0.0, 2.0, 0.0),
        seg(1.0, 0.0, 1.0, -1.0),
    ];
    let merged = merge_segments(&segments, DEFAULT_TOLERANCE);
    let drawn: usize = merged.iter().map(|pl| pl.len() - 1).sum();
    assert_eq!(drawn, segments.len());
    let length: f64 = merged.iter().map(Polyline::length).sum();
    assert!((length - 4.0).abs() < 1e-12);
}

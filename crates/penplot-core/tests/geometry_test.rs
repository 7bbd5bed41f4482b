use penplot_core::{
    Area, BoundingBox, Drawing, Layer, PlotterProfile, Point, Polyline, DEFAULT_TOLERANCE,
};
use proptest::prelude::*;

fn arb_points() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-1000.0..1000.0f64, -1000.0..1000.0f64), 2..20)
        .prop_map(|raw| raw.into_iter().map(Point::from).collect())
}

proptest! {
    #[test]
    fn prop_reversal_keeps_length(points in arb_points()) {
        if let Some(polyline) = Polyline::from_points(points, DEFAULT_TOLERANCE) {
            let reversed = polyline.reversed();
            prop_assert!((reversed.length() - polyline.length()).abs() < 1e-9);
            prop_assert_eq!(reversed.start(), polyline.end());
            prop_assert_eq!(reversed.reversed(), polyline);
        }
    }

    #[test]
    fn prop_bounding_box_contains_points(points in arb_points()) {
        let bb = BoundingBox::from_points(points.iter().copied());
        for p in &points {
            prop_assert!(p.x >= bb.min_x && p.x <= bb.max_x);
            prop_assert!(p.y >= bb.min_y && p.y <= bb.max_y);
        }
    }

    #[test]
    fn prop_translation_moves_bounds(points in arb_points(), dx in -100.0..100.0f64, dy in -100.0..100.0f64) {
        let drawing = Drawing::new(vec![Layer::new("ink", vec![Polyline::new(points)])]);
        let before = drawing.bounding_box();
        let after = drawing.translated(dx, dy).bounding_box();
        prop_assert!((after.min_x - (before.min_x + dx)).abs() < 1e-9);
        prop_assert!((after.max_y - (before.max_y + dy)).abs() < 1e-9);
    }
}

#[test]
fn test_from_points_needs_two_distinct_points() {
    let same = vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0 + 1e-9)];
    assert!(Polyline::from_points(same, DEFAULT_TOLERANCE).is_none());

    let pl = Polyline::from_points(
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
        ],
        DEFAULT_TOLERANCE,
    )
    .unwrap();
    assert_eq!(pl.len(), 2);
}

#[test]
fn test_scaling_keeps_frame() {
    let drawing = Drawing::new(vec![Layer::new(
        "ink",
        vec![Polyline::new(vec![Point::new(10.0, 10.0), Point::new(20.0, 30.0)])],
    )])
    .with_frame(BoundingBox::from_size(100.0, 200.0));
    let scaled = drawing.scaled(0.5);
    assert_eq!(scaled.frame(), Some(BoundingBox::from_size(50.0, 100.0)));
    assert_eq!(scaled.bounding_box(), BoundingBox::new(5.0, 5.0, 10.0, 15.0));
}

#[test]
fn test_empty_box_fits_anywhere() {
    assert!(BoundingBox::empty().fits_within(&Area::new(1.0, 1.0), 0.0));
    assert_eq!(BoundingBox::empty().width(), 0.0);
}

#[test]
fn test_profile_serde_round_trip() {
    let profile = PlotterProfile {
        invert_y: true,
        ..PlotterProfile::with_area(Area::new(300.0, 200.0))
    };
    let json = serde_json::to_string(&profile).unwrap();
    let back: PlotterProfile = serde_json::from_str(&json).unwrap();
    assert_eq!(back, profile);
}

use penplot_camtools::{travel_distance, TourOptimizer};
use penplot_core::{Point, Polyline};
use proptest::prelude::*;

fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Polyline {
    Polyline::new(vec![Point::new(x0, y0), Point::new(x1, y1)])
}

/// Exhaustive minimum over every order and orientation.
fn brute_force(polylines: &[Polyline]) -> f64 {
    fn search(
        polylines: &[Polyline],
        used: &mut Vec<bool>,
        pen: Point,
        cost: f64,
        best: &mut f64,
    ) {
        if used.iter().all(|u| *u) {
            *best = best.min(cost);
            return;
        }
        for i in 0..polylines.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let pl = &polylines[i];
            search(polylines, used, pl.end(), cost + pen.distance_to(&pl.start()), best);
            search(polylines, used, pl.start(), cost + pen.distance_to(&pl.end()), best);
            used[i] = false;
        }
    }
    let mut best = f64::INFINITY;
    search(
        polylines,
        &mut vec![false; polylines.len()],
        Point::origin(),
        0.0,
        &mut best,
    );
    best
}

#[test]
fn test_square_corners_reach_optimum() {
    // short strokes at the corners of a 10mm square, listed out of order
    let polylines = vec![
        line(20.0, 20.0, 21.0, 20.0),
        line(10.0, 10.0, 11.0, 10.0),
        line(10.0, 20.0, 11.0, 20.0),
        line(20.0, 10.0, 21.0, 10.0),
    ];
    let tour = TourOptimizer::default().optimize(&polylines);
    let optimum = brute_force(&polylines);
    assert!((tour.final_travel - optimum).abs() < 1e-9);
    assert!((optimum - (200.0f64.sqrt() + 28.0)).abs() < 1e-9);
}

#[test]
fn test_tour_is_a_permutation() {
    let polylines: Vec<Polyline> = (0..30)
        .map(|i| {
            let x = ((i * 13) % 29) as f64;
            let y = ((i * 7) % 31) as f64;
            line(x, y, x + 1.5, y - 0.5)
        })
        .collect();
    let tour = TourOptimizer::default().optimize(&polylines);
    let mut indices: Vec<usize> = tour.steps.iter().map(|s| s.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..30).collect::<Vec<_>>());
    assert!(
        (travel_distance(&tour.polylines, Point::origin()) - tour.final_travel).abs() < 1e-9
    );
}

#[test]
fn test_deterministic() {
    let polylines: Vec<Polyline> = (0..20)
        .map(|i| line(i as f64 % 4.0, (i / 4) as f64, i as f64 % 4.0 + 0.5, (i / 4) as f64))
        .collect();
    let optimizer = TourOptimizer::default();
    assert_eq!(optimizer.optimize(&polylines), optimizer.optimize(&polylines));
}

fn arb_polylines(max: usize) -> impl Strategy<Value = Vec<Polyline>> {
    prop::collection::vec(
        (0.0..200.0f64, 0.0..200.0f64, 0.5..20.0f64, 0.5..20.0f64),
        0..max,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(x, y, dx, dy)| line(x, y, x + dx, y + dy))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_2opt_never_degrades(polylines in arb_polylines(25)) {
        let tour = TourOptimizer::default().optimize(&polylines);
        prop_assert!(tour.final_travel <= tour.initial_travel + 1e-9);
        prop_assert_eq!(tour.polylines.len(), polylines.len());
    }

    #[test]
    fn prop_never_beats_exhaustive_search(polylines in arb_polylines(6)) {
        let tour = TourOptimizer::default().optimize(&polylines);
        // 2-opt is a local search; it can only match or exceed the optimum
        prop_assert!(tour.final_travel + 1e-9 >= brute_force(&polylines));
    }
}

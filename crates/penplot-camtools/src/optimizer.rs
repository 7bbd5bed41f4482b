//! Tour Optimizer
//!
//! Orders a layer's polylines to minimize pen-up travel.
//!
//! # Algorithm
//!
//! 1. **Nearest Neighbor**: starting at the home position, repeatedly pick
//!    the unvisited polyline endpoint closest to the pen, considering both
//!    orientations, and flip the polyline when its end was the nearer one.
//! 2. **2-opt**: reverse a contiguous run of the tour (which also flips every
//!    polyline in it) whenever that strictly shortens total travel. Passes
//!    repeat until one finds no improvement or the pass/time budget runs out.
//!
//! Travel is the Euclidean length of every pen-up move, including the first
//! one from home. The final return to home is not part of the cost.

use crate::cancel::CancellationFlag;
use penplot_core::{Point, Polyline, Result, DEFAULT_TOLERANCE};
use std::time::{Duration, Instant};

/// Improvements smaller than this are treated as noise.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Optimizer parameters
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOptions {
    /// Distances within this tolerance count as ties during construction
    pub tolerance: f64,
    /// Upper bound on 2-opt passes
    pub max_passes: usize,
    /// Optional wall-clock budget for 2-opt
    pub time_budget: Option<Duration>,
    /// Pen position before the first move
    pub home: Point,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_passes: 2000,
            time_budget: None,
            home: Point::origin(),
        }
    }
}

/// One visited polyline: its input index and whether it is drawn backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourStep {
    pub index: usize,
    pub reversed: bool,
}

/// Result of tour optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    /// Visiting order
    pub steps: Vec<TourStep>,
    /// Polylines in visiting order, oriented as drawn
    pub polylines: Vec<Polyline>,
    /// Travel after nearest-neighbor construction
    pub initial_travel: f64,
    /// Travel after 2-opt
    pub final_travel: f64,
    /// 2-opt passes performed
    pub passes: usize,
}

/// Entry/exit points of a polyline as currently oriented.
#[derive(Debug, Clone, Copy)]
struct Oriented {
    index: usize,
    reversed: bool,
    entry: Point,
    exit: Point,
}

impl Oriented {
    fn new(index: usize, polyline: &Polyline, reversed: bool) -> Self {
        let (entry, exit) = if reversed {
            (polyline.end(), polyline.start())
        } else {
            (polyline.start(), polyline.end())
        };
        Self {
            index,
            reversed,
            entry,
            exit,
        }
    }

    fn flip(&mut self) {
        self.reversed = !self.reversed;
        std::mem::swap(&mut self.entry, &mut self.exit);
    }
}

/// Total pen-up travel for polylines drawn in the given order and orientation.
pub fn travel_distance(polylines: &[Polyline], home: Point) -> f64 {
    let mut pen = home;
    let mut total = 0.0;
    for pl in polylines {
        total += pen.distance_to(&pl.start());
        pen = pl.end();
    }
    total
}

fn tour_cost(tour: &[Oriented], home: Point) -> f64 {
    let mut pen = home;
    let mut total = 0.0;
    for step in tour {
        total += pen.distance_to(&step.entry);
        pen = step.exit;
    }
    total
}

/// Nearest-neighbor + 2-opt tour builder
#[derive(Debug, Clone, Default)]
pub struct TourOptimizer {
    options: OptimizerOptions,
}

impl TourOptimizer {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Optimizes without a cancellation signal. Never fails.
    pub fn optimize(&self, polylines: &[Polyline]) -> Tour {
        self.run(polylines, None)
    }

    /// Optimizes, aborting at the next pass boundary once `cancel` is raised.
    pub fn optimize_cancellable(
        &self,
        polylines: &[Polyline],
        cancel: &CancellationFlag,
    ) -> Result<Tour> {
        cancel.check()?;
        let tour = self.run(polylines, Some(cancel));
        cancel.check()?;
        Ok(tour)
    }

    fn run(&self, polylines: &[Polyline], cancel: Option<&CancellationFlag>) -> Tour {
        let mut tour = self.nearest_neighbor(polylines);
        let initial_travel = tour_cost(&tour, self.options.home);
        let passes = self.improve_2opt(&mut tour, cancel);

        let ordered: Vec<Polyline> = tour
            .iter()
            .map(|step| {
                let pl = &polylines[step.index];
                if step.reversed {
                    pl.reversed()
                } else {
                    pl.clone()
                }
            })
            .collect();
        let final_travel = travel_distance(&ordered, self.options.home);

        tracing::debug!(
            "Tour of {} polylines: travel {:.3} -> {:.3} mm in {} pass(es)",
            ordered.len(),
            initial_travel,
            final_travel,
            passes
        );

        Tour {
            steps: tour
                .iter()
                .map(|s| TourStep {
                    index: s.index,
                    reversed: s.reversed,
                })
                .collect(),
            polylines: ordered,
            initial_travel,
            final_travel,
            passes,
        }
    }

    /// Greedy construction. Ties within tolerance go to the lowest input
    /// index, and forward orientation wins over reversed.
    fn nearest_neighbor(&self, polylines: &[Polyline]) -> Vec<Oriented> {
        let n = polylines.len();
        let mut visited = vec![false; n];
        let mut tour = Vec::with_capacity(n);
        let mut pen = self.options.home;

        for _ in 0..n {
            let mut best: Option<(f64, Oriented)> = None;
            for (i, pl) in polylines.iter().enumerate() {
                if visited[i] {
                    continue;
                }
                for reversed in [false, true] {
                    let candidate = Oriented::new(i, pl, reversed);
                    let d = pen.distance_to(&candidate.entry);
                    let better = match best {
                        None => true,
                        Some((best_d, _)) => d < best_d - self.options.tolerance,
                    };
                    if better {
                        best = Some((d, candidate));
                    }
                }
            }

            let Some((_, step)) = best else { break };
            visited[step.index] = true;
            pen = step.exit;
            tour.push(step);
        }

        tour
    }

    /// Runs 2-opt passes in place and returns how many were performed.
    ///
    /// Reversing positions `i..=j` replaces the moves into `i` and out of `j`;
    /// interior moves keep their lengths, so each candidate is O(1).
    fn improve_2opt(&self, tour: &mut [Oriented], cancel: Option<&CancellationFlag>) -> usize {
        let n = tour.len();
        if n == 0 {
            return 0;
        }

        let started = Instant::now();
        let home = self.options.home;
        let mut passes = 0;

        while passes < self.options.max_passes {
            if cancel.is_some_and(CancellationFlag::is_cancelled) {
                break;
            }
            if let Some(budget) = self.options.time_budget {
                if started.elapsed() >= budget {
                    tracing::debug!("2-opt time budget exhausted after {} passes", passes);
                    break;
                }
            }

            passes += 1;
            let mut improved = false;

            for i in 0..n {
                for j in i..n {
                    let before = if i == 0 { home } else { tour[i - 1].exit };
                    let first = tour[i];
                    let last = tour[j];

                    let mut delta =
                        before.distance_to(&last.exit) - before.distance_to(&first.entry);
                    if j + 1 < n {
                        let after = tour[j + 1].entry;
                        delta += first.entry.distance_to(&after) - last.exit.distance_to(&after);
                    }

                    if delta < -IMPROVEMENT_EPSILON {
                        tour[i..=j].reverse();
                        for step in &mut tour[i..=j] {
                            step.flip();
                        }
                        improved = true;
                    }
                }
            }

            if !improved {
                break;
            }
        }

        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Polyline {
        Polyline::new(vec![Point::new(x0, y0), Point::new(x1, y1)])
    }

    #[test]
    fn test_empty_and_single() {
        let optimizer = TourOptimizer::default();
        let tour = optimizer.optimize(&[]);
        assert!(tour.polylines.is_empty());
        assert_eq!(tour.final_travel, 0.0);

        let tour = optimizer.optimize(&[line(5.0, 0.0, 3.0, 0.0)]);
        assert_eq!(tour.steps, vec![TourStep { index: 0, reversed: true }]);
        assert_eq!(tour.polylines[0].start(), Point::new(3.0, 0.0));
        assert!((tour.final_travel - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_neighbor_flips_when_end_is_closer() {
        let optimizer = TourOptimizer::default();
        let tour = optimizer.optimize(&[line(10.0, 0.0, 20.0, 0.0), line(2.0, 0.0, 1.0, 0.0)]);
        assert_eq!(tour.steps[0], TourStep { index: 1, reversed: true });
        assert_eq!(tour.steps[1], TourStep { index: 0, reversed: false });
        assert!((tour.final_travel - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_prefer_lowest_index_and_forward() {
        // both polylines start 5mm from home
        let optimizer = TourOptimizer::default();
        let tour = optimizer.optimize(&[line(0.0, 5.0, 0.0, 6.0), line(5.0, 0.0, 6.0, 0.0)]);
        assert_eq!(tour.steps[0].index, 0);

        // a closed polyline starts and ends at the same point
        let closed = Polyline::new(vec![
            Point::new(1.0, 1.0),
            Point::new(2.0, 1.0),
            Point::new(1.0, 1.0),
        ]);
        let tour = optimizer.optimize(&[closed]);
        assert!(!tour.steps[0].reversed);
    }

    #[test]
    fn test_2opt_never_worse_than_construction() {
        let polylines: Vec<Polyline> = (0..25)
            .map(|i| {
                let x = ((i * 37) % 23) as f64 * 4.0;
                let y = ((i * 11) % 17) as f64 * 6.0;
                line(x, y, x + 2.0, y + 1.0)
            })
            .collect();
        let tour = TourOptimizer::default().optimize(&polylines);
        assert!(tour.final_travel <= tour.initial_travel + 1e-9);
        assert_eq!(tour.polylines.len(), polylines.len());
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationFlag::new();
        cancel.cancel();
        let err = TourOptimizer::default()
            .optimize_cancellable(&[line(0.0, 0.0, 1.0, 0.0)], &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_zero_passes_keeps_construction() {
        let optimizer = TourOptimizer::new(OptimizerOptions {
            max_passes: 0,
            ..OptimizerOptions::default()
        });
        let tour = optimizer.optimize(&[line(0.0, 0.0, 1.0, 0.0), line(3.0, 0.0, 4.0, 0.0)]);
        assert_eq!(tour.passes, 0);
        assert!((tour.final_travel - tour.initial_travel).abs() < 1e-12);
    }
}

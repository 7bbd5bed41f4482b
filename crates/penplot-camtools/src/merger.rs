//! Segment Merger
//!
//! Joins segments whose endpoints coincide within a tolerance into longer
//! polylines so the pen is lifted fewer times.
//!
//! Endpoints are bucketed on a grid whose cell size is the tolerance, so a
//! lookup only needs the 3x3 block of cells around a point. Chains are
//! seeded in input order and grown from the tail first, then from the head.
//! When several pieces could extend a chain, the one whose far endpoint is
//! lexicographically smallest wins, then the lowest input index. The output
//! is therefore a pure function of the input sequence and the tolerance.

use penplot_core::{
    BoundingBox, Drawing, Layer, LayerSegments, Point, Polyline, Segment, SourceGeometry,
};
use std::collections::{HashMap, VecDeque};

type CellKey = (i64, i64);

/// Which end of a piece touched the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    End,
}

struct EndpointIndex {
    tolerance: f64,
    cells: HashMap<CellKey, Vec<(usize, End)>>,
}

impl EndpointIndex {
    fn build(pieces: &[Vec<Point>], tolerance: f64) -> Self {
        let mut index = Self {
            tolerance,
            cells: HashMap::new(),
        };
        for (i, piece) in pieces.iter().enumerate() {
            if let (Some(first), Some(last)) = (piece.first(), piece.last()) {
                index.insert(*first, i, End::Start);
                index.insert(*last, i, End::End);
            }
        }
        index
    }

    fn key(&self, p: Point) -> CellKey {
        (
            (p.x / self.tolerance).round() as i64,
            (p.y / self.tolerance).round() as i64,
        )
    }

    fn insert(&mut self, p: Point, piece: usize, end: End) {
        let key = self.key(p);
        self.cells.entry(key).or_default().push((piece, end));
    }

    /// Unused pieces with an endpoint within tolerance of `p`.
    fn candidates(&self, p: Point, pieces: &[Vec<Point>], used: &[bool]) -> Vec<(usize, End)> {
        let (cx, cy) = self.key(p);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(entries) = self.cells.get(&(cx.saturating_add(dx), cy.saturating_add(dy)))
                else {
                    continue;
                };
                for &(piece, end) in entries {
                    if used[piece] {
                        continue;
                    }
                    let q = endpoint(&pieces[piece], end);
                    if q.approx_eq(&p, self.tolerance) {
                        found.push((piece, end));
                    }
                }
            }
        }
        found
    }
}

fn endpoint(piece: &[Point], end: End) -> Point {
    match end {
        End::Start => piece[0],
        End::End => piece[piece.len() - 1],
    }
}

fn far_endpoint(piece: &[Point], touching: End) -> Point {
    match touching {
        End::Start => endpoint(piece, End::End),
        End::End => endpoint(piece, End::Start),
    }
}

/// Picks the extension with the lexicographically smallest far endpoint,
/// then the lowest piece index.
fn pick(candidates: Vec<(usize, End)>, pieces: &[Vec<Point>]) -> Option<(usize, End)> {
    candidates.into_iter().min_by(|a, b| {
        far_endpoint(&pieces[a.0], a.1)
            .lex_cmp(&far_endpoint(&pieces[b.0], b.1))
            .then(a.0.cmp(&b.0))
            .then_with(|| (a.1 == End::End).cmp(&(b.1 == End::End)))
    })
}

fn chain_pieces(pieces: Vec<Vec<Point>>, tolerance: f64) -> Vec<Polyline> {
    let index = EndpointIndex::build(&pieces, tolerance);
    let mut used = vec![false; pieces.len()];
    let mut polylines = Vec::new();

    for seed in 0..pieces.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut chain: VecDeque<Point> = pieces[seed].iter().copied().collect();

        // grow from the tail
        while let Some(tail) = chain.back().copied() {
            let Some((next, touching)) = pick(index.candidates(tail, &pieces, &used), &pieces)
            else {
                break;
            };
            used[next] = true;
            let piece = &pieces[next];
            match touching {
                End::Start => chain.extend(piece.iter().skip(1).copied()),
                End::End => chain.extend(piece.iter().rev().skip(1).copied()),
            }
        }

        // then from the head
        while let Some(head) = chain.front().copied() {
            let Some((next, touching)) = pick(index.candidates(head, &pieces, &used), &pieces)
            else {
                break;
            };
            used[next] = true;
            let piece = &pieces[next];
            match touching {
                End::End => {
                    for p in piece.iter().rev().skip(1) {
                        chain.push_front(*p);
                    }
                }
                End::Start => {
                    for p in piece.iter().skip(1) {
                        chain.push_front(*p);
                    }
                }
            }
        }

        if let Some(polyline) = Polyline::from_points(chain, tolerance) {
            polylines.push(polyline);
        }
    }

    polylines
}

/// Merges a layer's segments into polylines.
///
/// Zero-length segments are dropped with a warning.
pub fn merge_segments(segments: &[Segment], tolerance: f64) -> Vec<Polyline> {
    let mut dropped = 0usize;
    let pieces: Vec<Vec<Point>> = segments
        .iter()
        .filter(|s| {
            let degenerate = s.is_degenerate(tolerance);
            if degenerate {
                dropped += 1;
            }
            !degenerate
        })
        .map(|s| vec![s.start, s.end])
        .collect();

    if dropped > 0 {
        tracing::warn!(
            "Dropped {} degenerate segment(s) with endpoints within {} mm",
            dropped,
            tolerance
        );
    }

    chain_pieces(pieces, tolerance)
}

/// Merges polylines whose endpoints touch.
///
/// A set in which no two endpoints are within tolerance comes back unchanged.
pub fn merge_polylines(polylines: &[Polyline], tolerance: f64) -> Vec<Polyline> {
    let pieces = polylines.iter().map(|pl| pl.points().to_vec()).collect();
    chain_pieces(pieces, tolerance)
}

/// Merges one tagged layer of raw segments.
pub fn merge_layer(layer: &LayerSegments, tolerance: f64) -> Layer {
    let polylines = merge_segments(&layer.segments, tolerance);
    tracing::debug!(
        "Layer '{}': merged {} segments into {} polylines",
        layer.name,
        layer.segments.len(),
        polylines.len()
    );
    Layer::new(layer.name.clone(), polylines)
}

/// Merges every layer of a geometry source into a [`Drawing`].
///
/// The page rectangle, when the source has one, becomes the drawing's frame.
pub fn merge_source(source: &SourceGeometry, tolerance: f64) -> Drawing {
    let layers = source
        .layers
        .iter()
        .map(|l| merge_layer(l, tolerance))
        .collect();
    let drawing = Drawing::new(layers);
    match page_frame(source.width, source.height) {
        Some(frame) => drawing.with_frame(frame),
        None => drawing,
    }
}

pub(crate) fn page_frame(width: f64, height: f64) -> Option<BoundingBox> {
    (width > 0.0 && height > 0.0).then(|| BoundingBox::from_size(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use penplot_core::DEFAULT_TOLERANCE;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_reversed_segment_is_flipped_into_chain() {
        let merged = merge_segments(
            &[seg(0.0, 0.0, 1.0, 0.0), seg(2.0, 0.0, 1.0, 0.0)],
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
    fn test_head_extension() {
        // seed is the middle segment; the first one must be prepended
        let merged = merge_segments(
            &[seg(1.0, 0.0, 2.0, 0.0), seg(0.0, 0.0, 1.0, 0.0)],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start(), Point::new(0.0, 0.0));
        assert_eq!(merged[0].end(), Point::new(2.0, 0.0));
    }

    #[test]
    fn test_branch_tie_break_is_lexicographic() {
        // two candidates leave (1,0): to (1,5) and to (1,-5)
        let merged = merge_segments(
            &[
                seg(0.0, 0.0, 1.0, 0.0),
                seg(1.0, 0.0, 1.0, 5.0),
                seg(1.0, 0.0, 1.0, -5.0),
            ],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].end(), Point::new(1.0, -5.0));
        assert_eq!(merged[1].points().len(), 2);
    }

    #[test]
    fn test_degenerate_segments_dropped() {
        let merged = merge_segments(
            &[seg(3.0, 3.0, 3.0, 3.0), seg(0.0, 0.0, 1.0, 1.0)],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(merged.len(), 1);
        assert!(merge_segments(&[seg(1.0, 1.0, 1.0, 1.0)], DEFAULT_TOLERANCE).is_empty());
    }

    #[test]
    fn test_endpoints_within_tolerance_join() {
        let merged = merge_segments(
            &[seg(0.0, 0.0, 1.0, 0.0), seg(1.0 + 5e-7, 0.0, 2.0, 0.0)],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(merged.len(), 1);

        let merged = merge_segments(
            &[seg(0.0, 0.0, 1.0, 0.0), seg(1.0 + 1e-3, 0.0, 2.0, 0.0)],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_closed_square() {
        let merged = merge_segments(
            &[
                seg(0.0, 0.0, 1.0, 0.0),
                seg(1.0, 0.0, 1.0, 1.0),
                seg(1.0, 1.0, 0.0, 1.0),
                seg(0.0, 1.0, 0.0, 0.0),
            ],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 5);
        assert!(merged[0].is_closed(DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_merge_source_keeps_page_frame() {
        let mut source = SourceGeometry::new(210.0, 297.0);
        source.push_segment("red", seg(0.0, 0.0, 1.0, 0.0));
        source.push_segment("blue", seg(5.0, 5.0, 6.0, 5.0));
        let drawing = merge_source(&source, DEFAULT_TOLERANCE);
        assert_eq!(drawing.layers()[0].name, "red");
        assert_eq!(drawing.layers()[1].name, "blue");
        assert_eq!(drawing.frame(), Some(BoundingBox::from_size(210.0, 297.0)));
    }
}
